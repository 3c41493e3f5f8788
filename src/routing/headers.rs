//! Header overrides and hop-by-hop stripping.
//!
//! # Design Decisions
//! - Names are `HeaderName`, so comparisons are case-insensitive
//! - Setting a name twice keeps its first position and the last value
//! - Applying an override replaces every inbound value of that name

use std::sync::LazyLock;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

/// Connection-scoped headers that never cross the gateway.
static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    vec![
        header::CONNECTION,
        HeaderName::from_static("keep-alive"),
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
    ]
});

/// Ordered, case-insensitive set of headers to force onto an outbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOverrides {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any earlier override of the same name.
    pub fn set(&mut self, name: HeaderName, value: HeaderValue) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Write every override into `headers`, dropping existing values of the
    /// same name.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.entries {
            headers.insert(name.clone(), value.clone());
        }
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in HOP_BY_HOP.iter().chain(listed.iter()) {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_case_insensitively() {
        let mut overrides = HeaderOverrides::new();
        overrides.set(
            HeaderName::from_bytes(b"Authorization").unwrap(),
            HeaderValue::from_static("first"),
        );
        overrides.set(header::AUTHORIZATION, HeaderValue::from_static("second"));

        assert_eq!(overrides.len(), 1);
        assert_eq!(
            overrides.get(&header::AUTHORIZATION),
            Some(&HeaderValue::from_static("second"))
        );
    }

    #[test]
    fn apply_replaces_all_inbound_values() {
        let mut headers = HeaderMap::new();
        headers.append(header::AUTHORIZATION, HeaderValue::from_static("Basic a"));
        headers.append(header::AUTHORIZATION, HeaderValue::from_static("Basic b"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        let mut overrides = HeaderOverrides::new();
        overrides.set(header::AUTHORIZATION, HeaderValue::from_static(""));
        overrides.apply_to(&mut headers);

        let values: Vec<_> = headers.get_all(header::AUTHORIZATION).iter().collect();
        assert_eq!(values, vec![&HeaderValue::from_static("")]);
        assert_eq!(headers[header::ACCEPT], "*/*");
    }

    #[test]
    fn strips_connection_listed_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-trace", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::CONTENT_TYPE));
    }
}
