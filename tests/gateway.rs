//! End-to-end forwarding through a real listener and a mock target.

use std::sync::Arc;

use axum::http::StatusCode;
use endpoint_gateway::config::GatewayConfig;
use endpoint_gateway::forwarding::ProxyEvent;
use endpoint_gateway::http::FALLBACK_ERROR_BODY;

mod common;
use common::RecordingSink;

const TARGET_BODY: &[u8] = b"\x00binary\xffpayload from target\r\n";

#[tokio::test]
async fn endpoint_header_routes_and_relays_bytes() {
    let (target_addr, received) = common::start_mock_target(StatusCode::ACCEPTED, TARGET_BODY).await;
    let sink = Arc::new(RecordingSink::default());
    let (proxy_addr, shutdown) = common::start_gateway(GatewayConfig::default(), sink.clone()).await;

    let endpoint = format!("http://{target_addr}/services/data/v58.0/query?q=SELECT+Id");
    let res = common::client()
        .post(format!("http://{proxy_addr}/anything"))
        .header("SalesforceProxy-Endpoint", &endpoint)
        .body("request body")
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 202);
    assert_eq!(res.headers()["x-target-name"], "mock");
    let body = res.bytes().await.unwrap();
    assert_eq!(&body[..], TARGET_BODY);

    let received = received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "POST");
    assert_eq!(received[0].path_and_query, "/services/data/v58.0/query?q=SELECT+Id");
    assert_eq!(received[0].body, b"request body");
    assert_eq!(received[0].headers["host"], target_addr.to_string().as_str());
    assert!(received[0].headers.contains_key("x-request-id"));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        ProxyEvent::Response { status, headers } => {
            assert_eq!(*status, StatusCode::ACCEPTED);
            assert_eq!(headers["x-target-name"], "mock");
        }
        other => panic!("unexpected event {other:?}"),
    }

    shutdown.trigger();
}

#[tokio::test]
async fn missing_endpoint_goes_to_fallback_origin() {
    let (target_addr, received) = common::start_mock_target(StatusCode::OK, b"fallback").await;
    let mut config = GatewayConfig::default();
    config.routing.fallback_origin = format!("http://{target_addr}");

    let (proxy_addr, shutdown) =
        common::start_gateway(config, Arc::new(RecordingSink::default())).await;

    let res = common::client()
        .get(format!("http://{proxy_addr}/oauth/start?state=abc"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "fallback");
    let received = received.lock().unwrap().clone();
    assert_eq!(received[0].path_and_query, "/oauth/start?state=abc");

    shutdown.trigger();
}

#[tokio::test]
async fn credential_header_overrides_authorization() {
    let (target_addr, received) = common::start_mock_target(StatusCode::OK, b"ok").await;
    let (proxy_addr, shutdown) =
        common::start_gateway(GatewayConfig::default(), Arc::new(RecordingSink::default())).await;
    let endpoint = format!("http://{target_addr}/api");

    common::client()
        .get(format!("http://{proxy_addr}/"))
        .header("salesforceproxy-endpoint", &endpoint)
        .header("authorization", "Basic dXNlcjpwYXNz")
        .header("x-authorization", "Bearer TOK123")
        .send()
        .await
        .unwrap();

    common::client()
        .get(format!("http://{proxy_addr}/"))
        .header("salesforceproxy-endpoint", &endpoint)
        .header("authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();

    common::client()
        .get(format!("http://{proxy_addr}/"))
        .header("salesforceproxy-endpoint", &endpoint)
        .send()
        .await
        .unwrap();

    let received = received.lock().unwrap().clone();
    assert_eq!(received.len(), 3);
    assert_eq!(received[0].headers["authorization"], "Bearer TOK123");
    assert_eq!(received[1].headers["authorization"], "Basic dXNlcjpwYXNz");
    assert!(!received[2].headers.contains_key("authorization"));

    shutdown.trigger();
}

#[tokio::test]
async fn refused_target_returns_fixed_error() {
    let dead_addr = common::unused_addr().await;
    let sink = Arc::new(RecordingSink::default());
    let (proxy_addr, shutdown) = common::start_gateway(GatewayConfig::default(), sink.clone()).await;

    let res = common::client()
        .get(format!("http://{proxy_addr}/"))
        .header("salesforceproxy-endpoint", format!("http://{dead_addr}/x"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()["content-type"], "text/plain");
    let body = res.text().await.unwrap();
    assert_eq!(body, FALLBACK_ERROR_BODY);
    assert!(!body.contains(&dead_addr.to_string()));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), "error");

    shutdown.trigger();
}

#[tokio::test]
async fn redirects_are_relayed_not_followed() {
    let (target_addr, received) = common::start_mock_target(StatusCode::FOUND, b"").await;
    let (proxy_addr, shutdown) =
        common::start_gateway(GatewayConfig::default(), Arc::new(RecordingSink::default())).await;

    let res = common::client()
        .get(format!("http://{proxy_addr}/"))
        .header("salesforceproxy-endpoint", format!("http://{target_addr}/login"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(received.lock().unwrap().len(), 1);

    shutdown.trigger();
}
