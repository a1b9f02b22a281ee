//! Forwarding against live mock upstreams.

use axum::http::{header, StatusCode};
use std::time::Duration;

use service_proxy::error::UpstreamFailure;
use service_proxy::load_balancer::host::Host;
use service_proxy::proxy::Forwarder;
use service_proxy::ProxyError;

mod common;
use common::{closed_port, config_for, identity, start_mock_backend, start_programmable_backend, Reply};

#[tokio::test]
async fn test_second_forward_is_served_from_cache() {
    let backend = start_mock_backend(Reply::ok(identity("svc", 9001))).await;
    let forwarder = Forwarder::new(&config_for("svc", &[9001]));
    let host = backend.host("svc");

    let first = forwarder.forward(&host).await.unwrap();
    let second = forwarder.forward(&host).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, identity("svc", 9001));
    assert_eq!(first.headers[header::CONTENT_TYPE], "application/json; charset=utf-8");
    assert_eq!(first.headers[header::CACHE_CONTROL], "max-age=60");
    assert_eq!(backend.hits(), 1, "second call must not reach the upstream");
}

#[tokio::test]
async fn test_cache_disabled_always_calls_upstream() {
    let backend = start_mock_backend(Reply::ok(identity("svc", 9001))).await;
    let mut config = config_for("svc", &[9001]);
    config.cache.enabled = false;
    let forwarder = Forwarder::new(&config);
    let host = backend.host("svc");

    forwarder.forward(&host).await.unwrap();
    forwarder.forward(&host).await.unwrap();
    assert_eq!(backend.hits(), 2);
}

#[tokio::test]
async fn test_gateway_timeouts_exhaust_attempts() {
    let backend = start_mock_backend(Reply::status(504)).await;
    let forwarder = Forwarder::new(&config_for("svc", &[9001]));
    let host = backend.host("svc");

    let response = forwarder.forward(&host).await.unwrap();
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body.is_empty());
    assert_eq!(backend.hits(), 3);

    // Degraded answers are not cached.
    forwarder.forward(&host).await.unwrap();
    assert_eq!(backend.hits(), 6);
}

#[tokio::test]
async fn test_recovers_after_unavailable() {
    let body = identity("svc", 9001);
    let backend = start_programmable_backend(move |n| {
        if n == 0 {
            Reply::status(503)
        } else {
            Reply::ok(body.clone())
        }
    })
    .await;
    let forwarder = Forwarder::new(&config_for("svc", &[9001]));

    let response = forwarder.forward(&backend.host("svc")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.hits(), 2);
}

#[tokio::test]
async fn test_non_transient_status_is_passed_as_success() {
    let backend = start_mock_backend(Reply {
        status: 404,
        body: b"{}".to_vec(),
        delay: Duration::ZERO,
    })
    .await;
    let forwarder = Forwarder::new(&config_for("svc", &[9001]));

    let response = forwarder.forward(&backend.host("svc")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "{}");
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    let addr = closed_port().await;
    let forwarder = Forwarder::new(&config_for("svc", &[9001]));
    let host = Host::new("svc", "127.0.0.1", addr.port());

    match forwarder.forward(&host).await {
        Err(ProxyError::UpstreamUnreachable { host: failed, source }) => {
            assert_eq!(failed, host);
            assert!(matches!(source, UpstreamFailure::Transport(_)));
        }
        other => panic!("expected UpstreamUnreachable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let backend =
        start_mock_backend(Reply::ok("{}").delayed(Duration::from_millis(500))).await;
    let mut config = config_for("svc", &[9001]);
    config.timeouts.read_ms = 50;
    let forwarder = Forwarder::new(&config);

    match forwarder.forward(&backend.host("svc")).await {
        Err(ProxyError::UpstreamUnreachable { source, .. }) => {
            assert!(matches!(source, UpstreamFailure::Timeout { stage: "response", .. }));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_overall_deadline_bounds_retries() {
    let backend =
        start_mock_backend(Reply::status(503).delayed(Duration::from_millis(80))).await;
    let mut config = config_for("svc", &[9001]);
    config.retries.deadline_ms = 120;
    let forwarder = Forwarder::new(&config);

    match forwarder.forward(&backend.host("svc")).await {
        Err(ProxyError::UpstreamUnreachable { source, .. }) => {
            assert!(matches!(source, UpstreamFailure::Timeout { stage: "forward", .. }));
        }
        other => panic!("expected deadline failure, got {other:?}"),
    }
    assert!(backend.hits() < 3);
}

#[tokio::test]
async fn test_latin1_payload_is_reencoded() {
    let backend = start_mock_backend(Reply::ok(&b"{\"owner\":\"Jos\xe9\"}"[..])).await;
    let forwarder = Forwarder::new(&config_for("svc", &[9001]));

    let response = forwarder.forward(&backend.host("svc")).await.unwrap();
    assert_eq!(std::str::from_utf8(&response.body).unwrap(), "{\"owner\":\"José\"}");
    assert_eq!(response.headers[header::CONTENT_LENGTH], "17");
}
