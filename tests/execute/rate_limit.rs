use crate::common;
use httpmock::Method::GET;
use sdwan_rs::SdwanError;
use std::time::{Duration, Instant};

#[tokio::test]
async fn rate_limit_waits_retry_after_and_counts_against_budget() {
    let server = common::setup_server();

    let limited = server.mock(|when, then| {
        when.method(GET).path("/dataservice/device");
        then.status(429)
            .header("Retry-After", "1")
            .body(r#"{"error":{"message":"slow down"}}"#);
    });

    // Backoff bounds are milliseconds; only Retry-After can explain a one second wait.
    let client = common::preauth_client(&server, 1);

    let start = Instant::now();
    let err = client.get("/device").await.unwrap_err();
    let elapsed = start.elapsed();

    limited.assert_hits(2);
    assert!(elapsed >= Duration::from_secs(1), "waited only {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "waited {elapsed:?}");

    match err {
        SdwanError::RateLimited {
            retry_after,
            response,
            ..
        } => {
            assert_eq!(retry_after, Duration::from_secs(1));
            assert_eq!(response.get_str("error.message"), Some("slow down"));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_without_budget_returns_immediately() {
    let server = common::setup_server();

    let limited = server.mock(|when, then| {
        when.method(GET).path("/dataservice/device");
        then.status(429);
    });

    let client = common::preauth_client(&server, 0);

    let start = Instant::now();
    let err = client.get("/device").await.unwrap_err();

    limited.assert_hits(1);
    // no Retry-After would mean a 15s wait; with no retries left there is none
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(err.status(), Some(429));
    assert!(matches!(
        err,
        SdwanError::RateLimited { retry_after, .. } if retry_after == Duration::from_secs(15)
    ));
}
