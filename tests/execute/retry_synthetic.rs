use crate::common;
use httpmock::Method::GET;
use sdwan_rs::SdwanError;

#[tokio::test]
async fn persistent_5xx_is_retried_until_budget_is_spent() {
    let server = common::setup_server();

    // This single mock will persistently fail, allowing us to count the retries.
    let fail_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/dataservice/device")
            .header("X-XSRF-TOKEN", common::TOKEN);
        then.status(503).body("Service Unavailable");
    });

    let max_retries = 3;
    let client = common::preauth_client(&server, max_retries);

    let result = client.get("/device").await;

    // 1 (initial) + 3 (retries)
    fail_mock.assert_hits((1 + max_retries) as usize);

    match result {
        Err(SdwanError::Server {
            status, response, ..
        }) => {
            assert_eq!(status, 503);
            assert_eq!(response.raw(), "Service Unavailable");
        }
        other => panic!("expected a Server error after all retries failed, got {other:?}"),
    }
}

#[tokio::test]
async fn request_timeout_408_is_retried() {
    let server = common::setup_server();

    let fail_mock = server.mock(|when, then| {
        when.method(GET).path("/dataservice/device");
        then.status(408);
    });

    let client = common::preauth_client(&server, 2);
    let err = client.get("/device").await.unwrap_err();

    fail_mock.assert_hits(3);
    assert_eq!(err.status(), Some(408));
    assert!(matches!(err, SdwanError::Server { .. }));
}

#[tokio::test]
async fn zero_retries_sends_once() {
    let server = common::setup_server();

    let fail_mock = server.mock(|when, then| {
        when.method(GET).path("/dataservice/device");
        then.status(500).body(r#"{"error":{"message":"internal"}}"#);
    });

    let client = common::preauth_client(&server, 0);
    let err = client.get("/device").await.unwrap_err();

    fail_mock.assert_hits(1);
    let response = err.response().expect("payload attached");
    assert_eq!(response.get_str("error.message"), Some("internal"));
}

#[tokio::test]
async fn per_attempt_timeout_is_retried_then_reported() {
    let server = common::setup_server();

    let slow = server.mock(|when, then| {
        when.method(GET).path("/dataservice/device");
        then.status(200)
            .body("{}")
            .delay(std::time::Duration::from_millis(500));
    });

    let client = common::fast_builder(&server.base_url())
        .timeout(std::time::Duration::from_millis(100))
        .max_retries(1)
        ._preauth(common::TOKEN)
        .build()
        .unwrap();

    let err = client.get("/device").await.unwrap_err();

    slow.assert_hits(2);
    assert!(matches!(err, SdwanError::Timeout { .. }), "got {err:?}");
    assert!(err.response().is_none());
}

#[tokio::test]
async fn unauthorized_does_not_clear_the_token() {
    let server = common::setup_server();

    let api = server.mock(|when, then| {
        when.method(GET).path("/dataservice/device");
        then.status(401).body("expired");
    });

    let client = common::preauth_client(&server, 3);
    let err = client.get("/device").await.unwrap_err();

    api.assert_hits(1);
    assert_eq!(err.status(), Some(401));
    assert_eq!(client.current_token().await.as_deref(), Some(common::TOKEN));
}
