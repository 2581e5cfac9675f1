use crate::common;
use httpmock::Method::GET;
use sdwan_rs::SdwanError;

#[tokio::test]
async fn not_found_is_fatal_and_keeps_the_payload() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/dataservice/missing");
        then.status(404)
            .header("content-type", "application/json")
            .body(r#"{"error":{"message":"no such resource"}}"#);
    });

    let client = common::preauth_client(&server, 3);
    let err = client.get("/missing").await.unwrap_err();

    mock.assert_hits(1);

    match err {
        SdwanError::Status {
            status,
            url,
            response,
        } => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/dataservice/missing"));
            assert_eq!(
                response.get_str("error.message"),
                Some("no such resource")
            );
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn embedded_error_code_is_an_api_error() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/dataservice/device");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"error":{"code":"E1"}}"#);
    });

    let client = common::preauth_client(&server, 3);
    let err = client.get("/device").await.unwrap_err();

    mock.assert_hits(1);

    match err {
        SdwanError::Api { code, response } => {
            assert_eq!(code, "E1");
            assert_eq!(response.raw(), r#"{"error":{"code":"E1"}}"#);
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_error_object_is_success() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/dataservice/device");
        then.status(200).body(r#"{"error":{}}"#);
    });

    let client = common::preauth_client(&server, 3);
    let res = client.get("/device").await.unwrap();

    mock.assert_hits(1);
    assert_eq!(res.raw(), r#"{"error":{}}"#);
}

#[tokio::test]
async fn numeric_error_code_is_not_an_api_error() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/dataservice/device");
        then.status(200).body(r#"{"error":{"code":42}}"#);
    });

    let client = common::preauth_client(&server, 3);
    let res = client.get("/device").await.unwrap();

    mock.assert_hits(1);
    assert_eq!(res.get("error.code").and_then(|c| c.as_u64()), Some(42));
}

#[tokio::test]
async fn no_content_is_success_with_empty_payload() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::DELETE)
            .path("/dataservice/template/feature/42");
        then.status(204);
    });

    let client = common::preauth_client(&server, 3);
    let res = client.delete("/template/feature/42").await.unwrap();

    mock.assert();
    assert!(res.is_empty());
    assert!(res.json().is_null());
}

#[tokio::test]
async fn repeated_get_is_idempotent() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(GET).path("/dataservice/system/device/vedges");
        then.status(200)
            .body(r#"{"data":[{"uuid":"a"},{"uuid":"b"}],"header":{"generatedOn":1}}"#);
    });

    let client = common::preauth_client(&server, 3);
    let first = client.get("/system/device/vedges").await.unwrap();
    let second = client.get("/system/device/vedges").await.unwrap();

    mock.assert_hits(2);
    assert_eq!(first, second);
    assert_eq!(first.get_str("data.1.uuid"), Some("b"));
}
