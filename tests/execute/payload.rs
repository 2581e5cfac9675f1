use crate::common;
use httpmock::Method::{DELETE, POST, PUT};
use sdwan_rs::{Body, Method, SdwanError};

#[tokio::test]
async fn body_is_identical_on_every_attempt() {
    let server = common::setup_server();

    let body = Body::new()
        .set("templateName", "branch")
        .set("policyDefinition.assembly", Vec::<String>::new())
        .into_string();

    // Only an exact body match reaches this mock; anything else would get a 404 and stop the loop.
    let fail_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/dataservice/template/policy/vedge")
            .header("X-XSRF-TOKEN", common::TOKEN)
            .body(body.clone());
        then.status(502).body("Bad Gateway");
    });

    let max_retries = 2;
    let client = common::preauth_client(&server, max_retries);
    let err = client
        .post("/template/policy/vedge", body.clone())
        .await
        .unwrap_err();

    fail_mock.assert_hits((1 + max_retries) as usize);
    assert!(matches!(err, SdwanError::Server { status: 502, .. }));
}

#[tokio::test]
async fn json_content_type_is_set_for_bodies() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/dataservice/template/feature/7")
            .header("content-type", "application/json")
            .body(r#"{"name":"x"}"#);
        then.status(200).body(r#"{"id":"7"}"#);
    });

    let client = common::preauth_client(&server, 0);
    let res = client
        .put("/template/feature/7", r#"{"name":"x"}"#)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(res.get_str("id"), Some("7"));
}

#[tokio::test]
async fn delete_with_body() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(DELETE)
            .path("/dataservice/certificate/vedge")
            .body(r#"{"chasisNumber":"abc"}"#);
        then.status(200).body("{}");
    });

    let client = common::preauth_client(&server, 0);
    client
        .delete_body("/certificate/vedge", r#"{"chasisNumber":"abc"}"#)
        .await
        .unwrap();

    mock.assert();
}

#[tokio::test]
async fn hand_built_request_outside_dataservice() {
    let server = common::setup_server();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/custom/endpoint")
            .header("X-Custom", "1")
            .header("content-type", "text/plain")
            .body("secret-payload");
        then.status(200).body("{}");
    });

    let client = common::preauth_client(&server, 0);
    let req = client
        .new_req(Method::POST, "/custom/endpoint")
        .body("secret-payload")
        .header("X-Custom", "1")
        .header("Content-Type", "text/plain")
        .no_log_payload();
    client.execute(req).await.unwrap();

    mock.assert();
}
