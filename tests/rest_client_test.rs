use httpmock::prelude::*;
use serde_json::json;
use sos_utils::{
    ApiTransport, ClientContext, ErrorCode, HttpMethod, RestClient, ServiceRequest, SosError,
    TokenSource,
};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn client_for(server: &MockServer, token: TokenSource) -> RestClient {
    let context = ClientContext::new(server.host(), server.port(), token).with_scheme("http");
    RestClient::new(context).unwrap()
}

fn static_token() -> TokenSource {
    TokenSource::Static("tok-123".to_string())
}

#[tokio::test]
async fn test_get_sends_auth_headers_and_returns_body() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/block/volumes")
            .header("x-sds-auth-token", "tok-123")
            .header("x-emc-rest-client", "TRUE")
            .header("content-type", "application/json");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"volume": [{"name": "vol1"}]}));
    });

    let client = client_for(&server, static_token());
    let response = client
        .service_json_request(ServiceRequest::get("/block/volumes"))
        .await
        .unwrap();

    api_mock.assert();
    assert_eq!(response.status, 200);
    assert!(response.body.contains("vol1"));
    assert_eq!(
        response.headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_token_read_through_session_pointer() {
    let mut token_file = NamedTempFile::new().unwrap();
    writeln!(token_file, "file-token").unwrap();
    let mut pointer = NamedTempFile::new().unwrap();
    writeln!(pointer, "{}", token_file.path().display()).unwrap();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/tenant")
            .header("x-sds-auth-token", "file-token");
        then.status(200).body("{}");
    });

    let client = client_for(
        &server,
        TokenSource::SessionPointer(pointer.path().to_path_buf()),
    );
    client
        .service_json_request(ServiceRequest::get("/tenant"))
        .await
        .unwrap();

    api_mock.assert();
}

#[tokio::test]
async fn test_missing_session_pointer_fails_before_request() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/tenant");
        then.status(200);
    });

    let client = client_for(
        &server,
        TokenSource::SessionPointer(dir.path().join("cookie").join("999")),
    );
    let err = client
        .service_json_request(ServiceRequest::get("/tenant"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorCode::NotFound);
    assert!(err.to_string().contains("Please authenticate again"));
    api_mock.assert_hits(0);
}

#[tokio::test]
async fn test_post_sends_body_and_request_token() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/block/volumes")
            .query_param("requestToken", "pre-fetched")
            .body(r#"{"name":"vol1"}"#);
        then.status(202).body(r#"{"op_id": "task-1"}"#);
    });

    let client = client_for(&server, static_token());
    let response = client
        .service_json_request(
            ServiceRequest::post("/block/volumes", r#"{"name":"vol1"}"#)
                .with_request_token("pre-fetched"),
        )
        .await
        .unwrap();

    api_mock.assert();
    assert_eq!(response.status, 202);
    assert!(response.body.contains("task-1"));
}

#[tokio::test]
async fn test_accept_xml_header() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/vdc")
            .header("accept", "application/xml, application/octet-stream");
        then.status(200).body("<vdc><name>v1</name></vdc>");
    });

    let client = client_for(&server, static_token());
    let response = client
        .service_json_request(ServiceRequest::get("/vdc").accept(sos_utils::domain::model::AcceptKind::Xml))
        .await
        .unwrap();

    api_mock.assert();
    assert!(response.body.starts_with("<vdc>"));
}

async fn failing_request(status: u16, method: HttpMethod, body: &str) -> SosError {
    let server = MockServer::start();
    let body = body.to_string();
    server.mock(|when, then| {
        when.path("/block/volumes/urn:1");
        then.status(status).body(body);
    });

    let client = client_for(&server, static_token());
    client
        .service_json_request(ServiceRequest::new(method, "/block/volumes/urn:1"))
        .await
        .unwrap_err()
}

#[tokio::test]
async fn test_404_message_for_every_method() {
    for method in [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
    ] {
        let err = failing_request(404, method, "").await;
        assert_eq!(err.code(), 3);
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            "HTTP code: 404, Response: Not Found [Requested resource not found]"
        );
    }
}

#[tokio::test]
async fn test_401_requires_authentication() {
    let err = failing_request(401, HttpMethod::Get, "").await;
    assert!(err
        .to_string()
        .contains("Access forbidden: Authentication required"));
}

#[tokio::test]
async fn test_405_names_method_and_uri() {
    let err = failing_request(405, HttpMethod::Delete, "").await;
    assert!(err
        .to_string()
        .contains("DELETE method is not supported by resource: /block/volumes/urn:1"));
}

#[tokio::test]
async fn test_other_status_echoes_body() {
    let err = failing_request(400, HttpMethod::Put, "Invalid volume size").await;
    assert_eq!(
        err.to_string(),
        "HTTP code: 400, Response: Bad Request [Invalid volume size]"
    );
}

#[tokio::test]
async fn test_created_is_not_success() {
    let err = failing_request(201, HttpMethod::Post, "created").await;
    assert_eq!(err.status(), Some(201));
}

#[tokio::test]
async fn test_download_streams_to_file() {
    let server = MockServer::start();
    let payload = "x".repeat(10_000);
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/logs/download");
        then.status(200)
            .header("Content-Type", "application/octet-stream")
            .body(payload.clone());
    });

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("logs.zip");

    let client = client_for(&server, static_token());
    let response = client
        .service_json_request(ServiceRequest::get("/logs/download").download_to(&target))
        .await
        .unwrap();

    api_mock.assert();
    assert!(response.body.is_empty());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), payload);
}

#[tokio::test]
async fn test_download_into_missing_directory_is_http_error() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/logs/download");
        then.status(200).body("payload");
    });

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("no-such-dir").join("out.bin");

    let client = client_for(&server, static_token());
    let err = client
        .service_json_request(ServiceRequest::get("/logs/download").download_to(&target))
        .await
        .unwrap_err();

    api_mock.assert();
    assert_eq!(err.code(), 3);
    assert!(err.to_string().starts_with("Reason: "));
    assert!(err.to_string().contains("out.bin"));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_connection_refused_is_http_error() {
    // 埠號 1 上不會有服務
    let context = ClientContext::new("127.0.0.1", 1, static_token()).with_scheme("http");
    let client = RestClient::new(context).unwrap();
    let err = client
        .service_json_request(ServiceRequest::get("/"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), 3);
}
