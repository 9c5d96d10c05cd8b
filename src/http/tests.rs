//! Tests for the HTTP client module

use super::*;
use crate::cursor::QueryParams;
use crate::error::FetchFailure;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder().base_url(server.uri()).build();
    HttpClient::with_config(config).unwrap()
}

fn query(pairs: &[(&str, &str)]) -> QueryParams {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[tokio::test]
async fn test_get_json_sends_query_and_default_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/schedules/schedule_a"))
        .and(query_param("api_key", "k"))
        .and(query_param("per_page", "100"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 42})))
        .expect(1)
        .mount(&server)
        .await;

    // Trailing and leading slashes collapse to one
    let config = HttpClientConfig::builder()
        .base_url(format!("{}/v1/", server.uri()))
        .header("Accept", "application/json")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let data: Value = client
        .get_json(
            "/schedules/schedule_a",
            &query(&[("api_key", "k"), ("per_page", "100")]),
        )
        .await
        .unwrap();

    assert_eq!(data["value"], 42);
}

#[tokio::test]
async fn test_user_agent_names_the_crate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header(
            "user-agent",
            concat!("fec-extract/", env!("CARGO_PKG_VERSION")),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let _: Value = client_for(&server)
        .get_json("schedules/schedule_b", &QueryParams::new())
        .await
        .unwrap();
}

#[test]
fn test_invalid_default_header_is_config_error() {
    let config = HttpClientConfig::builder()
        .header("bad header", "x")
        .build();
    let err = HttpClient::with_config(config).unwrap_err();
    assert_eq!(err.kind().as_str(), "config");
}

#[tokio::test]
async fn test_non_success_status_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_json::<Value>("/flaky", &QueryParams::new())
        .await
        .unwrap_err();

    match err {
        FetchFailure::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "try later");
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn test_client_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_json::<Value>("/forbidden", &QueryParams::new())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchFailure::Status { status: 403, .. }));
}

#[tokio::test]
async fn test_undecodable_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_json::<Value>("/html", &QueryParams::new())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchFailure::Decode(_)));
}

#[tokio::test]
async fn test_request_timeout_is_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .timeout(Duration::from_millis(50))
        .build();
    let err = HttpClient::with_config(config)
        .unwrap()
        .get_json::<Value>("/slow", &QueryParams::new())
        .await
        .unwrap_err();

    match err {
        FetchFailure::Transport(e) => assert!(e.is_timeout()),
        other => panic!("unexpected failure: {other:?}"),
    }
}
