//! HTTP server mode for triggering extraction runs

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::cli::runner::{build_extractor, open_warehouse};
use crate::config::{DataType, ExtractorConfig};
use crate::engine::Extractor;
use crate::error::{Error, ErrorKind, Result};
use crate::http::CallBudget;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Extraction settings shared by every request
    pub extractor: Arc<ExtractorConfig>,
}

impl ServerConfig {
    /// Create a server config
    pub fn new(extractor: Arc<ExtractorConfig>) -> Self {
        Self { extractor }
    }
}

/// App state shared across handlers
struct AppState {
    extractor: Extractor,
    /// Held for the duration of a run; runs are serialized
    runs: Mutex<()>,
}

/// Request body for `POST /run`
#[derive(Debug, Deserialize)]
struct RunRequest {
    #[serde(default)]
    data_type: Option<String>,
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }
}

impl ApiResponse<()> {
    fn error(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
            kind: Some(kind),
        }
    }
}

/// HTTP status a failed run is reported with
fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidDataType => StatusCode::BAD_REQUEST,
        ErrorKind::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Fetch => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &Error) -> Response {
    let kind = err.kind();
    (status_for(kind), Json(ApiResponse::error(kind, err.to_string()))).into_response()
}

/// Build the router over an extractor
pub fn app(extractor: Extractor) -> Router {
    let state = AppState {
        extractor,
        runs: Mutex::new(()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/run", post(run_extraction))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server; stops accepting requests once `cancel` fires
pub async fn serve(config: ServerConfig, port: u16, cancel: CancellationToken) -> Result<()> {
    let warehouse = open_warehouse(&config.extractor)?;
    // One budget for the lifetime of the process, across all requests
    let budget = CallBudget::new(config.extractor.api_call_limit);
    let extractor = build_extractor(config.extractor.clone(), warehouse, budget)?
        .with_cancellation(cancel.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app(extractor))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Run one extraction for the requested data type
async fn run_extraction(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RunRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    ErrorKind::InvalidDataType,
                    rejection.body_text(),
                )),
            )
                .into_response();
        }
    };
    let name = req.data_type.unwrap_or_default();
    let data_type: DataType = match name.parse() {
        Ok(dt) => dt,
        Err(e) => return error_response(&e),
    };

    let _running = state.runs.lock().await;
    match state.extractor.run(data_type).await {
        Ok(summary) => (StatusCode::OK, Json(ApiResponse::success(summary))).into_response(),
        Err(e) => {
            error!(
                data_type = %data_type,
                kind = %e.kind(),
                upstream_status = ?e.upstream_status(),
                error = %e,
                "Extraction failed"
            );
            error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::DuckDbWarehouse;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use test_case::test_case;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_app(base_url: &str, limit: u64) -> Router {
        let mut config = ExtractorConfig::new("test-key");
        config.base_url = base_url.to_string();
        let extractor = build_extractor(
            Arc::new(config),
            Arc::new(DuckDbWarehouse::in_memory().unwrap()),
            CallBudget::new(limit),
        )
        .unwrap();
        app(extractor)
    }

    async fn post_run(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::post("/run")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test_case(ErrorKind::InvalidDataType, StatusCode::BAD_REQUEST ; "invalid data type")]
    #[test_case(ErrorKind::QuotaExceeded, StatusCode::TOO_MANY_REQUESTS ; "quota")]
    #[test_case(ErrorKind::Fetch, StatusCode::BAD_GATEWAY ; "fetch")]
    #[test_case(ErrorKind::Sink, StatusCode::INTERNAL_SERVER_ERROR ; "sink")]
    #[test_case(ErrorKind::Config, StatusCode::INTERNAL_SERVER_ERROR ; "config")]
    fn test_status_for(kind: ErrorKind, expected: StatusCode) {
        assert_eq!(status_for(kind), expected);
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app("http://localhost", 1)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_run_rejects_unknown_data_type_without_fetching() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (status, body) =
            post_run(test_app(&server.uri(), 10), r#"{"data_type": "loans"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "invalid_data_type");
    }

    #[test_case("not json" ; "malformed body")]
    #[test_case(r#"{"data_type": 7}"# ; "wrong field type")]
    #[tokio::test]
    async fn test_run_unreadable_body_uses_envelope(body: &str) {
        let (status, body) = post_run(test_app("http://localhost", 10), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "invalid_data_type");
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_run_missing_data_type_is_bad_request() {
        let (status, _) = post_run(test_app("http://localhost", 10), "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_run_returns_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/schedules/schedule_b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"sub_id": "1", "disbursement_date": "2024-03-01"}],
                "pagination": {"count": 1, "pages": 1, "last_indexes": null}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = post_run(
            test_app(&server.uri(), 10),
            r#"{"data_type": "disbursements"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["data_type"], "disbursements");
        assert_eq!(body["data"]["calls_issued"], 1);
        assert_eq!(body["data"]["rows_loaded"], 1);
    }

    #[tokio::test]
    async fn test_run_upstream_failure_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (status, body) =
            post_run(test_app(&server.uri(), 10), r#"{"data_type": "receipts"}"#).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "fetch");
    }

    #[tokio::test]
    async fn test_run_quota_exhausted_is_too_many_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"sub_id": "1"}],
                "pagination": {"last_indexes": {"last_index": "1", "last_contribution_receipt_date": null}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = test_app(&server.uri(), 1);
        let (status, body) = post_run(app.clone(), r#"{"data_type": "receipts"}"#).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["kind"], "quota_exceeded");
        assert!(body["error"].as_str().unwrap().contains("restart"));

        // The budget is per process; a later request is refused too
        let (status, body) = post_run(app, r#"{"data_type": "disbursements"}"#).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(body["error"].as_str().unwrap().contains("restart"));
    }
}
