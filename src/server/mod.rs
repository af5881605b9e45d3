//! HTTP surface: an axum router over the payload builders in [`api`].
//!
//! Handlers stay thin. Each one calls a payload builder, maps its error to a
//! status code, and wraps the rendered body. Scoring and combo sweeps run on
//! the blocking pool so they never stall the async workers.

use std::io;

use axum::extract::Query;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tower_http::services::ServeDir;

pub mod api;
pub mod static_files;
pub mod stream;
pub mod sync;

use crate::data::import::{ImportError, DEFAULT_IMPORT_OUTPUT_PATH};

/// Bind and serve until the process is terminated.
pub fn run_server(bind_addr: &str) -> io::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        println!("cryodex server listening on http://{bind_addr}");
        axum::serve(listener, build_router()).await
    })
}

/// The full route table, console fallback included. Stateless: every request
/// reads the catalogs and snapshot from disk, so a sync ingress is visible to
/// the next request without any cache coordination.
pub fn build_router() -> Router {
    let console = ServeDir::new(static_files::CONSOLE_DIST_DIR)
        .not_found_service(static_files::console_page.into_service());

    Router::new()
        .route("/api/health", get(health))
        .route("/api/collections", get(collections))
        .route("/api/crew", get(crew))
        .route("/api/score", post(score))
        .route("/api/score/stream", get(stream::score_stream))
        .route("/api/optimize", post(optimize))
        .route("/api/tiers/merge", post(merge_tiers))
        .route("/api/data/version", get(data_version))
        .route("/api/sync/ingress", post(sync_ingress))
        .route("/api/sync/status", get(sync_status))
        .fallback_service(console)
}

async fn health() -> Response {
    json_result(api::health_payload())
}

async fn collections() -> Response {
    json_result(api::collections_payload())
}

#[derive(Debug, Default, Deserialize)]
struct CrewQuery {
    #[serde(default)]
    owned_only: Option<String>,
}

async fn crew(Query(query): Query<CrewQuery>) -> Response {
    let owned_only = api::flag_is_set(query.owned_only.as_deref());
    json_result(api::crew_payload(owned_only))
}

async fn score(body: String) -> Response {
    run_payload(move || api::score_payload(&body)).await
}

async fn optimize(body: String) -> Response {
    run_payload(move || api::optimize_payload(&body)).await
}

async fn merge_tiers(body: String) -> Response {
    match api::merge_tiers_payload(&body) {
        Ok(payload) => json_response(StatusCode::OK, payload),
        Err(err) => payload_error_response(err),
    }
}

async fn data_version() -> Response {
    json_result(api::data_version_payload())
}

async fn sync_ingress(headers: HeaderMap, body: String) -> Response {
    let token = headers
        .get(sync::SYNC_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let result = tokio::task::spawn_blocking(move || {
        sync::ingress_payload(&body, token.as_deref(), DEFAULT_IMPORT_OUTPUT_PATH)
    })
    .await;
    match result {
        Ok(Ok(payload)) => json_response(StatusCode::OK, payload),
        Ok(Err(sync::SyncError::Unauthorized)) => error_response(
            StatusCode::UNAUTHORIZED,
            "missing or invalid cryodex-sync-token",
        ),
        Ok(Err(sync::SyncError::Import(ImportError::Parse(err)))) => error_response(
            StatusCode::BAD_REQUEST,
            &format!("invalid sync body: {err}"),
        ),
        Ok(Err(err)) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
        Err(join) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("ingress task failed: {join}"),
        ),
    }
}

async fn sync_status() -> Response {
    json_result(sync::sync_status_payload())
}

/// Run a payload builder on the blocking pool and map the outcome.
async fn run_payload<F>(build: F) -> Response
where
    F: FnOnce() -> Result<String, api::PayloadError> + Send + 'static,
{
    match tokio::task::spawn_blocking(build).await {
        Ok(Ok(payload)) => json_response(StatusCode::OK, payload),
        Ok(Err(err)) => payload_error_response(err),
        Err(join) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("engine task failed: {join}"),
        ),
    }
}

fn payload_error_response(err: api::PayloadError) -> Response {
    match err {
        api::PayloadError::Parse(err) => error_response(
            StatusCode::BAD_REQUEST,
            &format!("invalid request body: {err}"),
        ),
        api::PayloadError::Validation(validation) => {
            let fallback = "{\n  \"error\": \"validation failed\"\n}".to_string();
            json_response(
                StatusCode::BAD_REQUEST,
                serde_json::to_string_pretty(&validation).unwrap_or(fallback),
            )
        }
    }
}

fn json_result<E: std::fmt::Display>(result: Result<String, E>) -> Response {
    match result {
        Ok(payload) => json_response(StatusCode::OK, payload),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

fn json_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({
        "status": "error",
        "message": message,
    });
    json_response(status, body.to_string())
}
