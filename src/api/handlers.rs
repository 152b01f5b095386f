use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use crate::bench::progress::StreamEvent;
use crate::core::{Backend, MatrixReport, RepeatTestResult, TestResult};
use crate::service::BenchService;

use super::error::ApiError;

const NDJSON_MIME: &str = "application/x-ndjson";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connected: Vec<Backend>,
}

pub async fn health(State(service): State<Arc<BenchService>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        connected: service.connected().await,
    })
}

#[derive(Debug, Deserialize)]
pub struct RunTestRequest {
    pub database: String,
    pub operation: String,
}

pub async fn run_test(
    State(service): State<Arc<BenchService>>,
    Json(req): Json<RunTestRequest>,
) -> Result<Json<TestResult>, ApiError> {
    let result = service.run_test(&req.database, &req.operation).await?;
    Ok(Json(result))
}

pub async fn run_all(
    State(service): State<Arc<BenchService>>,
) -> Result<Json<MatrixReport>, ApiError> {
    Ok(Json(service.run_all().await?))
}

pub async fn run_repeated(
    State(service): State<Arc<BenchService>>,
) -> Result<Json<Vec<RepeatTestResult>>, ApiError> {
    Ok(Json(service.run_repeated().await?))
}

pub async fn stream_all(State(service): State<Arc<BenchService>>) -> Response {
    ndjson(service.stream_all())
}

pub async fn stream_repeated(State(service): State<Arc<BenchService>>) -> Response {
    ndjson(service.stream_repeated())
}

pub async fn close_connections(State(service): State<Arc<BenchService>>) -> StatusCode {
    service.close_connections().await;
    StatusCode::NO_CONTENT
}

/// One JSON document per line, flushed as each event is produced.
fn ndjson(events: ReceiverStream<StreamEvent>) -> Response {
    let body = Body::from_stream(events.map(|event| event.to_line()));
    ([(header::CONTENT_TYPE, NDJSON_MIME)], body).into_response()
}
