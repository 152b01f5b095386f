use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::core::BenchError;

pub struct ApiError(pub BenchError);

impl From<BenchError> for ApiError {
    fn from(err: BenchError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BenchError::UnsupportedBackend(_) | BenchError::UnsupportedOperation(_) => {
                StatusCode::BAD_REQUEST
            }
            BenchError::NotConnected(_) | BenchError::ConnectionError(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            BenchError::ConfigParsingError(_)
            | BenchError::IoError(_)
            | BenchError::EmptyDataset
            | BenchError::QueryError(_)
            | BenchError::StreamClosed
            | BenchError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}
