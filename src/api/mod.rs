mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use log::info;
use tower_http::trace::TraceLayer;

use crate::core::BenchError;
use crate::service::BenchService;

pub use error::ApiError;

pub struct BenchApi {
    service: Arc<BenchService>,
}

impl BenchApi {
    pub fn new(service: BenchService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/test", post(handlers::run_test))
            .route("/api/test/all", post(handlers::run_all))
            .route("/api/test/all/stream", get(handlers::stream_all))
            .route("/api/test/repeat", post(handlers::run_repeated))
            .route("/api/test/repeat/stream", get(handlers::stream_repeated))
            .route("/api/connections/close", post(handlers::close_connections))
            .layer(TraceLayer::new_for_http())
            .with_state(self.service.clone())
    }

    pub async fn serve(self, addr: &str) -> Result<(), BenchError> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| BenchError::IoError(format!("binding to {addr}: {e}")))?;
        info!("listening on {}", addr);
        axum::serve(listener, self.router())
            .await
            .map_err(|e| BenchError::IoError(format!("serving: {e}")))?;
        Ok(())
    }
}
