use thiserror::Error;

use crate::core::Backend;

/// Message reported when read/update find nothing persisted to work on.
pub const EMPTY_DATASET_MESSAGE: &str = "No records found in database. Please run Write test first.";

#[derive(Debug, Error, PartialEq, Clone)]
pub enum BenchError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Connection error: {0}")]
    ConnectionError(String),
    #[error("{0} is not connected, connect it before running tests")]
    NotConnected(Backend),
    #[error("{}", EMPTY_DATASET_MESSAGE)]
    EmptyDataset,
    #[error("Query error: {0}")]
    QueryError(String),
    #[error("Unsupported database: {0}")]
    UnsupportedBackend(String),
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("Progress stream closed by consumer")]
    StreamClosed,
    #[error("Test runner failed: {0}")]
    TaskFailed(String),
}

impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        BenchError::IoError(err.to_string())
    }
}

impl From<mongodb::error::Error> for BenchError {
    fn from(err: mongodb::error::Error) -> Self {
        BenchError::QueryError(err.to_string())
    }
}

impl From<tokio_postgres::Error> for BenchError {
    fn from(err: tokio_postgres::Error) -> Self {
        BenchError::QueryError(err.to_string())
    }
}
