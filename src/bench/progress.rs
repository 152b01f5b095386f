//! Live progress events and their wire format.
//!
//! A run produces an ordered sequence of [`StreamEvent`]s: status updates
//! for every cell followed by exactly one terminal `complete` or `error`.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::core::{Backend, BenchError, Operation, RepeatTestResult, TestResult};

/// Events buffered between the producing runner and its consumer.
pub const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Starting,
    Running,
    Verifying,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub current_database: Backend,
    pub current_operation: Operation,
    pub status: Status,
    pub progress: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl ProgressEvent {
    pub fn new(backend: Backend, operation: Operation, status: Status, progress: u8) -> Self {
        let message = match status {
            Status::Starting => format!("Starting {} test on {}", operation.label(), backend.label()),
            Status::Running => format!("Running {} test on {}", operation.label(), backend.label()),
            Status::Verifying => format!("Verifying data integrity on {}", backend.label()),
            Status::Completed => format!("{} test on {} completed", operation.label(), backend.label()),
            Status::Error => format!("{} test on {} failed", operation.label(), backend.label()),
        };
        Self {
            current_database: backend,
            current_operation: operation,
            status,
            progress,
            message,
            record_count: None,
            iteration: None,
            total: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_record_count(mut self, record_count: usize) -> Self {
        self.record_count = Some(record_count);
        self
    }

    pub fn with_iteration(mut self, iteration: usize, total: usize) -> Self {
        self.iteration = Some(iteration);
        self.total = Some(total);
        self
    }
}

/// Final payload of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Results {
    Single(Vec<TestResult>),
    Repeated(Vec<RepeatTestResult>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Terminal {
    Complete { results: Results },
    Error { error: String },
}

/// One line of the progress stream. Status updates carry no `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Progress(ProgressEvent),
    Terminal(Terminal),
}

impl StreamEvent {
    pub fn complete(results: Results) -> Self {
        StreamEvent::Terminal(Terminal::Complete { results })
    }

    pub fn error(error: &BenchError) -> Self {
        StreamEvent::Terminal(Terminal::Error {
            error: error.to_string(),
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Terminal(_))
    }

    /// Newline-delimited JSON encoding of the event.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// `round(100 * done / total)`, clamped to 100.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (100.0 * done as f64 / total as f64).round();
    pct.min(100.0) as u8
}

/// Where a runner reports progress: nowhere for buffered runs, or the
/// producing end of a progress stream.
#[derive(Clone)]
pub struct ProgressSink {
    tx: Option<mpsc::Sender<StreamEvent>>,
}

impl ProgressSink {
    pub fn discard() -> Self {
        Self { tx: None }
    }

    /// A sink and the stream its events come out of, in order.
    pub fn channel() -> (Self, ReceiverStream<StreamEvent>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (Self { tx: Some(tx) }, ReceiverStream::new(rx))
    }

    /// Waits for channel capacity; fails once the consumer is gone.
    pub async fn emit(&self, event: StreamEvent) -> Result<(), BenchError> {
        match &self.tx {
            Some(tx) => tx.send(event).await.map_err(|_| BenchError::StreamClosed),
            None => Ok(()),
        }
    }

    pub async fn progress(&self, event: ProgressEvent) -> Result<(), BenchError> {
        self.emit(StreamEvent::Progress(event)).await
    }
}
