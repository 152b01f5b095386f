//! Strictly sequential traversal of the backend × operation matrix.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::bench::TestOrchestrator;
use crate::bench::progress::{ProgressEvent, ProgressSink, Results, Status, StreamEvent, percent};
use crate::conf::BenchConfig;
use crate::core::{Backend, BenchError, MatrixReport, Operation, RepeatTestResult, TestResult};

/// Every cell in execution order: backends outer, operations inner.
pub fn cells() -> Vec<(Backend, Operation)> {
    Backend::ALL
        .into_iter()
        .flat_map(|backend| Operation::ALL.into_iter().map(move |op| (backend, op)))
        .collect()
}

/// Runs cells one at a time. Every entry point takes `run_lock` first, so
/// cells of concurrent requests never overlap and connections are only
/// closed between runs.
pub struct SequentialRunner {
    orchestrator: Arc<TestOrchestrator>,
    run_lock: Mutex<()>,
    cell_pause: Duration,
    iteration_pause: Duration,
    repeat_count: usize,
}

impl SequentialRunner {
    pub fn new(orchestrator: Arc<TestOrchestrator>, config: &BenchConfig) -> Self {
        Self {
            orchestrator,
            run_lock: Mutex::new(()),
            cell_pause: config.cell_pause,
            iteration_pause: config.iteration_pause,
            repeat_count: config.repeat_count,
        }
    }

    /// Runs one test named by the caller, waiting for any run in progress.
    pub async fn run_single(&self, database: &str, operation: &str) -> Result<TestResult, BenchError> {
        let _guard = self.run_lock.lock().await;
        self.orchestrator.run_named(database, operation).await
    }

    /// Closes every backend connection once no run is in progress.
    pub async fn close_connections(&self) {
        let _guard = self.run_lock.lock().await;
        self.orchestrator.registry().close_all().await;
    }

    /// Runs every cell once and buffers the results.
    pub async fn run_matrix(&self) -> Result<MatrixReport, BenchError> {
        let results = self.drive_matrix(&ProgressSink::discard()).await?;
        Ok(MatrixReport::from(results))
    }

    /// Runs every cell `repeat_count` times and buffers the statistics.
    pub async fn run_repeated(&self) -> Result<Vec<RepeatTestResult>, BenchError> {
        self.drive_repeated(&ProgressSink::discard()).await
    }

    /// Runs every cell once on a background task, streaming its progress.
    pub fn stream_matrix(self: &Arc<Self>) -> ReceiverStream<StreamEvent> {
        let (sink, stream) = ProgressSink::channel();
        let runner = Arc::clone(self);
        let producer = sink.clone();
        let task = tokio::spawn(async move {
            runner.drive_matrix(&producer).await.map(Results::Single)
        });
        tokio::spawn(finish(sink, task));
        stream
    }

    /// Repeated-run counterpart of [`stream_matrix`](Self::stream_matrix).
    pub fn stream_repeated(self: &Arc<Self>) -> ReceiverStream<StreamEvent> {
        let (sink, stream) = ProgressSink::channel();
        let runner = Arc::clone(self);
        let producer = sink.clone();
        let task = tokio::spawn(async move {
            runner.drive_repeated(&producer).await.map(Results::Repeated)
        });
        tokio::spawn(finish(sink, task));
        stream
    }

    async fn drive_matrix(&self, sink: &ProgressSink) -> Result<Vec<TestResult>, BenchError> {
        let _guard = self.run_lock.lock().await;
        let cells = cells();
        let total = cells.len();
        let mut results = Vec::with_capacity(total);
        info!("running {} tests", total);

        for (index, (backend, operation)) in cells.into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.cell_pause).await;
            }
            let before = percent(index, total);
            sink.progress(ProgressEvent::new(backend, operation, Status::Starting, before))
                .await?;
            sink.progress(ProgressEvent::new(backend, operation, Status::Running, before))
                .await?;

            let result = self.orchestrator.run(backend, operation).await;
            let record_count = result.record_count;
            let failure = result.error.clone();
            results.push(result);

            let after = percent(index + 1, total);
            let events = finished_events(backend, operation, before, after, record_count, failure);
            for event in events {
                sink.progress(event).await?;
            }
        }

        info!("finished {} tests", results.len());
        Ok(results)
    }

    async fn drive_repeated(
        &self,
        sink: &ProgressSink,
    ) -> Result<Vec<RepeatTestResult>, BenchError> {
        let _guard = self.run_lock.lock().await;
        let cells = cells();
        let repeats = self.repeat_count;
        let total_runs = cells.len() * repeats;
        let mut done = 0;
        let mut results = Vec::with_capacity(cells.len());
        info!("running {} tests {} times each", cells.len(), repeats);

        for (index, (backend, operation)) in cells.into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.cell_pause).await;
            }
            let mut times = Vec::with_capacity(repeats);

            for iteration in 1..=repeats {
                if iteration > 1 {
                    tokio::time::sleep(self.iteration_pause).await;
                }
                let before = percent(done, total_runs);
                for status in [Status::Starting, Status::Running] {
                    let event = ProgressEvent::new(backend, operation, status, before)
                        .with_iteration(iteration, repeats);
                    sink.progress(event).await?;
                }

                let result = self.orchestrator.run(backend, operation).await;
                done += 1;
                times.push(match result.error {
                    None => result.time_taken,
                    Some(_) => 0.0,
                });

                let after = percent(done, total_runs);
                let events = finished_events(
                    backend,
                    operation,
                    before,
                    after,
                    result.record_count,
                    result.error,
                );
                for event in events {
                    sink.progress(event.with_iteration(iteration, repeats)).await?;
                }
            }

            let aggregated = RepeatTestResult::from_times(backend, operation, times);
            debug!(
                "{} {}: avg {:.1} ms, min {:.1} ms, max {:.1} ms",
                backend, operation, aggregated.average, aggregated.min, aggregated.max
            );
            results.push(aggregated);
        }

        info!("finished {} repeated tests", results.len());
        Ok(results)
    }
}

/// Status events that close one run: `verifying` then `completed`, or a
/// single `error` when the run failed.
fn finished_events(
    backend: Backend,
    operation: Operation,
    before: u8,
    after: u8,
    record_count: usize,
    failure: Option<String>,
) -> Vec<ProgressEvent> {
    match failure {
        None => vec![
            ProgressEvent::new(backend, operation, Status::Verifying, before),
            ProgressEvent::new(backend, operation, Status::Completed, after)
                .with_record_count(record_count),
        ],
        Some(error) => vec![
            ProgressEvent::new(backend, operation, Status::Error, after)
                .with_message(format!(
                    "{} test on {} failed: {}",
                    operation.label(),
                    backend.label(),
                    error
                ))
                .with_record_count(record_count),
        ],
    }
}

/// Waits for the producing task and closes the stream with its outcome.
async fn finish(sink: ProgressSink, task: JoinHandle<Result<Results, BenchError>>) {
    let terminal = match task.await {
        Ok(Ok(results)) => StreamEvent::complete(results),
        Ok(Err(BenchError::StreamClosed)) => {
            debug!("progress consumer went away, run abandoned");
            return;
        }
        Ok(Err(e)) => {
            error!("test run aborted: {}", e);
            StreamEvent::error(&e)
        }
        Err(e) => {
            error!("test runner task failed: {}", e);
            StreamEvent::error(&BenchError::TaskFailed(e.to_string()))
        }
    };
    if sink.emit(terminal).await.is_err() {
        debug!("progress consumer went away before the final event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_order() {
        let cells = cells();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], (Backend::Cassandra, Operation::Write));
        assert_eq!(cells[1], (Backend::Cassandra, Operation::Read));
        assert_eq!(cells[2], (Backend::Cassandra, Operation::Update));
        assert_eq!(cells[3], (Backend::MongoDb, Operation::Write));
        assert_eq!(cells[8], (Backend::CockroachDb, Operation::Update));
    }

    #[test]
    fn test_failed_run_skips_verifying() {
        let events = finished_events(
            Backend::MongoDb,
            Operation::Read,
            11,
            22,
            0,
            Some("boom".into()),
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, Status::Error);
        assert_eq!(events[0].progress, 22);
        assert!(events[0].message.ends_with("boom"));
    }
}
