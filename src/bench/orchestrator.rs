use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::bench::protocol::{OperationResult, Protocol};
use crate::conf::BenchConfig;
use crate::core::{Backend, BenchError, Operation, TestResult};
use crate::registry::ConnectionRegistry;
use crate::workload;

/// Runs single (backend, operation) tests.
pub struct TestOrchestrator {
    registry: Arc<ConnectionRegistry>,
    protocol: Protocol,
    write_count: usize,
    candidate_count: usize,
}

impl TestOrchestrator {
    pub fn new(registry: Arc<ConnectionRegistry>, config: &BenchConfig) -> Self {
        Self {
            registry,
            protocol: Protocol::new(config),
            write_count: config.write_count,
            candidate_count: config.candidate_count(),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Connects if needed, generates the workload and runs the operation.
    /// Never fails: every error ends up in the returned result.
    pub async fn run(&self, backend: Backend, operation: Operation) -> TestResult {
        let result = match self.execute(backend, operation).await {
            Ok(Ok(result)) => result,
            Ok(Err(failure)) => failure.into_result(backend, operation),
            Err(e) => TestResult::failed(backend, operation, Duration::ZERO, 0, &e),
        };

        match &result.error {
            None => info!(
                database = backend.id(),
                operation = operation.id(),
                records = result.record_count,
                integrity = result.data_integrity;
                "test finished in {:.1} ms", result.time_taken
            ),
            Some(error) => warn!(
                database = backend.id(),
                operation = operation.id();
                "test failed: {}", error
            ),
        }
        result
    }

    /// Like [`run`](Self::run) for names coming from outside, rejecting
    /// unknown backends and operations.
    pub async fn run_named(&self, database: &str, operation: &str) -> Result<TestResult, BenchError> {
        let backend: Backend = database.parse()?;
        let operation: Operation = operation.parse()?;
        Ok(self.run(backend, operation).await)
    }

    async fn execute(&self, backend: Backend, operation: Operation) -> Result<OperationResult, BenchError> {
        self.registry.connect(backend).await?;
        let adapter = self
            .registry
            .get_handle(backend)
            .await
            .ok_or(BenchError::NotConnected(backend))?;

        let outcome = match operation {
            Operation::Write => {
                let records = workload::generate(self.write_count);
                self.protocol.write(adapter.as_ref(), &records).await
            }
            Operation::Read => {
                let ids = workload::generate_ids(self.candidate_count);
                self.protocol.read(adapter.as_ref(), &ids).await
            }
            Operation::Update => {
                let ids = workload::generate_ids(self.candidate_count);
                self.protocol.update(adapter.as_ref(), &ids).await
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MemoryConnector, fast_bench_config};

    fn orchestrator(connector: Arc<MemoryConnector>) -> TestOrchestrator {
        let registry = Arc::new(ConnectionRegistry::new(connector));
        TestOrchestrator::new(registry, &fast_bench_config())
    }

    #[tokio::test]
    async fn test_write_then_read_then_update() {
        let connector = Arc::new(MemoryConnector::new());
        let orchestrator = orchestrator(connector.clone());

        let write = orchestrator.run(Backend::MongoDb, Operation::Write).await;
        assert_eq!(write.record_count, 250);
        assert!(write.data_integrity);

        let read = orchestrator.run(Backend::MongoDb, Operation::Read).await;
        assert_eq!(read.record_count, 100);
        assert!(read.is_successful());

        let update = orchestrator.run(Backend::MongoDb, Operation::Update).await;
        assert_eq!(update.record_count, 100);
        assert!(update.is_successful());
        assert_eq!(connector.open_count(Backend::MongoDb), 1);
    }

    #[tokio::test]
    async fn test_connection_failure_becomes_result() {
        let connector = Arc::new(MemoryConnector::new());
        connector.refuse(Backend::Cassandra);
        let orchestrator = orchestrator(connector);

        let result = orchestrator.run(Backend::Cassandra, Operation::Write).await;

        assert_eq!(result.time_taken, 0.0);
        assert_eq!(result.record_count, 0);
        assert!(!result.data_integrity);
        assert!(result.error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_run_named_rejects_unknown_names() {
        let orchestrator = orchestrator(Arc::new(MemoryConnector::new()));

        let err = orchestrator.run_named("oracle", "write").await.unwrap_err();
        assert_eq!(err, BenchError::UnsupportedBackend("oracle".into()));

        let err = orchestrator.run_named("mongodb", "scan").await.unwrap_err();
        assert_eq!(err, BenchError::UnsupportedOperation("scan".into()));

        let result = orchestrator.run_named("cockroachdb", "read").await.unwrap();
        assert_eq!(result.database, Backend::CockroachDb);
        assert_eq!(result.error.as_deref(), Some(crate::core::EMPTY_DATASET_MESSAGE));
    }
}
