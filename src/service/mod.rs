use std::sync::Arc;

use log::info;
use tokio_stream::wrappers::ReceiverStream;

use crate::backend::{BackendConnector, Connector};
use crate::bench::progress::StreamEvent;
use crate::bench::{SequentialRunner, TestOrchestrator};
use crate::conf::Config;
use crate::core::{Backend, BenchError, MatrixReport, RepeatTestResult, TestResult};
use crate::registry::ConnectionRegistry;

/// Wires the registry, orchestrator and runner behind the request surface.
pub struct BenchService {
    registry: Arc<ConnectionRegistry>,
    runner: Arc<SequentialRunner>,
    config: Config,
}

impl BenchService {
    /// A service talking to the real backends named in `config`.
    pub fn new(config: Config) -> Self {
        let connector = Arc::new(BackendConnector::new(config.backends.clone()));
        Self::with_connector(config, connector)
    }

    pub fn with_connector(config: Config, connector: Arc<dyn Connector>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(connector));
        let orchestrator = Arc::new(TestOrchestrator::new(registry.clone(), &config.bench));
        let runner = Arc::new(SequentialRunner::new(orchestrator, &config.bench));
        Self {
            registry,
            runner,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run_test(&self, database: &str, operation: &str) -> Result<TestResult, BenchError> {
        self.runner.run_single(database, operation).await
    }

    pub async fn run_all(&self) -> Result<MatrixReport, BenchError> {
        self.runner.run_matrix().await
    }

    pub async fn run_repeated(&self) -> Result<Vec<RepeatTestResult>, BenchError> {
        self.runner.run_repeated().await
    }

    pub fn stream_all(&self) -> ReceiverStream<StreamEvent> {
        self.runner.stream_matrix()
    }

    pub fn stream_repeated(&self) -> ReceiverStream<StreamEvent> {
        self.runner.stream_repeated()
    }

    pub async fn connected(&self) -> Vec<Backend> {
        self.registry.connected().await
    }

    pub async fn close_connections(&self) {
        self.runner.close_connections().await;
        info!("all backend connections closed");
    }
}
