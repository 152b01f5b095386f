//! Pluggable data-store adapters under benchmark.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::conf::BackendsConfig;
use crate::core::{Backend, BenchError};
use crate::workload::TestRecord;

mod cassandra;
mod cockroach;
mod mongo;

pub use cassandra::CassandraAdapter;
pub use cockroach::CockroachAdapter;
pub use mongo::MongoAdapter;

/// A record as read back from a backend.
///
/// `age` is widened to `i64` whatever the native column type is, so
/// verification compares the same thing on every backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: String,
    pub name: String,
    pub age: i64,
}

/// Record-level access to one live backend connection.
///
/// Implementations only issue single-record requests; batching, fan-out,
/// timing and verification are shared in [`crate::bench::protocol`].
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    fn backend(&self) -> Backend;

    async fn insert(&self, record: &TestRecord) -> Result<(), BenchError>;

    async fn find(&self, id: &Uuid) -> Result<Option<StoredRow>, BenchError>;

    /// Up to `limit` ids currently persisted, in backend order.
    async fn sample_ids(&self, limit: usize) -> Result<Vec<Uuid>, BenchError>;

    async fn update(&self, id: &Uuid, name: &str, age: i32) -> Result<(), BenchError>;

    /// Pause to take after updates before reading them back.
    fn settle_delay(&self) -> Option<Duration> {
        None
    }

    async fn close(&self) -> Result<(), BenchError> {
        Ok(())
    }
}

/// Opens a fresh, schema-ready connection to a backend.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, backend: Backend) -> Result<Arc<dyn BackendAdapter>, BenchError>;
}

/// Connects to the real data stores described by the config.
pub struct BackendConnector {
    config: BackendsConfig,
}

impl BackendConnector {
    pub fn new(config: BackendsConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for BackendConnector {
    async fn open(&self, backend: Backend) -> Result<Arc<dyn BackendAdapter>, BenchError> {
        let adapter: Arc<dyn BackendAdapter> = match backend {
            Backend::Cassandra => Arc::new(CassandraAdapter::connect(&self.config.cassandra).await?),
            Backend::MongoDb => Arc::new(MongoAdapter::connect(&self.config.mongodb).await?),
            Backend::CockroachDb => {
                Arc::new(CockroachAdapter::connect(&self.config.cockroachdb).await?)
            }
        };
        Ok(adapter)
    }
}

fn parse_id(raw: &str) -> Result<Uuid, BenchError> {
    Uuid::parse_str(raw).map_err(|e| BenchError::QueryError(format!("invalid record id '{raw}': {e}")))
}
