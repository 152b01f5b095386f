//! In-memory backends for tests and benchmarks.
//!
//! This module is only available in tests or when the `testutil` feature is enabled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::{BackendAdapter, Connector, StoredRow};
use crate::conf::{BenchConfig, Config};
use crate::core::{Backend, BenchError};
use crate::workload::TestRecord;

/// Misbehaviour to inject into a [`MemoryAdapter`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Faults {
    /// Inserts fail once this many records are stored.
    pub fail_insert_after: Option<usize>,
    pub fail_reads: bool,
    pub fail_updates: bool,
    /// Inserts report success but store nothing.
    pub lose_writes: bool,
    /// Updates report success but change nothing.
    pub ignore_updates: bool,
}

#[derive(Default)]
struct Rows {
    order: Vec<Uuid>,
    by_id: HashMap<Uuid, StoredRow>,
}

/// A backend that keeps rows in a process-local map.
pub struct MemoryAdapter {
    backend: Backend,
    rows: Mutex<Rows>,
    faults: Mutex<Faults>,
    settle_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryAdapter {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            rows: Mutex::new(Rows::default()),
            faults: Mutex::new(Faults::default()),
            settle_delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn set_faults(&self, faults: Faults) {
        *self.faults.lock().unwrap() = faults;
    }

    pub fn set_settle_delay(&self, delay: Option<Duration>) {
        *self.settle_delay.lock().unwrap() = delay;
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, id: &Uuid) -> Option<StoredRow> {
        self.rows.lock().unwrap().by_id.get(id).cloned()
    }

    /// Highest number of inserts observed in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn faults(&self) -> Faults {
        *self.faults.lock().unwrap()
    }
}

#[async_trait]
impl BackendAdapter for MemoryAdapter {
    fn backend(&self) -> Backend {
        self.backend
    }

    async fn insert(&self, record: &TestRecord) -> Result<(), BenchError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let faults = self.faults();
        let mut rows = self.rows.lock().unwrap();
        if let Some(limit) = faults.fail_insert_after {
            if rows.order.len() >= limit {
                return Err(BenchError::QueryError(format!(
                    "insert rejected after {limit} records"
                )));
            }
        }
        if faults.lose_writes {
            return Ok(());
        }
        if rows
            .by_id
            .insert(
                record.id,
                StoredRow {
                    id: record.id.to_string(),
                    name: record.name.clone(),
                    age: i64::from(record.age),
                },
            )
            .is_none()
        {
            rows.order.push(record.id);
        }
        Ok(())
    }

    async fn find(&self, id: &Uuid) -> Result<Option<StoredRow>, BenchError> {
        tokio::task::yield_now().await;
        if self.faults().fail_reads {
            return Err(BenchError::QueryError("read timed out".into()));
        }
        Ok(self.row(id))
    }

    async fn sample_ids(&self, limit: usize) -> Result<Vec<Uuid>, BenchError> {
        if self.faults().fail_reads {
            return Err(BenchError::QueryError("read timed out".into()));
        }
        let rows = self.rows.lock().unwrap();
        Ok(rows.order.iter().take(limit).copied().collect())
    }

    async fn update(&self, id: &Uuid, name: &str, age: i32) -> Result<(), BenchError> {
        tokio::task::yield_now().await;
        let faults = self.faults();
        if faults.fail_updates {
            return Err(BenchError::QueryError("update rejected".into()));
        }
        if faults.ignore_updates {
            return Ok(());
        }
        if let Some(row) = self.rows.lock().unwrap().by_id.get_mut(id) {
            row.name = name.to_string();
            row.age = i64::from(age);
        }
        Ok(())
    }

    fn settle_delay(&self) -> Option<Duration> {
        *self.settle_delay.lock().unwrap()
    }
}

/// Hands out one shared [`MemoryAdapter`] per backend, so data survives
/// closing and reopening a connection like a real store would.
pub struct MemoryConnector {
    adapters: HashMap<Backend, Arc<MemoryAdapter>>,
    opens: Mutex<HashMap<Backend, usize>>,
    refused: Mutex<Vec<Backend>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self {
            adapters: Backend::ALL
                .into_iter()
                .map(|b| (b, Arc::new(MemoryAdapter::new(b))))
                .collect(),
            opens: Mutex::new(HashMap::new()),
            refused: Mutex::new(Vec::new()),
        }
    }

    pub fn adapter(&self, backend: Backend) -> Arc<MemoryAdapter> {
        self.adapters[&backend].clone()
    }

    /// Makes every future `open` of `backend` fail.
    pub fn refuse(&self, backend: Backend) {
        self.refused.lock().unwrap().push(backend);
    }

    pub fn open_count(&self, backend: Backend) -> usize {
        self.opens.lock().unwrap().get(&backend).copied().unwrap_or(0)
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self, backend: Backend) -> Result<Arc<dyn BackendAdapter>, BenchError> {
        tokio::task::yield_now().await;
        *self.opens.lock().unwrap().entry(backend).or_default() += 1;
        if self.refused.lock().unwrap().contains(&backend) {
            return Err(BenchError::ConnectionError(format!(
                "{}: connection refused",
                backend.id()
            )));
        }
        Ok(self.adapter(backend))
    }
}

/// Small workload with no pauses, fast enough for unit tests.
pub fn fast_bench_config() -> BenchConfig {
    BenchConfig {
        write_count: 250,
        sample_cap: 100,
        chunk_size: 20,
        repeat_count: 3,
        cell_pause: Duration::ZERO,
        iteration_pause: Duration::ZERO,
    }
}

pub fn fast_config() -> Config {
    Config {
        bench: fast_bench_config(),
        ..Config::default()
    }
}
