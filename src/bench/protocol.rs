//! Batched execution and spot-check verification shared by every backend.
//!
//! Each call times itself from invocation through verification and returns
//! either a measured [`TestResult`] or an [`OperationFailure`] describing how
//! far it got.

use std::time::{Duration, Instant};

use futures::future::try_join_all;
use log::{debug, warn};
use uuid::Uuid;

use crate::backend::BackendAdapter;
use crate::conf::BenchConfig;
use crate::core::{Backend, BenchError, Operation, TestResult};
use crate::workload::TestRecord;

/// Prefix of every name written by an update run.
pub const UPDATED_NAME_PREFIX: &str = "Updated User";
/// Age every updated record is set to.
pub const UPDATED_AGE: i32 = 99;

/// An operation that stopped on an error.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationFailure {
    pub error: BenchError,
    /// Records processed before the failure, 0 if it happened before id
    /// discovery.
    pub record_count: usize,
    pub elapsed: Duration,
}

impl OperationFailure {
    pub fn into_result(self, backend: Backend, operation: Operation) -> TestResult {
        TestResult::failed(
            backend,
            operation,
            self.elapsed,
            self.record_count,
            &self.error,
        )
    }
}

pub type OperationResult = Result<TestResult, OperationFailure>;

fn failure(start: Instant, record_count: usize) -> impl FnOnce(BenchError) -> OperationFailure {
    move |error| OperationFailure {
        error,
        record_count,
        elapsed: start.elapsed(),
    }
}

pub fn updated_name(id: &Uuid) -> String {
    format!("{UPDATED_NAME_PREFIX} {id}")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Protocol {
    chunk_size: usize,
    sample_cap: usize,
}

impl Protocol {
    pub fn new(config: &BenchConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            sample_cap: config.sample_cap,
        }
    }

    /// Inserts `records` chunk by chunk, all inserts of a chunk in flight at
    /// once, then reads the first record back and compares its name.
    pub async fn write(
        &self,
        adapter: &dyn BackendAdapter,
        records: &[TestRecord],
    ) -> OperationResult {
        let start = Instant::now();
        let mut written = 0;

        for chunk in records.chunks(self.chunk_size) {
            try_join_all(chunk.iter().map(|record| adapter.insert(record)))
                .await
                .map_err(failure(start, written))?;
            written += chunk.len();
        }
        debug!("{}: inserted {} records", adapter.backend(), written);

        let integrity = match records.first() {
            Some(first) => {
                let found = adapter
                    .find(&first.id)
                    .await
                    .map_err(failure(start, written))?;
                found.is_some_and(|row| row.name == first.name)
            }
            None => false,
        };
        if !integrity {
            warn!("{}: write spot check failed", adapter.backend());
        }

        Ok(TestResult::measured(
            adapter.backend(),
            Operation::Write,
            start.elapsed(),
            written,
            integrity,
        ))
    }

    /// Reads up to `candidates.len()` currently stored records concurrently.
    ///
    /// The ids read are whatever the backend holds, not `candidates`
    /// themselves, so repeated reads exercise persisted data.
    pub async fn read(&self, adapter: &dyn BackendAdapter, candidates: &[Uuid]) -> OperationResult {
        let start = Instant::now();
        let ids = self.discover(adapter, candidates, start).await?;

        let rows = try_join_all(ids.iter().map(|id| adapter.find(id)))
            .await
            .map_err(failure(start, ids.len()))?;

        let all_found = rows.iter().all(Option::is_some);
        let first_complete = rows
            .first()
            .and_then(Option::as_ref)
            .is_some_and(|row| !row.id.is_empty() && !row.name.is_empty());
        let integrity = all_found && first_complete;
        if !integrity {
            warn!("{}: read spot check failed", adapter.backend());
        }

        Ok(TestResult::measured(
            adapter.backend(),
            Operation::Read,
            start.elapsed(),
            ids.len(),
            integrity,
        ))
    }

    /// Renames and re-ages up to `candidates.len()` stored records
    /// concurrently, then verifies the first one.
    pub async fn update(
        &self,
        adapter: &dyn BackendAdapter,
        candidates: &[Uuid],
    ) -> OperationResult {
        let start = Instant::now();
        let ids = self.discover(adapter, candidates, start).await?;

        try_join_all(
            ids.iter()
                .map(|id| async move { adapter.update(id, &updated_name(id), UPDATED_AGE).await }),
        )
        .await
        .map_err(failure(start, ids.len()))?;

        if let Some(delay) = adapter.settle_delay() {
            debug!("{}: settling for {:?} before verification", adapter.backend(), delay);
            tokio::time::sleep(delay).await;
        }

        let found = adapter
            .find(&ids[0])
            .await
            .map_err(failure(start, ids.len()))?;
        let integrity = found.is_some_and(|row| {
            row.age == i64::from(UPDATED_AGE) && row.name.contains(UPDATED_NAME_PREFIX)
        });
        if !integrity {
            warn!("{}: update spot check failed", adapter.backend());
        }

        Ok(TestResult::measured(
            adapter.backend(),
            Operation::Update,
            start.elapsed(),
            ids.len(),
            integrity,
        ))
    }

    /// Persisted ids to operate on, never empty.
    async fn discover(
        &self,
        adapter: &dyn BackendAdapter,
        candidates: &[Uuid],
        start: Instant,
    ) -> Result<Vec<Uuid>, OperationFailure> {
        let limit = candidates.len().min(self.sample_cap);
        let ids = adapter
            .sample_ids(limit)
            .await
            .map_err(failure(start, 0))?;
        if ids.is_empty() {
            return Err(failure(start, 0)(BenchError::EmptyDataset));
        }
        Ok(ids)
    }
}
