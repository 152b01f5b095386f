use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bench::stats;
use crate::core::{Backend, BenchError, Operation};

/// Outcome of one (backend, operation) execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub database: Backend,
    pub operation: Operation,
    /// Milliseconds from invocation to the end of verification.
    pub time_taken: f64,
    pub record_count: usize,
    pub data_integrity: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    pub fn measured(
        database: Backend,
        operation: Operation,
        elapsed: Duration,
        record_count: usize,
        data_integrity: bool,
    ) -> Self {
        Self {
            database,
            operation,
            time_taken: millis(elapsed),
            record_count,
            data_integrity,
            error: None,
        }
    }

    /// A failed execution. Integrity is always false when an error is present.
    pub fn failed(
        database: Backend,
        operation: Operation,
        elapsed: Duration,
        record_count: usize,
        error: &BenchError,
    ) -> Self {
        Self {
            database,
            operation,
            time_taken: millis(elapsed),
            record_count,
            data_integrity: false,
            error: Some(error.to_string()),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.error.is_none() && self.data_integrity
    }
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

/// Timing distribution of one cell run repeatedly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatTestResult {
    pub database: Backend,
    pub operation: Operation,
    /// Per-iteration milliseconds, zero marks a failed iteration.
    pub times: Vec<f64>,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl RepeatTestResult {
    pub fn from_times(database: Backend, operation: Operation, times: Vec<f64>) -> Self {
        let summary = stats::aggregate(&times);
        Self {
            database,
            operation,
            times,
            average: summary.average,
            min: summary.min,
            max: summary.max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
    pub total_time: f64,
}

impl Summary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let successful_tests = results.iter().filter(|r| r.is_successful()).count();
        Self {
            total_tests: results.len(),
            successful_tests,
            failed_tests: results.len() - successful_tests,
            total_time: results.iter().map(|r| r.time_taken).sum(),
        }
    }
}

/// Buffered result of a full matrix run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixReport {
    pub results: Vec<TestResult>,
    pub summary: Summary,
}

impl From<Vec<TestResult>> for MatrixReport {
    fn from(results: Vec<TestResult>) -> Self {
        let summary = Summary::from_results(&results);
        Self { results, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_result_has_no_integrity() {
        let result = TestResult::failed(
            Backend::Cassandra,
            Operation::Read,
            Duration::ZERO,
            0,
            &BenchError::EmptyDataset,
        );
        assert!(!result.data_integrity);
        assert!(!result.is_successful());
        assert_eq!(
            result.error.as_deref(),
            Some("No records found in database. Please run Write test first.")
        );
    }

    #[test]
    fn test_result_wire_shape() {
        let result = TestResult::measured(
            Backend::CockroachDb,
            Operation::Write,
            Duration::from_millis(1500),
            10,
            true,
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "database": "cockroachdb",
                "operation": "write",
                "timeTaken": 1500.0,
                "recordCount": 10,
                "dataIntegrity": true
            })
        );
    }

    #[test]
    fn test_summary_counts_integrity_failures_as_failed() {
        let results = vec![
            TestResult::measured(Backend::MongoDb, Operation::Write, Duration::from_millis(10), 5, true),
            TestResult::measured(Backend::MongoDb, Operation::Read, Duration::from_millis(20), 5, false),
            TestResult::failed(
                Backend::MongoDb,
                Operation::Update,
                Duration::ZERO,
                0,
                &BenchError::QueryError("boom".into()),
            ),
        ];
        let report = MatrixReport::from(results);
        assert_eq!(report.summary.total_tests, 3);
        assert_eq!(report.summary.successful_tests, 1);
        assert_eq!(report.summary.failed_tests, 2);
        assert!((report.summary.total_time - 30.0).abs() < 1e-9);
    }
}
