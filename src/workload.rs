//! Deterministic-shape test data for write runs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Table (or collection) every backend stores the workload in.
pub const TABLE_NAME: &str = "test_data";

const MIN_AGE: i32 = 20;
const AGE_SPAN: usize = 50;

/// One workload row.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord {
    pub id: Uuid,
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub created_at: DateTime<Utc>,
    pub data: String,
}

/// Builds `count` records with `user_id` running 1..=count.
///
/// Names, emails and ages are derived from the record index, ids are random,
/// and every record shares one creation timestamp.
pub fn generate(count: usize) -> Vec<TestRecord> {
    let created_at = Utc::now();
    (0..count)
        .map(|i| {
            let seq = i + 1;
            TestRecord {
                id: Uuid::new_v4(),
                user_id: i32::try_from(seq).unwrap_or(i32::MAX),
                name: format!("User {seq}"),
                email: format!("user{seq}@example.com"),
                age: MIN_AGE + (i % AGE_SPAN) as i32,
                created_at,
                data: format!("Benchmark payload for record {seq}"),
            }
        })
        .collect()
}

/// Fresh ids only, for read and update runs.
pub fn generate_ids(count: usize) -> Vec<Uuid> {
    (0..count).map(|_| Uuid::new_v4()).collect()
}
