//! Wide-column backend over CQL.

use async_trait::async_trait;
use log::info;
use scylla::frame::value::CqlTimestamp;
use scylla::prepared_statement::PreparedStatement;
use scylla::{Session, SessionBuilder};
use uuid::Uuid;

use crate::conf::CassandraConfig;
use crate::core::{Backend, BenchError};
use crate::workload::{TABLE_NAME, TestRecord};

use super::{BackendAdapter, StoredRow};

pub struct CassandraAdapter {
    session: Session,
    insert: PreparedStatement,
    select: PreparedStatement,
    update: PreparedStatement,
}

impl CassandraAdapter {
    /// Connects, then creates the keyspace and table if they are missing.
    pub async fn connect(config: &CassandraConfig) -> Result<Self, BenchError> {
        let session = SessionBuilder::new()
            .known_nodes(&config.nodes)
            .build()
            .await
            .map_err(|e| BenchError::ConnectionError(format!("cassandra: {e}")))?;

        let keyspace = &config.keyspace;
        session
            .query_unpaged(
                format!(
                    "CREATE KEYSPACE IF NOT EXISTS {keyspace} \
                     WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': 1}}"
                ),
                (),
            )
            .await
            .map_err(connection_error)?;
        session
            .use_keyspace(keyspace, false)
            .await
            .map_err(connection_error)?;
        session
            .query_unpaged(
                format!(
                    "CREATE TABLE IF NOT EXISTS {TABLE_NAME} (\
                     id uuid PRIMARY KEY, user_id int, name text, email text, \
                     age int, created_at timestamp, data text)"
                ),
                (),
            )
            .await
            .map_err(connection_error)?;

        let insert = session
            .prepare(format!(
                "INSERT INTO {TABLE_NAME} (id, user_id, name, email, age, created_at, data) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)"
            ))
            .await
            .map_err(connection_error)?;
        let select = session
            .prepare(format!("SELECT id, name, age FROM {TABLE_NAME} WHERE id = ?"))
            .await
            .map_err(connection_error)?;
        let update = session
            .prepare(format!("UPDATE {TABLE_NAME} SET name = ?, age = ? WHERE id = ?"))
            .await
            .map_err(connection_error)?;

        info!("connected to Cassandra keyspace '{}'", keyspace);
        Ok(Self {
            session,
            insert,
            select,
            update,
        })
    }
}

fn connection_error(err: impl std::fmt::Display) -> BenchError {
    BenchError::ConnectionError(format!("cassandra: {err}"))
}

fn query_error(err: impl std::fmt::Display) -> BenchError {
    BenchError::QueryError(err.to_string())
}

#[async_trait]
impl BackendAdapter for CassandraAdapter {
    fn backend(&self) -> Backend {
        Backend::Cassandra
    }

    async fn insert(&self, record: &TestRecord) -> Result<(), BenchError> {
        let values = (
            record.id,
            record.user_id,
            record.name.as_str(),
            record.email.as_str(),
            record.age,
            CqlTimestamp(record.created_at.timestamp_millis()),
            record.data.as_str(),
        );
        self.session
            .execute_unpaged(&self.insert, values)
            .await
            .map_err(query_error)?;
        Ok(())
    }

    async fn find(&self, id: &Uuid) -> Result<Option<StoredRow>, BenchError> {
        let row = self
            .session
            .execute_unpaged(&self.select, (*id,))
            .await
            .map_err(query_error)?
            .maybe_first_row_typed::<(Uuid, Option<String>, Option<i32>)>()
            .map_err(query_error)?;

        Ok(row.map(|(id, name, age)| StoredRow {
            id: id.to_string(),
            name: name.unwrap_or_default(),
            age: age.map(i64::from).unwrap_or_default(),
        }))
    }

    async fn sample_ids(&self, limit: usize) -> Result<Vec<Uuid>, BenchError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let result = self
            .session
            .query_unpaged(format!("SELECT id FROM {TABLE_NAME} LIMIT {limit}"), ())
            .await
            .map_err(query_error)?;

        result
            .rows_typed::<(Uuid,)>()
            .map_err(query_error)?
            .map(|row| row.map(|(id,)| id).map_err(query_error))
            .collect()
    }

    async fn update(&self, id: &Uuid, name: &str, age: i32) -> Result<(), BenchError> {
        self.session
            .execute_unpaged(&self.update, (name, age, *id))
            .await
            .map_err(query_error)?;
        Ok(())
    }
}
