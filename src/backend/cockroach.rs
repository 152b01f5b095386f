//! Distributed SQL backend over the Postgres wire protocol.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, Statement};
use uuid::Uuid;

use crate::conf::CockroachConfig;
use crate::core::{Backend, BenchError};
use crate::workload::{TABLE_NAME, TestRecord};

use super::{BackendAdapter, StoredRow};

pub struct CockroachAdapter {
    client: Client,
    insert: Statement,
    select: Statement,
    update: Statement,
    settle_delay: Duration,
}

impl CockroachAdapter {
    /// Connects and creates the table unless it already exists.
    pub async fn connect(config: &CockroachConfig) -> Result<Self, BenchError> {
        let (client, connection) = tokio_postgres::connect(&config.url, NoTls)
            .await
            .map_err(connection_error)?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("CockroachDB connection closed with error: {}", e);
            }
        });

        let create = format!(
            "CREATE TABLE {TABLE_NAME} (\
             id UUID PRIMARY KEY, user_id INT, name STRING, email STRING, \
             age INT, created_at TIMESTAMPTZ, data STRING)"
        );
        match client.batch_execute(&create).await {
            Ok(()) => info!("created CockroachDB table '{}'", TABLE_NAME),
            Err(e) if e.code() == Some(&SqlState::DUPLICATE_TABLE) => {
                debug!("CockroachDB table '{}' already exists", TABLE_NAME)
            }
            Err(e) => return Err(connection_error(e)),
        }

        let insert = client
            .prepare(&format!(
                "INSERT INTO {TABLE_NAME} (id, user_id, name, email, age, created_at, data) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ))
            .await
            .map_err(connection_error)?;
        let select = client
            .prepare(&format!("SELECT id, name, age FROM {TABLE_NAME} WHERE id = $1"))
            .await
            .map_err(connection_error)?;
        let update = client
            .prepare(&format!(
                "UPDATE {TABLE_NAME} SET name = $1, age = $2 WHERE id = $3"
            ))
            .await
            .map_err(connection_error)?;

        info!("connected to CockroachDB");
        Ok(Self {
            client,
            insert,
            select,
            update,
            settle_delay: config.settle_delay,
        })
    }
}

fn connection_error(err: impl std::fmt::Display) -> BenchError {
    BenchError::ConnectionError(format!("cockroachdb: {err}"))
}

#[async_trait]
impl BackendAdapter for CockroachAdapter {
    fn backend(&self) -> Backend {
        Backend::CockroachDb
    }

    async fn insert(&self, record: &TestRecord) -> Result<(), BenchError> {
        // INT columns are INT8 here, so integers go over the wire as i64.
        let user_id = i64::from(record.user_id);
        let age = i64::from(record.age);
        self.client
            .execute(
                &self.insert,
                &[
                    &record.id,
                    &user_id,
                    &record.name,
                    &record.email,
                    &age,
                    &record.created_at,
                    &record.data,
                ],
            )
            .await?;
        Ok(())
    }

    async fn find(&self, id: &Uuid) -> Result<Option<StoredRow>, BenchError> {
        let row = self.client.query_opt(&self.select, &[id]).await?;
        row.map(|row| -> Result<StoredRow, BenchError> {
            Ok(StoredRow {
                id: row.try_get::<_, Uuid>("id")?.to_string(),
                name: row.try_get::<_, Option<String>>("name")?.unwrap_or_default(),
                age: row.try_get::<_, Option<i64>>("age")?.unwrap_or_default(),
            })
        })
        .transpose()
    }

    async fn sample_ids(&self, limit: usize) -> Result<Vec<Uuid>, BenchError> {
        let rows = self
            .client
            .query(
                &format!("SELECT id FROM {TABLE_NAME} LIMIT $1"),
                &[&(limit as i64)],
            )
            .await?;
        rows.iter()
            .map(|row| row.try_get::<_, Uuid>("id").map_err(BenchError::from))
            .collect()
    }

    async fn update(&self, id: &Uuid, name: &str, age: i32) -> Result<(), BenchError> {
        let age = i64::from(age);
        self.client
            .execute(&self.update, &[&name, &age, id])
            .await?;
        Ok(())
    }

    fn settle_delay(&self) -> Option<Duration> {
        Some(self.settle_delay)
    }
}
