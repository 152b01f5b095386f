//! Document backend.

use async_trait::async_trait;
use futures::TryStreamExt;
use log::{debug, info};
use mongodb::bson::{Bson, DateTime, Document, doc};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::{Client, Collection};
use uuid::Uuid;

use crate::conf::MongoConfig;
use crate::core::{Backend, BenchError};
use crate::workload::{TABLE_NAME, TestRecord};

use super::{BackendAdapter, StoredRow, parse_id};

/// Server error code for creating a collection that already exists.
const NAMESPACE_EXISTS: i32 = 48;

pub struct MongoAdapter {
    client: Client,
    collection: Collection<Document>,
}

impl MongoAdapter {
    /// Connects and creates the collection unless it already exists.
    pub async fn connect(config: &MongoConfig) -> Result<Self, BenchError> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| BenchError::ConnectionError(format!("mongodb: {e}")))?;
        let database = client.database(&config.database);

        match database.create_collection(TABLE_NAME).await {
            Ok(()) => info!("created MongoDB collection '{}'", TABLE_NAME),
            Err(e) if is_namespace_exists(&e) => {
                debug!("MongoDB collection '{}' already exists", TABLE_NAME)
            }
            Err(e) => return Err(BenchError::ConnectionError(format!("mongodb: {e}"))),
        }

        info!("connected to MongoDB database '{}'", config.database);
        Ok(Self {
            collection: database.collection(TABLE_NAME),
            client,
        })
    }
}

fn is_namespace_exists(err: &MongoError) -> bool {
    matches!(err.kind.as_ref(), ErrorKind::Command(cmd) if cmd.code == NAMESPACE_EXISTS)
}

/// Reads `age` as an integer whichever BSON numeric type the server stored.
fn age_of(document: &Document) -> i64 {
    match document.get("age") {
        Some(Bson::Int32(v)) => i64::from(*v),
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Double(v)) => *v as i64,
        _ => 0,
    }
}

fn row_of(document: &Document) -> StoredRow {
    StoredRow {
        id: document.get_str("_id").unwrap_or_default().to_string(),
        name: document.get_str("name").unwrap_or_default().to_string(),
        age: age_of(document),
    }
}

#[async_trait]
impl BackendAdapter for MongoAdapter {
    fn backend(&self) -> Backend {
        Backend::MongoDb
    }

    async fn insert(&self, record: &TestRecord) -> Result<(), BenchError> {
        let document = doc! {
            "_id": record.id.to_string(),
            "user_id": record.user_id,
            "name": record.name.as_str(),
            "email": record.email.as_str(),
            "age": record.age,
            "created_at": DateTime::from_millis(record.created_at.timestamp_millis()),
            "data": record.data.as_str(),
        };
        self.collection.insert_one(document).await?;
        Ok(())
    }

    async fn find(&self, id: &Uuid) -> Result<Option<StoredRow>, BenchError> {
        let found = self
            .collection
            .find_one(doc! { "_id": id.to_string() })
            .await?;
        Ok(found.as_ref().map(row_of))
    }

    async fn sample_ids(&self, limit: usize) -> Result<Vec<Uuid>, BenchError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let documents: Vec<Document> = self
            .collection
            .find(doc! {})
            .projection(doc! { "_id": 1 })
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        documents
            .iter()
            .map(|d| parse_id(d.get_str("_id").unwrap_or_default()))
            .collect()
    }

    async fn update(&self, id: &Uuid, name: &str, age: i32) -> Result<(), BenchError> {
        self.collection
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$set": { "name": name, "age": age } },
            )
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), BenchError> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_coercion() {
        assert_eq!(age_of(&doc! { "age": 99_i32 }), 99);
        assert_eq!(age_of(&doc! { "age": 99_i64 }), 99);
        assert_eq!(age_of(&doc! { "age": 99.0_f64 }), 99);
        assert_eq!(age_of(&doc! {}), 0);
    }

    #[test]
    fn test_row_of_document() {
        let row = row_of(&doc! { "_id": "abc", "name": "Updated User abc", "age": 99 });
        assert_eq!(
            row,
            StoredRow {
                id: "abc".into(),
                name: "Updated User abc".into(),
                age: 99,
            }
        );
    }
}
