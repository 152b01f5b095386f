use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BackendsConfig {
    #[serde(default)]
    pub cassandra: CassandraConfig,
    #[serde(default)]
    pub mongodb: MongoConfig,
    #[serde(default)]
    pub cockroachdb: CockroachConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CassandraConfig {
    #[serde(default = "CassandraConfig::default_nodes")]
    pub nodes: Vec<String>,
    #[serde(default = "CassandraConfig::default_keyspace")]
    pub keyspace: String,
}

impl CassandraConfig {
    fn default_nodes() -> Vec<String> {
        vec![String::from("127.0.0.1:9042")]
    }

    fn default_keyspace() -> String {
        String::from("benchmark")
    }
}

impl Default for CassandraConfig {
    fn default() -> Self {
        Self {
            nodes: Self::default_nodes(),
            keyspace: Self::default_keyspace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MongoConfig {
    #[serde(default = "MongoConfig::default_uri")]
    pub uri: String,
    #[serde(default = "MongoConfig::default_database")]
    pub database: String,
}

impl MongoConfig {
    fn default_uri() -> String {
        String::from("mongodb://localhost:27017")
    }

    fn default_database() -> String {
        String::from("benchmark")
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: Self::default_uri(),
            database: Self::default_database(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CockroachConfig {
    #[serde(default = "CockroachConfig::default_url")]
    pub url: String,
    /// Pause between the last update and its verification read.
    #[serde(
        with = "humantime_serde",
        default = "CockroachConfig::default_settle_delay"
    )]
    pub settle_delay: Duration,
}

impl CockroachConfig {
    fn default_url() -> String {
        String::from("postgresql://root@localhost:26257/defaultdb?sslmode=disable")
    }

    fn default_settle_delay() -> Duration {
        Duration::from_millis(100)
    }
}

impl Default for CockroachConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            settle_delay: Self::default_settle_delay(),
        }
    }
}
