use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::BenchError;

/// A data store under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Cassandra,
    MongoDb,
    CockroachDb,
}

impl Backend {
    /// Matrix order: outer loop of every full run.
    pub const ALL: [Backend; 3] = [Backend::Cassandra, Backend::MongoDb, Backend::CockroachDb];

    pub fn id(&self) -> &'static str {
        match self {
            Backend::Cassandra => "cassandra",
            Backend::MongoDb => "mongodb",
            Backend::CockroachDb => "cockroachdb",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Backend::Cassandra => "Cassandra",
            Backend::MongoDb => "MongoDB",
            Backend::CockroachDb => "CockroachDB",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Backend {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cassandra" => Ok(Backend::Cassandra),
            "mongodb" => Ok(Backend::MongoDb),
            "cockroachdb" => Ok(Backend::CockroachDb),
            _ => Err(BenchError::UnsupportedBackend(s.to_string())),
        }
    }
}

/// A benchmarked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Write,
    Read,
    Update,
}

impl Operation {
    /// Matrix order: inner loop of every full run.
    pub const ALL: [Operation; 3] = [Operation::Write, Operation::Read, Operation::Update];

    pub fn id(&self) -> &'static str {
        match self {
            Operation::Write => "write",
            Operation::Read => "read",
            Operation::Update => "update",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Operation::Write => "Write",
            Operation::Read => "Read",
            Operation::Update => "Update",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Operation {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "write" => Ok(Operation::Write),
            "read" => Ok(Operation::Read),
            "update" => Ok(Operation::Update),
            _ => Err(BenchError::UnsupportedOperation(s.to_string())),
        }
    }
}
