mod backends;
mod bench;
mod config;
mod server;

pub use backends::{BackendsConfig, CassandraConfig, CockroachConfig, MongoConfig};
pub use bench::BenchConfig;
pub use config::Config;
pub use server::ServerConfig;
