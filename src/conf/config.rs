use crate::{
    conf::{BackendsConfig, BenchConfig, ServerConfig},
    core::BenchError::{self, ConfigParsingError},
};
use config::{Config as CConfig, ConfigBuilder, builder::DefaultState};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "STOREBENCH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backends: BackendsConfig,
    #[serde(default)]
    pub bench: BenchConfig,
}

impl Config {
    pub fn from_str(toml_str: &str) -> Result<Config, BenchError> {
        let builder = CConfig::builder()
            .add_source(config::File::from_str(toml_str, config::FileFormat::Toml));
        Self::build(builder)
    }

    /// Layers an optional TOML file under `STOREBENCH_*` environment overrides,
    /// e.g. `STOREBENCH_SERVER__PORT=8080`.
    pub fn load(path: Option<&str>) -> Result<Config, BenchError> {
        let mut builder = CConfig::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );
        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Config, BenchError> {
        let config = builder
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        config.bench.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn load_correct_toml() {
        let toml = r#"
        [server]
        host = "127.0.0.1"
        port = 3000

        [backends.cassandra]
        nodes = ["10.0.0.1:9042", "10.0.0.2:9042"]

        [backends.cockroachdb]
        settle_delay = "250ms"

        [bench]
        write_count = 500
        cell_pause = "0s"
        "#;
        let conf = Config::from_str(toml).unwrap();
        assert_eq!(conf.server.host, "127.0.0.1");
        assert_eq!(conf.server.port, 3000);
        assert_eq!(conf.backends.cassandra.nodes.len(), 2);
        assert_eq!(conf.backends.cassandra.keyspace, "benchmark");
        assert_eq!(
            conf.backends.cockroachdb.settle_delay,
            Duration::from_millis(250)
        );
        assert_eq!(conf.backends.mongodb.uri, "mongodb://localhost:27017");
        assert_eq!(conf.bench.write_count, 500);
        assert_eq!(conf.bench.cell_pause, Duration::ZERO);
        assert_eq!(conf.bench.iteration_pause, Duration::from_millis(500));
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let conf = Config::from_str("").unwrap();
        assert_eq!(conf, Config::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let toml = r#"
        [bench]
        workers = 4
        "#;
        assert!(matches!(
            Config::from_str(toml),
            Err(BenchError::ConfigParsingError(_))
        ));
    }

    #[test]
    fn oversized_write_count_is_rejected() {
        let toml = r#"
        [bench]
        write_count = 3000000000
        "#;
        assert!(matches!(
            Config::from_str(toml),
            Err(BenchError::ConfigParsingError(_))
        ));
    }
}
