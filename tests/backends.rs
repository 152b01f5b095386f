//! End-to-end runs against real data stores started in containers.
//!
//! These need a Docker daemon and are ignored by default:
//! `cargo test --test backends -- --ignored`.

use std::time::Duration;

use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{GenericImage, ImageExt};
use testcontainers_modules::mongo::Mongo;

use storebench::conf::Config;
use storebench::core::{Backend, EMPTY_DATASET_MESSAGE, Operation};
use storebench::service::BenchService;
use storebench::testutil::fast_bench_config;

fn config() -> Config {
    Config {
        bench: fast_bench_config(),
        ..Config::default()
    }
}

/// Read before write, then write, read and update one backend.
async fn exercise(service: &BenchService, backend: Backend) {
    let read = service.run_test(backend.id(), "read").await.unwrap();
    assert_eq!(read.record_count, 0);
    assert_eq!(read.error.as_deref(), Some(EMPTY_DATASET_MESSAGE));

    let write = service.run_test(backend.id(), "write").await.unwrap();
    assert_eq!(write.operation, Operation::Write);
    assert_eq!(write.error, None);
    assert_eq!(write.record_count, 250);
    assert!(write.data_integrity);

    let first = service.run_test(backend.id(), "read").await.unwrap();
    let second = service.run_test(backend.id(), "read").await.unwrap();
    assert_eq!(first.record_count, 100);
    assert!(first.data_integrity);
    assert_eq!(first.record_count, second.record_count);
    assert_eq!(first.data_integrity, second.data_integrity);

    let update = service.run_test(backend.id(), "update").await.unwrap();
    assert_eq!(update.error, None);
    assert_eq!(update.record_count, 100);
    assert!(update.data_integrity);

    service.close_connections().await;
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_mongodb_round() {
    let container = Mongo::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(27017).await.unwrap();

    let mut config = config();
    config.backends.mongodb.uri = format!("mongodb://{host}:{port}");
    exercise(&BenchService::new(config), Backend::MongoDb).await;
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_cockroachdb_round() {
    let container = GenericImage::new("cockroachdb/cockroach", "v24.1.0")
        .with_exposed_port(26257.tcp())
        .with_wait_for(WaitFor::message_on_stdout("CockroachDB node starting"))
        .with_cmd(["start-single-node", "--insecure"])
        .start()
        .await
        .unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(26257).await.unwrap();

    let mut config = config();
    config.backends.cockroachdb.url =
        format!("postgresql://root@{host}:{port}/defaultdb?sslmode=disable");
    config.backends.cockroachdb.settle_delay = Duration::from_millis(50);
    exercise(&BenchService::new(config), Backend::CockroachDb).await;
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_cassandra_round() {
    let container = GenericImage::new("cassandra", "4.1")
        .with_exposed_port(9042.tcp())
        .with_wait_for(WaitFor::message_on_stdout(
            "Starting listening for CQL clients",
        ))
        .start()
        .await
        .unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(9042).await.unwrap();

    let mut config = config();
    config.backends.cassandra.nodes = vec![format!("{host}:{port}")];
    exercise(&BenchService::new(config), Backend::Cassandra).await;
}
