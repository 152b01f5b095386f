pub mod api;
pub mod backend;
pub mod bench;
pub mod conf;
pub mod core;
pub mod registry;
pub mod service;
pub mod workload;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
