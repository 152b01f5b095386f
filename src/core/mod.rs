mod args;
mod error;
mod kind;
mod logger;
mod result;

pub use args::{CliArgs, Command};
pub use error::{BenchError, EMPTY_DATASET_MESSAGE};
pub use kind::{Backend, Operation};
pub use logger::setup_logging;
pub use result::{MatrixReport, RepeatTestResult, Summary, TestResult};
