mod orchestrator;
pub mod progress;
pub mod protocol;
mod runner;
pub mod stats;

pub use orchestrator::TestOrchestrator;
pub use runner::{SequentialRunner, cells};
