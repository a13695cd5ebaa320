//! ksdown core: segmented HTTP downloads through a bounded worker pool.

pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod intake;
pub mod logging;
pub mod segmenter;
pub mod shutdown;
pub mod storage;

pub use config::EngineConfig;
pub use engine::{Engine, Intake, RunSummary};
pub use shutdown::{ShutdownSignal, TermSignal, TerminationController};
