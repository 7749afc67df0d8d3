// Library interface for rideclass
// The binary and the integration tests both go through these modules

pub mod analysis;
pub mod classifier;
pub mod cleaning;
pub mod config;
pub mod error;
pub mod hills;
pub mod intervals;
pub mod logging;
pub mod models;
pub mod terrain;

// Re-export commonly used types for convenience
pub use models::*;
pub use analysis::{BatchSummary, RideAnalyzer};
pub use classifier::RideClassifier;
pub use cleaning::StreamCleaner;
pub use config::{AnalysisConfig, ClassifierConfig, HillFinderConfig, IntervalFinderConfig, ReferencePower};
pub use error::{Result, RideError};
pub use hills::HillFinder;
pub use intervals::IntervalFinder;
pub use logging::{LogConfig, LogFormat, LogLevel};
