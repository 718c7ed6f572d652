//! Analysis session: loaded recording, parameters and cached results

pub mod config;
pub mod pipeline;
pub mod report;

pub use config::{ActivityMetric, AnalysisConfig, ProximityMetric};
pub use pipeline::{AnalysisSession, SignalKind};
pub use report::{AnalysisReport, SignalFrequencies};
