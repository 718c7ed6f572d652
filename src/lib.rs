//! Tank Behavior - behavioral signal analysis for paired tank recordings
//!
//! This library turns sparse per-keyframe detections of two subjects, one on
//! each side of a divided tank, into dense activity, proximity, zone
//! occupancy, heatmap, trajectory and spectral signals.

pub mod analysis;
pub mod error;
pub mod loader;
pub mod model;
pub mod session;
pub mod validation;

pub use error::{AnalysisError, AnalysisResult};
pub use loader::load_recording;
pub use session::{AnalysisConfig, AnalysisReport, AnalysisSession};
