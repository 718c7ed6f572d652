//! Serializable bundle of every analysis result

use super::config::AnalysisConfig;
use crate::analysis::{
    ActivitySignal, FrequencyComponent, Heatmaps, ProximitySignal, Trajectories, ZoneOccupancy,
};
use crate::model::{Side, TankGeometry, VideoMetadata};
use serde::Serialize;
use std::sync::Arc;

/// Ranked components of one named signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalFrequencies {
    /// Signal label such as `activity` or `overlap:MP`
    pub signal: String,

    /// None for signals that combine both sides
    pub side: Option<Side>,

    pub components: Vec<FrequencyComponent>,
}

/// Everything one full analysis run produced
///
/// Results are shared with the session cache, not copied.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// RFC 3339 local time the report was assembled
    pub generated_at: String,
    pub filename: Option<String>,
    pub video: VideoMetadata,
    pub tank: TankGeometry,
    pub config: AnalysisConfig,
    pub activity: Arc<ActivitySignal>,
    pub proximity: Arc<ProximitySignal>,
    pub zones: Arc<ZoneOccupancy>,
    pub heatmaps: Arc<Heatmaps>,
    pub trajectories: Arc<Trajectories>,
    pub frequencies: Vec<SignalFrequencies>,
}

impl AnalysisReport {
    pub fn frequencies_for(&self, signal: &str, side: Option<Side>) -> Option<&SignalFrequencies> {
        self.frequencies
            .iter()
            .find(|f| f.signal == signal && f.side == side)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
