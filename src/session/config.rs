//! Analysis configuration

use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default cap on the gap between two keyframes that may be interpolated across
pub const DEFAULT_MAX_INTERPOLATION_GAP_SECS: f64 = 15.0;

/// Default number of frequency components returned per signal
pub const DEFAULT_TOP_K: usize = 5;

/// Difference metric used by the activity analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityMetric {
    /// `1 - IoU` between consecutive observed boxes
    #[default]
    Iou,

    /// Centroid displacement in pixels
    Centroid,
}

impl FromStr for ActivityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iou" => Ok(Self::Iou),
            "centroid" => Ok(Self::Centroid),
            other => Err(format!("unknown activity metric '{}' (expected iou or centroid)", other)),
        }
    }
}

/// Reference point used by the proximity analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProximityMetric {
    /// Box edge facing the boundary (or the bottom edge for verticality)
    #[default]
    Edge,

    /// Box centroid
    Centroid,
}

impl FromStr for ProximityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "edge" => Ok(Self::Edge),
            "centroid" => Ok(Self::Centroid),
            other => Err(format!("unknown proximity metric '{}' (expected edge or centroid)", other)),
        }
    }
}

/// Every parameter the analyzers consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub activity_metric: ActivityMetric,

    pub proximity_metric: ProximityMetric,

    /// Color-mapping exponent, passed through to consumers untouched
    pub activity_sensitivity: f64,

    /// Color-mapping exponent, passed through to consumers untouched
    pub proximity_sensitivity: f64,

    /// Trajectory sampling rate override (None = use the recording's rate)
    pub hertz: Option<f64>,

    /// Frequency components kept per signal
    pub top_k: usize,

    /// Longest keyframe gap (seconds) that may be bridged by interpolation
    pub max_interpolation_gap_secs: f64,

    /// Mirror-Partition band width as a fraction of the half-tank width
    pub mirror_partition_fraction: f64,

    /// Heatmap cell edge length in pixels
    pub heatmap_cell_px: f64,

    /// Normalization floor for heatmaps, in seconds worth of frames
    pub heatmap_floor_secs: f64,

    /// Seed for the heatmap stride generator (None = OS entropy)
    pub heatmap_seed: Option<u64>,

    /// Highest frequency considered by the spectral analyzer
    pub max_frequency_hz: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            activity_metric: ActivityMetric::default(),
            proximity_metric: ProximityMetric::default(),
            activity_sensitivity: 1.0,
            proximity_sensitivity: 1.0,
            hertz: None,
            top_k: DEFAULT_TOP_K,
            max_interpolation_gap_secs: DEFAULT_MAX_INTERPOLATION_GAP_SECS,
            mirror_partition_fraction: 1.0 / 12.0,
            heatmap_cell_px: 4.0,
            heatmap_floor_secs: 15.0,
            heatmap_seed: None,
            max_frequency_hz: 2.0,
        }
    }
}

impl AnalysisConfig {
    /// Create a config with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the activity difference metric
    pub fn with_activity_metric(mut self, metric: ActivityMetric) -> Self {
        self.activity_metric = metric;
        self
    }

    /// Set the proximity distance reference
    pub fn with_proximity_metric(mut self, metric: ProximityMetric) -> Self {
        self.proximity_metric = metric;
        self
    }

    /// Override the recording's detection rate
    pub fn with_hertz(mut self, hertz: f64) -> Self {
        self.hertz = Some(hertz);
        self
    }

    /// Set how many frequency components are kept per signal
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the longest interpolated keyframe gap, in seconds
    pub fn with_max_gap(mut self, secs: f64) -> Self {
        self.max_interpolation_gap_secs = secs;
        self
    }

    /// Seed the heatmap stride generator
    pub fn with_heatmap_seed(mut self, seed: u64) -> Self {
        self.heatmap_seed = Some(seed);
        self
    }

    /// Reject values the analyzers cannot work with
    pub fn validate(&self) -> AnalysisResult<()> {
        fn positive(name: &'static str, value: f64) -> AnalysisResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(AnalysisError::invalid(name, format!("must be positive, got {}", value)))
            }
        }

        positive("activity_sensitivity", self.activity_sensitivity)?;
        positive("proximity_sensitivity", self.proximity_sensitivity)?;
        positive("max_interpolation_gap_secs", self.max_interpolation_gap_secs)?;
        positive("heatmap_cell_px", self.heatmap_cell_px)?;
        positive("max_frequency_hz", self.max_frequency_hz)?;

        if let Some(hertz) = self.hertz {
            positive("hertz", hertz)?;
        }
        if self.top_k == 0 {
            return Err(AnalysisError::invalid("top_k", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.mirror_partition_fraction) {
            return Err(AnalysisError::invalid(
                "mirror_partition_fraction",
                format!("must lie in [0, 1], got {}", self.mirror_partition_fraction),
            ));
        }
        if self.heatmap_floor_secs.is_nan() || self.heatmap_floor_secs < 0.0 {
            return Err(AnalysisError::invalid(
                "heatmap_floor_secs",
                format!("must not be negative, got {}", self.heatmap_floor_secs),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.top_k, 5);
        assert_eq!(config.activity_metric, ActivityMetric::Iou);
        assert_eq!(config.proximity_metric, ProximityMetric::Edge);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AnalysisConfig::new().with_top_k(0).validate().is_err());
        assert!(AnalysisConfig::new().with_max_gap(0.0).validate().is_err());
        assert!(AnalysisConfig::new().with_hertz(-1.0).validate().is_err());
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("IoU".parse::<ActivityMetric>(), Ok(ActivityMetric::Iou));
        assert_eq!("centroid".parse::<ProximityMetric>(), Ok(ProximityMetric::Centroid));
        assert!("area".parse::<ActivityMetric>().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"activity_metric": "centroid", "top_k": 3}"#).unwrap();
        assert_eq!(config.activity_metric, ActivityMetric::Centroid);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.max_interpolation_gap_secs, 15.0);
    }
}
