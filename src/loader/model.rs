//! Raw serde structures mirroring the keyframe JSON document

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    pub video_info: RawVideoInfo,
    pub tank_info: RawTankInfo,
    #[serde(default)]
    pub detection_params: RawDetectionParams,
    /// Frame index (as a decimal string) to keyframe
    pub keyframes: BTreeMap<String, RawKeyframe>,
    /// Producer statistics, not used by the analyzers
    #[serde(default)]
    pub processing_stats: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawVideoInfo {
    #[serde(default)]
    pub filename: Option<String>,
    pub fps: f64,
    pub width: f64,
    pub height: f64,
    #[serde(alias = "total_frames")]
    pub total_frames_processed: u32,
    #[serde(default)]
    pub duration_processed: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTankInfo {
    pub bbox: RawTankBox,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawTankBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub center_x: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDetectionParams {
    #[serde(default)]
    pub hertz: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawKeyframe {
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub left_detections: Vec<RawDetection>,
    #[serde(default)]
    pub right_detections: Vec<RawDetection>,
    #[serde(default)]
    pub has_left_octopus: Option<bool>,
    #[serde(default)]
    pub has_right_octopus: Option<bool>,
}

/// Detection box in normalized coordinates
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawDetection {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    #[serde(default)]
    pub confidence: f64,
}
