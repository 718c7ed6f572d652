//! Keyframe JSON loading
//!
//! Reads the detection producer's keyframe document, validates the fields the
//! analyzers rely on and builds an immutable [`Recording`].

mod keyframes;
mod model;
mod preprocess;

pub use preprocess::reduce_to_single_detections;

use crate::model::{DetectionStore, Recording, TankGeometry, VideoMetadata, DEFAULT_HERTZ};
use anyhow::{bail, Context, Result};
use model::RawDocument;
use std::fs;
use std::path::Path;

/// Load a keyframe JSON file
///
/// # Arguments
/// * `path` - Path to the keyframe document
/// * `preprocess` - Reduce multi-detection keyframes to their best match
pub fn load_recording(path: &Path, preprocess: bool) -> Result<Recording> {
    log::info!("Loading keyframes from {:?}", path);
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read keyframe file: {:?}", path))?;

    parse_recording(&text, preprocess).with_context(|| format!("Invalid keyframe file: {:?}", path))
}

/// Parse a keyframe JSON document already in memory
pub fn parse_recording(text: &str, preprocess: bool) -> Result<Recording> {
    let raw: RawDocument =
        serde_json::from_str(text).context("Failed to parse keyframe JSON")?;

    let info = &raw.video_info;
    if !(info.fps.is_finite() && info.fps > 0.0) {
        bail!("video_info.fps must be positive, got {}", info.fps);
    }
    if !(info.width > 0.0 && info.height > 0.0) {
        bail!(
            "video_info dimensions must be positive, got {}x{}",
            info.width,
            info.height
        );
    }
    if info.total_frames_processed == 0 {
        bail!("video_info.total_frames_processed must be positive");
    }

    let tank_box = raw.tank_info.bbox;
    if tank_box.x_min > tank_box.x_max || tank_box.y_min > tank_box.y_max {
        bail!("tank_info.bbox is inverted: {:?}", tank_box);
    }
    if !(tank_box.x_min..=tank_box.x_max).contains(&tank_box.center_x) {
        log::warn!(
            "Tank center_x {} lies outside the tank [{}, {}]",
            tank_box.center_x,
            tank_box.x_min,
            tank_box.x_max
        );
    }

    let hertz = match raw.detection_params.hertz {
        Some(h) if h.is_finite() && h > 0.0 => h,
        Some(h) => bail!("detection_params.hertz must be positive, got {}", h),
        None => DEFAULT_HERTZ,
    };

    let mut keyframes =
        keyframes::convert_keyframes(&raw.keyframes, info.total_frames_processed, info.fps)?;
    if preprocess {
        reduce_to_single_detections(&mut keyframes);
    }

    let video = VideoMetadata {
        width: info.width,
        height: info.height,
        fps: info.fps,
        total_frames: info.total_frames_processed,
    };
    let tank = TankGeometry {
        x_min: tank_box.x_min,
        y_min: tank_box.y_min,
        x_max: tank_box.x_max,
        y_max: tank_box.y_max,
        center_x: tank_box.center_x,
    };

    let mut recording =
        Recording::new(video, tank, DetectionStore::new(keyframes)).with_hertz(hertz);
    if let Some(filename) = &info.filename {
        recording = recording.with_filename(filename.clone());
    }

    log::info!(
        "Parsed {} keyframes ({:.1}s of video at {:.2} fps, {} Hz detections)",
        recording.store.keyframe_count(),
        video.duration_secs(),
        video.fps,
        hertz
    );
    if let Some(duration) = info.duration_processed {
        log::debug!("Producer reports {:.1}s processed", duration);
    }
    if let Some(stats) = &raw.processing_stats {
        log::debug!("Producer processing stats: {}", stats);
    }

    Ok(recording)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Side;

    const DOCUMENT: &str = r#"{
        "video_info": {"filename": "MVI_0001.MP4", "fps": 30, "width": 640, "height": 480,
                       "duration_processed": 2.0, "total_frames_processed": 60},
        "tank_info": {"bbox": {"x_min": 32, "y_min": 24, "x_max": 608, "y_max": 456, "center_x": 320}},
        "detection_params": {"object": "octopus", "hertz": 2, "model": "best.pt"},
        "keyframes": {
            "0": {"timestamp": 0.0, "has_left_octopus": true, "has_right_octopus": false,
                  "left_detections": [{"x_min": 0.1, "y_min": 0.2, "x_max": 0.2, "y_max": 0.3, "confidence": 0.9}],
                  "right_detections": []},
            "15": {"timestamp": 0.5,
                   "left_detections": [{"x_min": 0.4, "y_min": 0.2, "x_max": 0.45, "y_max": 0.3, "confidence": 0.7},
                                       {"x_min": 0.11, "y_min": 0.2, "x_max": 0.21, "y_max": 0.3, "confidence": 0.6}],
                   "right_detections": [{"x_min": 0.6, "y_min": 0.5, "x_max": 0.7, "y_max": 0.6, "confidence": 0.8}]}
        },
        "processing_stats": {"total_keyframes": 2}
    }"#;

    #[test]
    fn test_parse_recording() {
        let recording = parse_recording(DOCUMENT, false).unwrap();

        assert_eq!(recording.filename.as_deref(), Some("MVI_0001.MP4"));
        assert_eq!(recording.total_frames(), 60);
        assert!((recording.fps() - 30.0).abs() < 1e-12);
        assert!((recording.tank.center_x - 320.0).abs() < 1e-12);
        assert!((recording.hertz - 2.0).abs() < 1e-12);
        assert_eq!(recording.store.keyframe_count(), 2);
        assert_eq!(recording.store.index(Side::Right).frames(), &[15]);
        assert_eq!(recording.store.keyframe(15).unwrap().left_detections.len(), 2);
    }

    #[test]
    fn test_parse_with_preprocessing() {
        let recording = parse_recording(DOCUMENT, true).unwrap();
        let left = &recording.store.keyframe(15).unwrap().left_detections;
        assert_eq!(left.len(), 1);
        assert!((left[0].bbox.x_min - 0.11).abs() < 1e-12);
    }

    #[test]
    fn test_hertz_defaults_when_missing() {
        let doc = DOCUMENT.replace(r#""hertz": 2,"#, "");
        let recording = parse_recording(&doc, false).unwrap();
        assert!((recording.hertz - DEFAULT_HERTZ).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_invalid_documents() {
        assert!(parse_recording("not json", false).is_err());
        assert!(parse_recording(&DOCUMENT.replace(r#""fps": 30"#, r#""fps": 0"#), false).is_err());
        assert!(parse_recording(
            &DOCUMENT.replace(r#""total_frames_processed": 60"#, r#""total_frames_processed": 0"#),
            false
        )
        .is_err());
        let err = parse_recording(&DOCUMENT.replace(r#""15":"#, r#""x15":"#), false).unwrap_err();
        assert!(format!("{:#}", err).contains("x15"));
    }
}
