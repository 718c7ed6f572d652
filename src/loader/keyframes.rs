//! Conversion of raw keyframes into the detection model

use super::model::{RawDetection, RawKeyframe};
use crate::model::{BoundingBox, Detection, KeyframeMap, KeyframeRecord, Side};
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;

/// Parse every keyframe, rejecting bad frame keys and inverted boxes
pub fn convert_keyframes(
    raw: &BTreeMap<String, RawKeyframe>,
    total_frames: u32,
    fps: f64,
) -> Result<KeyframeMap> {
    if raw.is_empty() {
        bail!("Keyframe map is empty: at least one keyframe is required");
    }

    let mut keyframes = KeyframeMap::new();
    for (key, keyframe) in raw {
        let frame: u32 = key
            .trim()
            .parse()
            .with_context(|| format!("Keyframe key '{}' is not a frame index", key))?;

        if frame >= total_frames {
            log::warn!(
                "Keyframe {} lies beyond the last processed frame ({})",
                frame,
                total_frames.saturating_sub(1)
            );
        }

        if let Some(timestamp) = keyframe.timestamp {
            if (timestamp * fps - frame as f64).abs() > 0.5 {
                log::warn!(
                    "Keyframe {} timestamp {:.3}s does not match its frame index at {:.2} fps",
                    frame,
                    timestamp,
                    fps
                );
            }
        }
        check_presence_flag(frame, Side::Left, keyframe.has_left_octopus, &keyframe.left_detections);
        check_presence_flag(frame, Side::Right, keyframe.has_right_octopus, &keyframe.right_detections);

        let record = KeyframeRecord {
            left_detections: convert_detections(&keyframe.left_detections, frame, Side::Left)?,
            right_detections: convert_detections(&keyframe.right_detections, frame, Side::Right)?,
        };

        if keyframes.insert(frame, record).is_some() {
            log::warn!("Duplicate keyframe {} (key '{}'), keeping the last one", frame, key);
        }
    }

    Ok(keyframes)
}

fn check_presence_flag(frame: u32, side: Side, flag: Option<bool>, detections: &[RawDetection]) {
    if let Some(flag) = flag {
        if flag != !detections.is_empty() {
            log::warn!(
                "Keyframe {} {} presence flag is {} but it has {} detections",
                frame,
                side,
                flag,
                detections.len()
            );
        }
    }
}

fn convert_detections(raw: &[RawDetection], frame: u32, side: Side) -> Result<Vec<Detection>> {
    raw.iter()
        .enumerate()
        .map(|(i, det)| {
            let bbox = BoundingBox::new(det.x_min, det.y_min, det.x_max, det.y_max);
            if !bbox.is_valid() {
                bail!(
                    "Inverted {} detection #{} at keyframe {}: ({}, {}) - ({}, {})",
                    side,
                    i,
                    frame,
                    det.x_min,
                    det.y_min,
                    det.x_max,
                    det.y_max
                );
            }
            Ok(Detection {
                bbox,
                confidence: det.confidence,
            })
        })
        .collect()
}
