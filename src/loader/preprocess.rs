//! Reduction of multi-detection keyframes to a single detection
//!
//! For each side, keyframes are walked in frame order while remembering the
//! latest keyframe that had exactly one detection. A later keyframe with
//! several detections keeps only the one overlapping that reference most.

use crate::model::{Detection, KeyframeMap, Side};

/// Returns the number of keyframes that were reduced
pub fn reduce_to_single_detections(keyframes: &mut KeyframeMap) -> usize {
    let mut reduced = 0;

    for side in Side::BOTH {
        let mut reference: Option<Detection> = None;

        for record in keyframes.values_mut() {
            let detections = record.detections_mut(side);
            match detections.len() {
                0 => {}
                1 => reference = Some(detections[0]),
                _ => {
                    let Some(reference) = reference else {
                        continue;
                    };
                    if let Some(best) = best_match(&reference, detections) {
                        *detections = vec![best];
                        reduced += 1;
                    }
                }
            }
        }
    }

    if reduced > 0 {
        log::info!("Preprocessing reduced {} keyframe detection lists", reduced);
    }
    reduced
}

/// Highest IoU against `reference`; the earliest candidate wins ties
fn best_match(reference: &Detection, candidates: &[Detection]) -> Option<Detection> {
    let mut best: Option<(f64, Detection)> = None;
    for candidate in candidates {
        let iou = reference.bbox.iou(&candidate.bbox);
        if best.map_or(true, |(best_iou, _)| iou > best_iou) {
            best = Some((iou, *candidate));
        }
    }
    best.map(|(_, det)| det)
}
