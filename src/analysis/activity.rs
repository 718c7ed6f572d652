//! Movement intensity between observed keyframes
//!
//! Evaluating activity at every frame is expensive, so the dense signal is
//! built from a sparse sample set:
//! 1. Sample at half the mean keyframe spacing, offset by a quarter spacing
//! 2. Linearly interpolate between samples to fill every frame

use super::interpolation::Interpolator;
use super::traits::SignalAnalyzer;
use crate::model::{PerSide, Recording, Side};
use crate::session::config::{ActivityMetric, AnalysisConfig};
use serde::Serialize;

/// Dense activity buffers plus the maxima used for later normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySignal {
    /// One value per frame, per side
    pub values: PerSide<Vec<f64>>,

    /// Largest sparse sample, per side
    pub max: PerSide<f64>,

    pub metric: ActivityMetric,

    pub sensitivity: f64,

    /// Frames at which `activity` was actually evaluated
    pub sample_frames: Vec<u32>,
}

impl ActivitySignal {
    /// Value at `frame` scaled by the side's maximum, 0 when the maximum is 0
    pub fn normalized(&self, side: Side, frame: u32) -> f64 {
        let max = *self.max.get(side);
        match self.values.get(side).get(frame as usize) {
            Some(&value) if max > 0.0 => value / max,
            _ => 0.0,
        }
    }
}

/// Computes [`ActivitySignal`] for a recording
#[derive(Debug, Clone)]
pub struct ActivityAnalyzer {
    metric: ActivityMetric,
    sensitivity: f64,
    max_gap_secs: f64,
    hertz: Option<f64>,
}

impl ActivityAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            metric: config.activity_metric,
            sensitivity: config.activity_sensitivity,
            max_gap_secs: config.max_interpolation_gap_secs,
            hertz: config.hertz,
        }
    }

    /// Difference between the observed boxes bracketing `frame`
    ///
    /// 0 when either neighbor is missing or the keyframes are too far apart.
    pub fn activity(&self, recording: &Recording, frame: u32, side: Side) -> f64 {
        let interp = Interpolator::for_recording(recording, self.max_gap_secs);
        self.activity_with(&interp, recording, frame, side)
    }

    fn activity_with(
        &self,
        interp: &Interpolator<'_>,
        recording: &Recording,
        frame: u32,
        side: Side,
    ) -> f64 {
        let store = &recording.store;
        let (prev, next) = store.index(side).neighbors(frame);
        let (Some(prev), Some(next)) = (prev, next) else {
            return 0.0;
        };
        if !interp.within_gap(prev, next) {
            return 0.0;
        }

        let (Some(prev_box), Some(next_box)) =
            (store.union_box(prev, side), store.union_box(next, side))
        else {
            return 0.0;
        };

        let prev_px = prev_box.to_pixels(&recording.video);
        let next_px = next_box.to_pixels(&recording.video);

        match self.metric {
            ActivityMetric::Iou => 1.0 - prev_px.iou(&next_px),
            ActivityMetric::Centroid => prev_px.centroid_distance(&next_px),
        }
    }

    /// Frames at which activity is evaluated before densification
    ///
    /// Without two keyframes to measure, the spacing falls back to one
    /// detection period at the configured (or recorded) rate.
    fn sample_frames(&self, recording: &Recording) -> Vec<u32> {
        let hertz = self.hertz.unwrap_or(recording.hertz);
        let spacing = recording
            .store
            .mean_keyframe_spacing()
            .unwrap_or_else(|| recording.fps() / hertz);

        let stride = ((spacing / 2.0).floor() as u32).max(1);
        let offset = (spacing / 4.0).floor() as u32;

        (offset..recording.total_frames())
            .step_by(stride as usize)
            .collect()
    }
}

impl SignalAnalyzer for ActivityAnalyzer {
    type Output = ActivitySignal;

    fn name(&self) -> &'static str {
        "activity"
    }

    fn analyze(&self, recording: &Recording) -> ActivitySignal {
        let interp = Interpolator::for_recording(recording, self.max_gap_secs);
        let sample_frames = self.sample_frames(recording);
        let total = recording.total_frames() as usize;

        let mut max = PerSide::new(0.0f64, 0.0f64);
        let values = PerSide::from_fn(|side| {
            let samples: Vec<(u32, f64)> = sample_frames
                .iter()
                .map(|&frame| (frame, self.activity_with(&interp, recording, frame, side)))
                .collect();

            let side_max = max.get_mut(side);
            for &(_, value) in &samples {
                *side_max = side_max.max(value);
            }

            densify(&samples, total)
        });

        log::debug!(
            "Activity ({:?}): {} samples, max left={:.3} right={:.3}",
            self.metric,
            sample_frames.len(),
            max.left,
            max.right
        );

        ActivitySignal {
            values,
            max,
            metric: self.metric,
            sensitivity: self.sensitivity,
            sample_frames,
        }
    }
}

/// Fill every frame from ascending sparse samples
///
/// Frames before the first sample or after the last take the nearest
/// sample's value. No samples at all gives a zero buffer.
fn densify(samples: &[(u32, f64)], total: usize) -> Vec<f64> {
    let mut dense = vec![0.0; total];
    let (Some(&(first_frame, first_value)), Some(&(last_frame, last_value))) =
        (samples.first(), samples.last())
    else {
        return dense;
    };

    for slot in dense.iter_mut().take(first_frame as usize) {
        *slot = first_value;
    }

    for pair in samples.windows(2) {
        let (f0, v0) = pair[0];
        let (f1, v1) = pair[1];
        let span = (f1 - f0) as f64;
        for frame in f0..f1 {
            if let Some(slot) = dense.get_mut(frame as usize) {
                *slot = v0 + (v1 - v0) * ((frame - f0) as f64 / span);
            }
        }
    }

    for slot in dense.iter_mut().skip(last_frame as usize) {
        *slot = last_value;
    }

    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BoundingBox, Detection, DetectionStore, KeyframeMap, KeyframeRecord, TankGeometry,
        VideoMetadata,
    };

    fn recording(boxes: &[(u32, BoundingBox)], total_frames: u32) -> Recording {
        let mut keyframes = KeyframeMap::new();
        for &(frame, bbox) in boxes {
            keyframes.insert(
                frame,
                KeyframeRecord {
                    left_detections: vec![Detection {
                        bbox,
                        confidence: 1.0,
                    }],
                    right_detections: vec![],
                },
            );
        }
        Recording::new(
            VideoMetadata {
                width: 100.0,
                height: 100.0,
                fps: 10.0,
                total_frames,
            },
            TankGeometry {
                x_min: 0.0,
                y_min: 0.0,
                x_max: 100.0,
                y_max: 100.0,
                center_x: 50.0,
            },
            DetectionStore::new(keyframes),
        )
    }

    #[test]
    fn test_densify_interpolates_and_holds_edges() {
        let dense = densify(&[(2, 1.0), (6, 3.0)], 9);
        assert_eq!(dense, vec![1.0, 1.0, 1.0, 1.5, 2.0, 2.5, 3.0, 3.0, 3.0]);
        assert_eq!(densify(&[], 3), vec![0.0; 3]);
    }

    #[test]
    fn test_centroid_activity_in_pixels() {
        let rec = recording(
            &[
                (0, BoundingBox::new(0.0, 0.0, 0.2, 0.2)),
                (10, BoundingBox::new(0.3, 0.4, 0.5, 0.6)),
            ],
            20,
        );
        let analyzer = ActivityAnalyzer::new(
            &AnalysisConfig::new().with_activity_metric(ActivityMetric::Centroid),
        );

        // centroids (10,10) -> (40,50): distance 50px
        assert!((analyzer.activity(&rec, 5, Side::Left) - 50.0).abs() < 1e-9);
        // no keyframe after frame 10
        assert_eq!(analyzer.activity(&rec, 10, Side::Left), 0.0);
        assert_eq!(analyzer.activity(&rec, 5, Side::Right), 0.0);
    }

    #[test]
    fn test_iou_activity_of_stationary_box_is_zero() {
        let bbox = BoundingBox::new(0.1, 0.1, 0.3, 0.3);
        let rec = recording(&[(0, bbox), (10, bbox), (20, bbox)], 30);
        let analyzer = ActivityAnalyzer::new(&AnalysisConfig::new());

        let signal = analyzer.analyze(&rec);
        assert_eq!(signal.values.left.len(), 30);
        assert!(signal.values.left.iter().all(|v| v.abs() < 1e-12));
        assert_eq!(signal.max.left, 0.0);
        assert_eq!(signal.normalized(Side::Left, 3), 0.0);
    }

    #[test]
    fn test_sampling_uses_half_mean_spacing() {
        let bbox = BoundingBox::new(0.1, 0.1, 0.3, 0.3);
        let rec = recording(&[(0, bbox), (8, bbox), (16, bbox)], 20);
        // spacing 8: stride 4, offset 2
        let analyzer = ActivityAnalyzer::new(&AnalysisConfig::new());
        assert_eq!(analyzer.sample_frames(&rec), vec![2, 6, 10, 14, 18]);
    }

    #[test]
    fn test_single_keyframe_spacing_follows_hertz() {
        let bbox = BoundingBox::new(0.1, 0.1, 0.3, 0.3);
        let rec = recording(&[(0, bbox)], 20);

        // recorded 2 Hz at 10fps: spacing 5, stride 2, offset 1
        let recorded = ActivityAnalyzer::new(&AnalysisConfig::new());
        assert_eq!(recorded.sample_frames(&rec), (1..20).step_by(2).collect::<Vec<_>>());

        // 1 Hz override: spacing 10, stride 5, offset 2
        let overridden = ActivityAnalyzer::new(&AnalysisConfig::new().with_hertz(1.0));
        assert_eq!(overridden.sample_frames(&rec), vec![2, 7, 12, 17]);
    }

    #[test]
    fn test_large_gap_gives_zero_activity() {
        let rec = recording(
            &[
                (0, BoundingBox::new(0.0, 0.0, 0.1, 0.1)),
                (200, BoundingBox::new(0.8, 0.8, 0.9, 0.9)),
            ],
            300,
        );
        let analyzer = ActivityAnalyzer::new(&AnalysisConfig::new().with_max_gap(5.0));
        assert_eq!(analyzer.activity(&rec, 100, Side::Left), 0.0);
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let rec = recording(
            &[
                (0, BoundingBox::new(0.0, 0.0, 0.2, 0.2)),
                (10, BoundingBox::new(0.1, 0.0, 0.3, 0.2)),
                (20, BoundingBox::new(0.4, 0.3, 0.6, 0.5)),
            ],
            30,
        );
        let analyzer = ActivityAnalyzer::new(&AnalysisConfig::new());
        let first = analyzer.analyze(&rec);
        assert_eq!(first, analyzer.analyze(&rec));
        assert!(first.max.left > 0.0);
        assert!(first.values.left.iter().all(|v| *v <= first.max.left + 1e-12));
    }
}
