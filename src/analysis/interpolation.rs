//! Box lookup with bounded linear interpolation between keyframes

use crate::model::{BoundingBox, DetectionStore, Recording, Side};

/// Resolves the box of a side at any frame
///
/// Holds only borrowed, immutable state so every analyzer can share one.
#[derive(Debug, Clone, Copy)]
pub struct Interpolator<'a> {
    store: &'a DetectionStore,
    /// Longest bridgeable keyframe gap, in frames
    max_gap_frames: f64,
}

impl<'a> Interpolator<'a> {
    pub fn new(store: &'a DetectionStore, fps: f64, max_gap_secs: f64) -> Self {
        Self {
            store,
            max_gap_frames: fps * max_gap_secs,
        }
    }

    pub fn for_recording(recording: &'a Recording, max_gap_secs: f64) -> Self {
        Self::new(&recording.store, recording.fps(), max_gap_secs)
    }

    /// Whether two keyframes are close enough to bridge
    pub fn within_gap(&self, prev: u32, next: u32) -> bool {
        (next - prev) as f64 <= self.max_gap_frames
    }

    /// Observed or interpolated box for `side` at `frame`, None when absent
    pub fn box_at(&self, frame: u32, side: Side) -> Option<BoundingBox> {
        if let Some(observed) = self.store.union_box(frame, side) {
            return Some(observed);
        }

        // frame is not indexed here, so prev < frame < next
        let (prev, next) = self.store.index(side).neighbors(frame);
        let (prev, next) = (prev?, next?);
        if !self.within_gap(prev, next) {
            return None;
        }

        let prev_box = self.store.union_box(prev, side)?;
        let next_box = self.store.union_box(next, side)?;

        let t = (frame - prev) as f64 / (next - prev) as f64;
        Some(prev_box.lerp(&next_box, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Detection, KeyframeMap, KeyframeRecord};

    fn store_with(boxes: &[(u32, BoundingBox)]) -> DetectionStore {
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
        DetectionStore::new(keyframes)
    }

    fn assert_box_eq(actual: BoundingBox, expected: BoundingBox) {
        for (a, e) in [
            (actual.x_min, expected.x_min),
            (actual.y_min, expected.y_min),
            (actual.x_max, expected.x_max),
            (actual.y_max, expected.y_max),
        ] {
            assert!((a - e).abs() < 1e-12, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_keyframes_return_observed_boxes() {
        let a = BoundingBox::new(0.1, 0.1, 0.2, 0.2);
        let b = BoundingBox::new(0.3, 0.3, 0.4, 0.4);
        let store = store_with(&[(10, a), (20, b)]);
        let interp = Interpolator::new(&store, 30.0, 15.0);

        assert_eq!(interp.box_at(10, Side::Left), Some(a));
        assert_eq!(interp.box_at(20, Side::Left), Some(b));
        assert_box_eq(interp.box_at(15, Side::Left).unwrap(), a.lerp(&b, 0.5));
    }

    #[test]
    fn test_interpolates_between_distant_keyframes() {
        let a = BoundingBox::new(0.0, 0.0, 0.2, 0.2);
        let b = BoundingBox::new(0.5, 0.5, 0.7, 0.7);
        let store = store_with(&[(0, a), (100, b)]);
        let interp = Interpolator::new(&store, 30.0, 15.0);

        assert_box_eq(
            interp.box_at(50, Side::Left).unwrap(),
            BoundingBox::new(0.25, 0.25, 0.45, 0.45),
        );
        assert!(interp.box_at(500, Side::Left).is_none());
        assert!(interp.box_at(50, Side::Right).is_none());
    }

    #[test]
    fn test_gap_beyond_threshold_is_absent() {
        let a = BoundingBox::new(0.0, 0.0, 0.2, 0.2);
        // 451 frames at 30fps is just over 15s
        let store = store_with(&[(0, a), (451, a)]);
        let interp = Interpolator::new(&store, 30.0, 15.0);
        assert!(interp.box_at(200, Side::Left).is_none());

        let store = store_with(&[(0, a), (450, a)]);
        let interp = Interpolator::new(&store, 30.0, 15.0);
        assert!(interp.box_at(200, Side::Left).is_some());
    }

    #[test]
    fn test_boxes_are_always_valid() {
        let store = store_with(&[
            (0, BoundingBox::new(0.0, 0.1, 0.1, 0.3)),
            (7, BoundingBox::new(0.6, 0.0, 0.9, 0.05)),
            (30, BoundingBox::new(0.2, 0.5, 0.2, 0.9)),
        ]);
        let interp = Interpolator::new(&store, 10.0, 15.0);

        for frame in 0..40 {
            if let Some(bbox) = interp.box_at(frame, Side::Left) {
                assert!(bbox.is_valid(), "frame {} gave {:?}", frame, bbox);
            }
        }
    }
}
