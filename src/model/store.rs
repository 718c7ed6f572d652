use super::{BoundingBox, KeyframeRecord, PerSide, Side};
use std::collections::BTreeMap;

/// Frame index -> detections, ordered by frame
pub type KeyframeMap = BTreeMap<u32, KeyframeRecord>;

/// Strictly ascending list of frames that carry detections for one side
///
/// This is the single place where neighbor lookup lives. `previous` is
/// inclusive and `next` is exclusive, so a keyframe's own frame satisfies
/// `previous` but never `next`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionIndex {
    frames: Vec<u32>,
}

impl DetectionIndex {
    /// Build from any iterator of frames; duplicates are collapsed
    pub fn from_frames(frames: impl IntoIterator<Item = u32>) -> Self {
        let mut frames: Vec<u32> = frames.into_iter().collect();
        frames.sort_unstable();
        frames.dedup();
        Self { frames }
    }

    /// Rightmost indexed frame `<= frame`
    pub fn previous(&self, frame: u32) -> Option<u32> {
        let pos = self.frames.partition_point(|&f| f <= frame);
        pos.checked_sub(1).map(|i| self.frames[i])
    }

    /// Leftmost indexed frame `> frame`
    pub fn next(&self, frame: u32) -> Option<u32> {
        let pos = self.frames.partition_point(|&f| f <= frame);
        self.frames.get(pos).copied()
    }

    /// `(previous(frame), next(frame))` from a single search
    pub fn neighbors(&self, frame: u32) -> (Option<u32>, Option<u32>) {
        let pos = self.frames.partition_point(|&f| f <= frame);
        let prev = pos.checked_sub(1).map(|i| self.frames[i]);
        (prev, self.frames.get(pos).copied())
    }

    /// Whether `frame` is a keyframe with detections
    pub fn contains(&self, frame: u32) -> bool {
        self.frames.binary_search(&frame).is_ok()
    }

    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Immutable per-frame detections for both sides plus their indices
#[derive(Debug, Clone, Default)]
pub struct DetectionStore {
    keyframes: KeyframeMap,
    indices: PerSide<DetectionIndex>,
}

impl DetectionStore {
    /// Build the store and derive both detection indices
    pub fn new(keyframes: KeyframeMap) -> Self {
        let indices = PerSide::from_fn(|side| {
            DetectionIndex::from_frames(
                keyframes
                    .iter()
                    .filter(|(_, record)| record.has_detections(side))
                    .map(|(&frame, _)| frame),
            )
        });

        Self { keyframes, indices }
    }

    pub fn keyframe(&self, frame: u32) -> Option<&KeyframeRecord> {
        self.keyframes.get(&frame)
    }

    pub fn keyframes(&self) -> &KeyframeMap {
        &self.keyframes
    }

    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    pub fn index(&self, side: Side) -> &DetectionIndex {
        self.indices.get(side)
    }

    /// Observed union box at `frame`, if the frame has detections for `side`
    pub fn union_box(&self, frame: u32, side: Side) -> Option<BoundingBox> {
        self.keyframes.get(&frame)?.union_box(side)
    }

    /// Mean spacing between consecutive keyframes, None with fewer than two
    pub fn mean_keyframe_spacing(&self) -> Option<f64> {
        let first = *self.keyframes.keys().next()?;
        let last = *self.keyframes.keys().next_back()?;
        let gaps = self.keyframes.len().checked_sub(1).filter(|&n| n > 0)?;
        Some((last - first) as f64 / gaps as f64)
    }
}
