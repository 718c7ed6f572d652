use super::BoundingBox;
use serde::{Deserialize, Serialize};

/// Which half of the enclosure a subject lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn name(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value held once per side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub left: T,
    pub right: T,
}

impl<T> PerSide<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Build both sides from the same constructor
    pub fn from_fn(mut f: impl FnMut(Side) -> T) -> Self {
        Self {
            left: f(Side::Left),
            right: f(Side::Right),
        }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// A single detector hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Normalized bounding box
    pub bbox: BoundingBox,

    /// Detector confidence score
    pub confidence: f64,
}

/// Detections recorded at one keyframe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeRecord {
    pub left_detections: Vec<Detection>,
    pub right_detections: Vec<Detection>,
}

impl KeyframeRecord {
    pub fn detections(&self, side: Side) -> &[Detection] {
        match side {
            Side::Left => &self.left_detections,
            Side::Right => &self.right_detections,
        }
    }

    pub fn detections_mut(&mut self, side: Side) -> &mut Vec<Detection> {
        match side {
            Side::Left => &mut self.left_detections,
            Side::Right => &mut self.right_detections,
        }
    }

    /// Whether this keyframe has at least one detection for `side`
    pub fn has_detections(&self, side: Side) -> bool {
        !self.detections(side).is_empty()
    }

    /// Componentwise min/max over all detections for `side`
    pub fn union_box(&self, side: Side) -> Option<BoundingBox> {
        let mut detections = self.detections(side).iter();
        let first = detections.next()?.bbox;
        Some(detections.fold(first, |acc, d| acc.union(&d.bbox)))
    }
}
