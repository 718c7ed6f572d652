//! Detection data model
//!
//! Everything here is plain data built once per loaded video. The analyzers
//! only ever read it.

mod detection;
mod geometry;
mod recording;
mod store;

pub use detection::{Detection, KeyframeRecord, PerSide, Side};
pub use geometry::{BoundingBox, TankGeometry, VideoMetadata};
pub use recording::{Recording, DEFAULT_HERTZ};
pub use store::{DetectionIndex, DetectionStore, KeyframeMap};
