use super::{DetectionStore, TankGeometry, VideoMetadata};

/// Default detection/trajectory sampling rate when the input omits it
pub const DEFAULT_HERTZ: f64 = 2.0;

/// Immutable snapshot of one loaded video and its detections
#[derive(Debug, Clone)]
pub struct Recording {
    /// Source video name, informational only
    pub filename: Option<String>,

    pub video: VideoMetadata,

    pub tank: TankGeometry,

    /// Detection sampling rate the keyframes were produced at
    pub hertz: f64,

    pub store: DetectionStore,
}

impl Recording {
    pub fn new(video: VideoMetadata, tank: TankGeometry, store: DetectionStore) -> Self {
        Self {
            filename: None,
            video,
            tank,
            hertz: DEFAULT_HERTZ,
            store,
        }
    }

    pub fn with_hertz(mut self, hertz: f64) -> Self {
        self.hertz = hertz;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Same video and tank, different detections
    pub fn with_store(&self, store: DetectionStore) -> Self {
        Self {
            filename: self.filename.clone(),
            video: self.video,
            tank: self.tank,
            hertz: self.hertz,
            store,
        }
    }

    pub fn total_frames(&self) -> u32 {
        self.video.total_frames
    }

    pub fn fps(&self) -> f64 {
        self.video.fps
    }
}
