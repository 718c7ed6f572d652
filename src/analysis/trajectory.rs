//! Fixed-rate centroid trajectories

use super::interpolation::Interpolator;
use super::traits::SignalAnalyzer;
use crate::model::{PerSide, Recording, Side};
use crate::session::config::AnalysisConfig;
use serde::Serialize;

/// One sampled centroid, in normalized coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub frame: u32,
    pub x: f64,
    pub y: f64,
    /// `frame / total_frames`
    pub progress: f64,
}

/// Summary of one side's path
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TrajectoryStats {
    pub point_count: usize,

    /// Sum of centroid steps, in pixels
    pub path_length_px: f64,

    /// Mean speed between consecutive samples, in pixels per second
    pub mean_speed_px_per_sec: f64,

    pub first_frame: Option<u32>,
    pub last_frame: Option<u32>,
}

impl TrajectoryStats {
    pub fn from_points(points: &[TrajectoryPoint], recording: &Recording) -> Self {
        let video = &recording.video;
        let mut path_length_px = 0.0;
        let mut elapsed_frames = 0u32;

        for pair in points.windows(2) {
            let dx = (pair[1].x - pair[0].x) * video.width;
            let dy = (pair[1].y - pair[0].y) * video.height;
            path_length_px += (dx * dx + dy * dy).sqrt();
            elapsed_frames += pair[1].frame - pair[0].frame;
        }

        let elapsed_secs = elapsed_frames as f64 / video.fps;
        let mean_speed_px_per_sec = if elapsed_secs > 0.0 {
            path_length_px / elapsed_secs
        } else {
            0.0
        };

        Self {
            point_count: points.len(),
            path_length_px,
            mean_speed_px_per_sec,
            first_frame: points.first().map(|p| p.frame),
            last_frame: points.last().map(|p| p.frame),
        }
    }
}

/// Ordered trajectory points and their statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectories {
    pub points: PerSide<Vec<TrajectoryPoint>>,
    pub stats: PerSide<TrajectoryStats>,
    /// Frames between samples
    pub stride: u32,
}

/// Samples each side's centroid at the detection rate
#[derive(Debug, Clone)]
pub struct TrajectoryCalculator {
    hertz: Option<f64>,
    max_gap_secs: f64,
}

impl TrajectoryCalculator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            hertz: config.hertz,
            max_gap_secs: config.max_interpolation_gap_secs,
        }
    }

    pub fn stride(&self, recording: &Recording) -> u32 {
        let hertz = self.hertz.unwrap_or(recording.hertz);
        ((recording.fps() / hertz).floor() as u32).max(1)
    }
}

impl SignalAnalyzer for TrajectoryCalculator {
    type Output = Trajectories;

    fn name(&self) -> &'static str {
        "trajectory"
    }

    fn analyze(&self, recording: &Recording) -> Trajectories {
        let interp = Interpolator::for_recording(recording, self.max_gap_secs);
        let stride = self.stride(recording);
        let total = recording.total_frames();

        let points = PerSide::from_fn(|side: Side| {
            (0..total)
                .step_by(stride as usize)
                .filter_map(|frame| {
                    let (x, y) = interp.box_at(frame, side)?.center();
                    Some(TrajectoryPoint {
                        frame,
                        x,
                        y,
                        progress: frame as f64 / total as f64,
                    })
                })
                .collect::<Vec<_>>()
        });

        let stats = PerSide::new(
            TrajectoryStats::from_points(&points.left, recording),
            TrajectoryStats::from_points(&points.right, recording),
        );

        Trajectories {
            points,
            stats,
            stride,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BoundingBox, Detection, DetectionStore, KeyframeMap, KeyframeRecord, TankGeometry,
        VideoMetadata,
    };

    fn recording() -> Recording {
        let mut keyframes = KeyframeMap::new();
        let boxes = [
            (0, BoundingBox::new(0.0, 0.0, 0.2, 0.2)),
            (30, BoundingBox::new(0.3, 0.4, 0.5, 0.6)),
        ];
        for (frame, bbox) in boxes {
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
                fps: 30.0,
                total_frames: 60,
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
        .with_hertz(2.0)
    }

    #[test]
    fn test_points_skip_absent_frames() {
        let rec = recording();
        let trajectories = TrajectoryCalculator::new(&AnalysisConfig::new()).analyze(&rec);

        assert_eq!(trajectories.stride, 15);
        let frames: Vec<u32> = trajectories.points.left.iter().map(|p| p.frame).collect();
        // frame 45 lies after the last keyframe
        assert_eq!(frames, vec![0, 15, 30]);
        assert!(trajectories.points.right.is_empty());

        let mid = trajectories.points.left[1];
        assert!((mid.x - 0.25).abs() < 1e-12);
        assert!((mid.progress - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_stats() {
        let rec = recording();
        let trajectories = TrajectoryCalculator::new(&AnalysisConfig::new()).analyze(&rec);
        let stats = trajectories.stats.left;

        // (10,10) -> (40,50) is 50px over one second
        assert_eq!(stats.point_count, 3);
        assert!((stats.path_length_px - 50.0).abs() < 1e-9);
        assert!((stats.mean_speed_px_per_sec - 50.0).abs() < 1e-9);
        assert_eq!(stats.first_frame, Some(0));
        assert_eq!(stats.last_frame, Some(30));
        assert_eq!(trajectories.stats.right, TrajectoryStats::default());
    }

    #[test]
    fn test_hertz_override() {
        let rec = recording();
        let calc = TrajectoryCalculator::new(&AnalysisConfig::new().with_hertz(60.0));
        assert_eq!(calc.stride(&rec), 1);
    }
}
