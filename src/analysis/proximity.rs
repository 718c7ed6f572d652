//! Proximity to the dividing boundary and to the tank floor

use super::interpolation::Interpolator;
use super::traits::SignalAnalyzer;
use crate::model::{BoundingBox, PerSide, Recording, Side, TankGeometry};
use crate::session::config::{AnalysisConfig, ProximityMetric};
use serde::Serialize;

/// Dense two-channel proximity signal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximitySignal {
    /// 1 at the boundary line, 0 at (or beyond) the outer wall
    pub proximity: PerSide<Vec<f64>>,

    /// 1 at the tank floor, 0 at the top
    pub verticality: PerSide<Vec<f64>>,

    pub metric: ProximityMetric,

    pub sensitivity: f64,
}

/// Computes [`ProximitySignal`] at every frame
#[derive(Debug, Clone)]
pub struct ProximityAnalyzer {
    metric: ProximityMetric,
    sensitivity: f64,
    max_gap_secs: f64,
}

impl ProximityAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            metric: config.proximity_metric,
            sensitivity: config.proximity_sensitivity,
            max_gap_secs: config.max_interpolation_gap_secs,
        }
    }

    /// Horizontal channel for a pixel-space box
    pub fn horizontal(&self, bbox: &BoundingBox, tank: &TankGeometry, side: Side) -> f64 {
        let (cx, _) = bbox.center();
        let (wall_distance, distance) = match (side, self.metric) {
            (Side::Left, ProximityMetric::Edge) => {
                (tank.center_x - tank.x_min, tank.center_x - bbox.x_max)
            }
            (Side::Left, ProximityMetric::Centroid) => {
                (tank.center_x - tank.x_min, tank.center_x - cx)
            }
            (Side::Right, ProximityMetric::Edge) => {
                (tank.x_max - tank.center_x, bbox.x_min - tank.center_x)
            }
            (Side::Right, ProximityMetric::Centroid) => {
                (tank.x_max - tank.center_x, cx - tank.center_x)
            }
        };

        if wall_distance <= 0.0 {
            return 0.0;
        }
        (1.0 - distance / wall_distance).clamp(0.0, 1.0)
    }

    /// Vertical channel for a pixel-space box
    pub fn vertical(&self, bbox: &BoundingBox, tank: &TankGeometry) -> f64 {
        let height = tank.height();
        if height <= 0.0 {
            return 0.0;
        }

        let y = match self.metric {
            ProximityMetric::Edge => bbox.y_max,
            ProximityMetric::Centroid => bbox.center().1,
        };
        let distance_to_floor = (tank.y_max - y) / height;
        (1.0 - distance_to_floor).clamp(0.0, 1.0)
    }
}

impl SignalAnalyzer for ProximityAnalyzer {
    type Output = ProximitySignal;

    fn name(&self) -> &'static str {
        "proximity"
    }

    fn analyze(&self, recording: &Recording) -> ProximitySignal {
        let interp = Interpolator::for_recording(recording, self.max_gap_secs);
        let total = recording.total_frames() as usize;
        let tank = &recording.tank;

        let mut proximity = PerSide::new(vec![0.0; total], vec![0.0; total]);
        let mut verticality = PerSide::new(vec![0.0; total], vec![0.0; total]);

        for side in Side::BOTH {
            let horizontal = proximity.get_mut(side);
            let vertical = verticality.get_mut(side);
            for frame in 0..recording.total_frames() {
                let Some(bbox) = interp.box_at(frame, side) else {
                    continue;
                };
                let px = bbox.to_pixels(&recording.video);
                horizontal[frame as usize] = self.horizontal(&px, tank, side);
                vertical[frame as usize] = self.vertical(&px, tank);
            }
        }

        ProximitySignal {
            proximity,
            verticality,
            metric: self.metric,
            sensitivity: self.sensitivity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tank() -> TankGeometry {
        TankGeometry {
            x_min: 0.0,
            y_min: 0.0,
            x_max: 200.0,
            y_max: 100.0,
            center_x: 100.0,
        }
    }

    #[test]
    fn test_edge_metric_uses_facing_edge() {
        let analyzer = ProximityAnalyzer::new(&AnalysisConfig::new());
        let tank = tank();

        // left box touching the boundary
        let at_boundary = BoundingBox::new(80.0, 10.0, 100.0, 30.0);
        assert!((analyzer.horizontal(&at_boundary, &tank, Side::Left) - 1.0).abs() < 1e-12);

        // left box halfway: right edge at 50 of a 100px half
        let halfway = BoundingBox::new(30.0, 10.0, 50.0, 30.0);
        assert!((analyzer.horizontal(&halfway, &tank, Side::Left) - 0.5).abs() < 1e-12);

        // right box's left edge 25px from the boundary
        let right = BoundingBox::new(125.0, 10.0, 150.0, 30.0);
        assert!((analyzer.horizontal(&right, &tank, Side::Right) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_metric_and_clamping() {
        let analyzer = ProximityAnalyzer::new(
            &AnalysisConfig::new().with_proximity_metric(ProximityMetric::Centroid),
        );
        let tank = tank();
        let bbox = BoundingBox::new(40.0, 80.0, 60.0, 100.0);
        assert!((analyzer.horizontal(&bbox, &tank, Side::Left) - 0.5).abs() < 1e-12);
        assert!((analyzer.vertical(&bbox, &tank) - 0.9).abs() < 1e-12);

        // crossing the boundary clamps to 1
        let crossing = BoundingBox::new(100.0, 0.0, 140.0, 10.0);
        assert_eq!(analyzer.horizontal(&crossing, &tank, Side::Left), 1.0);
    }

    #[test]
    fn test_bottom_edge_on_floor() {
        let analyzer = ProximityAnalyzer::new(&AnalysisConfig::new());
        let on_floor = BoundingBox::new(10.0, 70.0, 30.0, 100.0);
        assert_eq!(analyzer.vertical(&on_floor, &tank()), 1.0);
        let near_top = BoundingBox::new(10.0, 0.0, 30.0, 0.0);
        assert_eq!(analyzer.vertical(&near_top, &tank()), 0.0);
    }

    #[test]
    fn test_degenerate_tank_gives_zero() {
        let analyzer = ProximityAnalyzer::new(&AnalysisConfig::new());
        let flat = TankGeometry {
            x_min: 100.0,
            y_min: 50.0,
            x_max: 200.0,
            y_max: 50.0,
            center_x: 100.0,
        };
        let bbox = BoundingBox::new(100.0, 50.0, 100.0, 50.0);
        assert_eq!(analyzer.horizontal(&bbox, &flat, Side::Left), 0.0);
        assert_eq!(analyzer.vertical(&bbox, &flat), 0.0);
    }
}
