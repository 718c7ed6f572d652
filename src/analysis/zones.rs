//! Fractional zone occupancy
//!
//! Each side's half of the tank is divided into zones:
//! - D: the subject is not visible (den)
//! - MP: the box edge facing the boundary is within a narrow band of it
//! - H1/H2: the half nearer to / farther from the boundary
//! - T/B: the top and bottom halves of the tank
//! - H1T, H1B, H2T, H2B, MPT, MPB: products of their parent fractions
//!
//! A box straddling a zone boundary is split by the share of its extent on
//! each side, so complementary zones always sum to 1.

use super::interpolation::Interpolator;
use super::traits::SignalAnalyzer;
use crate::model::{BoundingBox, PerSide, Recording, Side, TankGeometry};
use crate::session::config::AnalysisConfig;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const ZONE_COUNT: usize = 12;

/// Named region a subject's presence is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Zone {
    Den,
    MirrorPartition,
    MirrorPartitionTop,
    MirrorPartitionBottom,
    Near,
    Far,
    Top,
    Bottom,
    NearTop,
    NearBottom,
    FarTop,
    FarBottom,
}

impl Zone {
    pub const ALL: [Zone; ZONE_COUNT] = [
        Zone::Den,
        Zone::MirrorPartition,
        Zone::MirrorPartitionTop,
        Zone::MirrorPartitionBottom,
        Zone::Near,
        Zone::Far,
        Zone::Top,
        Zone::Bottom,
        Zone::NearTop,
        Zone::NearBottom,
        Zone::FarTop,
        Zone::FarBottom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Zone::Den => "D",
            Zone::MirrorPartition => "MP",
            Zone::MirrorPartitionTop => "MPT",
            Zone::MirrorPartitionBottom => "MPB",
            Zone::Near => "H1",
            Zone::Far => "H2",
            Zone::Top => "T",
            Zone::Bottom => "B",
            Zone::NearTop => "H1T",
            Zone::NearBottom => "H1B",
            Zone::FarTop => "H2T",
            Zone::FarBottom => "H2B",
        }
    }

    pub fn from_label(label: &str) -> Option<Zone> {
        Zone::ALL.into_iter().find(|z| z.label().eq_ignore_ascii_case(label))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Zone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One value per zone
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoneTable([f64; ZONE_COUNT]);

/// Per-frame zone membership of one side, each in [0,1]
pub type ZoneFractions = ZoneTable;

/// Zone occupancy over a whole recording, in percent
pub type ZonePercentages = ZoneTable;

impl ZoneTable {
    pub fn get(&self, zone: Zone) -> f64 {
        self.0[zone.index()]
    }

    pub fn set(&mut self, zone: Zone, value: f64) {
        self.0[zone.index()] = value;
    }

    /// Fractions of a frame with no visible subject
    pub fn den() -> Self {
        let mut table = Self::default();
        table.set(Zone::Den, 1.0);
        table
    }

    pub fn iter(&self) -> impl Iterator<Item = (Zone, f64)> + '_ {
        Zone::ALL.into_iter().map(move |z| (z, self.get(z)))
    }

    fn accumulate(&mut self, other: &ZoneTable) {
        for (total, value) in self.0.iter_mut().zip(other.0.iter()) {
            *total += value;
        }
    }

    fn scaled(&self, factor: f64) -> ZoneTable {
        ZoneTable(self.0.map(|v| v * factor))
    }

    /// Geometric mean of two sides, zone by zone
    pub fn geometric_mean(left: &ZoneTable, right: &ZoneTable) -> ZoneTable {
        let mut out = ZoneTable::default();
        for zone in Zone::ALL {
            out.set(zone, (left.get(zone) * right.get(zone)).sqrt());
        }
        out
    }
}

impl Serialize for ZoneTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ZONE_COUNT))?;
        for (zone, value) in self.iter() {
            map.serialize_entry(zone.label(), &value)?;
        }
        map.end()
    }
}

/// Share of the span `[lo, hi]` below and above `at`
///
/// A zero-extent span is assigned entirely to the side holding the point;
/// past the early returns `lo < at < hi`, so the extent is never zero.
pub fn split_fraction(lo: f64, hi: f64, at: f64) -> (f64, f64) {
    if hi <= at {
        return (1.0, 0.0);
    }
    if lo >= at {
        return (0.0, 1.0);
    }

    let below = (at - lo) / (hi - lo);
    (below, 1.0 - below)
}

/// Zone membership of a pixel-space box on one side
pub fn zone_fractions(
    bbox: &BoundingBox,
    tank: &TankGeometry,
    side: Side,
    mirror_partition_fraction: f64,
) -> ZoneFractions {
    let (outer, facing_edge_distance) = match side {
        Side::Left => (tank.x_min, tank.center_x - bbox.x_max),
        Side::Right => (tank.x_max, bbox.x_min - tank.center_x),
    };
    let half_width = (tank.center_x - outer).abs();
    let mid_x = (outer + tank.center_x) / 2.0;

    let mirror = if facing_edge_distance <= half_width * mirror_partition_fraction {
        1.0
    } else {
        0.0
    };

    let (below_x, above_x) = split_fraction(bbox.x_min, bbox.x_max, mid_x);
    let (near, far) = match side {
        Side::Left => (above_x, below_x),
        Side::Right => (below_x, above_x),
    };

    // image y grows downward
    let (top, bottom) = split_fraction(bbox.y_min, bbox.y_max, tank.center_y());

    let mut fractions = ZoneFractions::default();
    fractions.set(Zone::MirrorPartition, mirror);
    fractions.set(Zone::MirrorPartitionTop, mirror * top);
    fractions.set(Zone::MirrorPartitionBottom, mirror * bottom);
    fractions.set(Zone::Near, near);
    fractions.set(Zone::Far, far);
    fractions.set(Zone::Top, top);
    fractions.set(Zone::Bottom, bottom);
    fractions.set(Zone::NearTop, near * top);
    fractions.set(Zone::NearBottom, near * bottom);
    fractions.set(Zone::FarTop, far * top);
    fractions.set(Zone::FarBottom, far * bottom);
    fractions
}

/// Per-frame assignments and the aggregated occupancy tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneOccupancy {
    /// One entry per frame, per side
    pub fractions: PerSide<Vec<ZoneFractions>>,

    /// Co-occupancy per frame (geometric mean of both sides)
    pub overlap_fractions: Vec<ZoneFractions>,

    pub percentages: PerSide<ZonePercentages>,

    pub overlap_percentages: ZonePercentages,

    pub frame_count: u32,
}

impl ZoneOccupancy {
    /// Dense per-frame series of one zone for one side
    pub fn series(&self, side: Side, zone: Zone) -> Vec<f64> {
        self.fractions
            .get(side)
            .iter()
            .map(|f| f.get(zone))
            .collect()
    }

    /// Dense per-frame co-occupancy series of one zone
    pub fn overlap_series(&self, zone: Zone) -> Vec<f64> {
        self.overlap_fractions.iter().map(|f| f.get(zone)).collect()
    }
}

/// Computes [`ZoneOccupancy`] at every frame
#[derive(Debug, Clone)]
pub struct ZoneAnalyzer {
    mirror_partition_fraction: f64,
    max_gap_secs: f64,
}

impl ZoneAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            mirror_partition_fraction: config.mirror_partition_fraction,
            max_gap_secs: config.max_interpolation_gap_secs,
        }
    }
}

impl SignalAnalyzer for ZoneAnalyzer {
    type Output = ZoneOccupancy;

    fn name(&self) -> &'static str {
        "zones"
    }

    fn analyze(&self, recording: &Recording) -> ZoneOccupancy {
        let interp = Interpolator::for_recording(recording, self.max_gap_secs);
        let frame_count = recording.total_frames();

        let fractions = PerSide::from_fn(|side| {
            (0..frame_count)
                .map(|frame| match interp.box_at(frame, side) {
                    Some(bbox) => zone_fractions(
                        &bbox.to_pixels(&recording.video),
                        &recording.tank,
                        side,
                        self.mirror_partition_fraction,
                    ),
                    None => ZoneFractions::den(),
                })
                .collect::<Vec<_>>()
        });

        let overlap_fractions: Vec<ZoneFractions> = fractions
            .left
            .iter()
            .zip(fractions.right.iter())
            .map(|(l, r)| ZoneTable::geometric_mean(l, r))
            .collect();

        let to_percent = |frames: &[ZoneFractions]| {
            let mut totals = ZoneTable::default();
            for f in frames {
                totals.accumulate(f);
            }
            if frame_count == 0 {
                totals
            } else {
                totals.scaled(100.0 / frame_count as f64)
            }
        };

        let percentages = PerSide::new(to_percent(&fractions.left), to_percent(&fractions.right));
        let overlap_percentages = to_percent(&overlap_fractions);

        log::debug!(
            "Zones: den left={:.1}% right={:.1}%, MP overlap={:.1}%",
            percentages.left.get(Zone::Den),
            percentages.right.get(Zone::Den),
            overlap_percentages.get(Zone::MirrorPartition)
        );

        ZoneOccupancy {
            fractions,
            overlap_fractions,
            percentages,
            overlap_percentages,
            frame_count,
        }
    }
}
