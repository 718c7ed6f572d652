//! Behavioral signal analysis
//!
//! Every analyzer reads box positions through the [`Interpolator`], so they
//! all share the same absence and interpolation rules.

pub mod activity;
pub mod heatmap;
pub mod interpolation;
pub mod proximity;
pub mod spectral;
pub mod trajectory;
mod traits;
pub mod zones;

pub use activity::{ActivityAnalyzer, ActivitySignal};
pub use heatmap::{HeatmapCalculator, HeatmapGrid, Heatmaps};
pub use interpolation::Interpolator;
pub use proximity::{ProximityAnalyzer, ProximitySignal};
pub use spectral::{FrequencyComponent, SpectralAnalyzer};
pub use traits::SignalAnalyzer;
pub use trajectory::{Trajectories, TrajectoryCalculator, TrajectoryPoint, TrajectoryStats};
pub use zones::{Zone, ZoneAnalyzer, ZoneFractions, ZoneOccupancy, ZonePercentages};
