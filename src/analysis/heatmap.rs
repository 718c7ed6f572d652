//! Spatial density heatmaps
//!
//! Frames are visited with a randomized stride of roughly 0.5-1.5 seconds.
//! Each visited box is splatted with a radial falloff and weighted by the
//! stride, so it stands in for the frames that were skipped. The stride
//! generator is seedable; without a seed the output is not reproducible
//! run to run, only statistically stable.

use super::interpolation::Interpolator;
use super::traits::SignalAnalyzer;
use crate::model::{BoundingBox, PerSide, Recording, Side};
use crate::session::config::AnalysisConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Dense 2D accumulation buffer, row-major
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapGrid {
    width: usize,
    height: usize,
    cells: Vec<f64>,
    /// Largest accumulated value before normalization
    max_value: f64,
    normalized: bool,
}

impl HeatmapGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width * height],
            max_value: 0.0,
            normalized: false,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col < self.width && row < self.height {
            Some(self.cells[row * self.width + col])
        } else {
            None
        }
    }

    /// Pre-normalization maximum
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    fn add(&mut self, col: usize, row: usize, value: f64) {
        let cell = &mut self.cells[row * self.width + col];
        *cell += value;
        if *cell > self.max_value {
            self.max_value = *cell;
        }
    }

    /// Add a box footprint in grid-relative pixel coordinates
    ///
    /// Cells whose center lies inside the box receive `weight * (1 - r)^2`,
    /// with `r` the distance to the box center relative to its half-extents.
    /// A box too small to cover any cell center deposits `weight` into the
    /// cell holding its center.
    pub fn splat(&mut self, bbox: &BoundingBox, cell_px: f64, weight: f64) {
        let (cx, cy) = bbox.center();
        let half_w = bbox.width() / 2.0;
        let half_h = bbox.height() / 2.0;

        let mut deposited = false;
        if half_w > 0.0 && half_h > 0.0 {
            let cols = self.cell_range(bbox.x_min, bbox.x_max, cell_px, self.width);
            let rows = self.cell_range(bbox.y_min, bbox.y_max, cell_px, self.height);

            for row in rows {
                let py = (row as f64 + 0.5) * cell_px;
                if py < bbox.y_min || py > bbox.y_max {
                    continue;
                }
                for col in cols.clone() {
                    let px = (col as f64 + 0.5) * cell_px;
                    if px < bbox.x_min || px > bbox.x_max {
                        continue;
                    }
                    let dx = (px - cx) / half_w;
                    let dy = (py - cy) / half_h;
                    let radius = (dx * dx + dy * dy).sqrt().min(1.0);
                    self.add(col, row, (1.0 - radius).powi(2) * weight);
                    deposited = true;
                }
            }
        }

        if !deposited && cx >= 0.0 && cy >= 0.0 {
            let col = (cx / cell_px).floor() as usize;
            let row = (cy / cell_px).floor() as usize;
            if col < self.width && row < self.height {
                self.add(col, row, weight);
            }
        }
    }

    fn cell_range(&self, lo: f64, hi: f64, cell_px: f64, limit: usize) -> std::ops::Range<usize> {
        let start = (lo / cell_px).floor().clamp(0.0, limit as f64) as usize;
        let end = (hi / cell_px).ceil().clamp(0.0, limit as f64) as usize;
        start..end
    }

    /// Scale to [0,1] and square-root to compress dynamic range
    ///
    /// The divisor is never below `floor`. Calling this again is a no-op.
    pub fn normalize(&mut self, floor: f64) {
        if self.normalized {
            return;
        }
        self.normalized = true;

        let divisor = self.max_value.max(floor);
        if divisor <= 0.0 {
            return;
        }
        for cell in &mut self.cells {
            *cell = (*cell / divisor).clamp(0.0, 1.0).sqrt();
        }
    }

    /// Weighted mean cell position as (column, row), None for an empty grid
    pub fn center_of_mass(&self) -> Option<(f64, f64)> {
        let mut total = 0.0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        for row in 0..self.height {
            for col in 0..self.width {
                let v = self.cells[row * self.width + col];
                total += v;
                sum_x += v * (col as f64 + 0.5);
                sum_y += v * (row as f64 + 0.5);
            }
        }
        (total > 0.0).then(|| (sum_x / total, sum_y / total))
    }
}

/// Normalized heatmaps for both sides
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmaps {
    pub grids: PerSide<HeatmapGrid>,

    /// Grid dimensions shared by both sides
    pub width: usize,
    pub height: usize,

    pub cell_px: f64,

    /// Pre-normalization maxima, kept for reference
    pub max_values: PerSide<f64>,

    /// Number of frames the sampler visited
    pub visited_frames: usize,
}

/// Randomized frame stride of `ceil(fps * (0.5 + U(0,1)))`
pub struct StrideSampler {
    rng: StdRng,
    fps: f64,
}

impl StrideSampler {
    pub fn new(fps: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng, fps }
    }

    pub fn next_step(&mut self) -> u32 {
        let jitter: f64 = self.rng.random();
        ((self.fps * (0.5 + jitter)).ceil() as u32).max(1)
    }
}

/// Computes [`Heatmaps`] for a recording
#[derive(Debug, Clone)]
pub struct HeatmapCalculator {
    cell_px: f64,
    floor_secs: f64,
    seed: Option<u64>,
    max_gap_secs: f64,
}

impl HeatmapCalculator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            cell_px: config.heatmap_cell_px,
            floor_secs: config.heatmap_floor_secs,
            seed: config.heatmap_seed,
            max_gap_secs: config.max_interpolation_gap_secs,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl SignalAnalyzer for HeatmapCalculator {
    type Output = Heatmaps;

    fn name(&self) -> &'static str {
        "heatmap"
    }

    fn analyze(&self, recording: &Recording) -> Heatmaps {
        let tank = &recording.tank;
        let half_width = (tank.center_x - tank.x_min).max(tank.x_max - tank.center_x);
        let width = ((half_width / self.cell_px).ceil() as usize).max(1);
        let height = ((tank.height() / self.cell_px).ceil() as usize).max(1);
        let origins = PerSide::new((tank.x_min, tank.y_min), (tank.center_x, tank.y_min));

        let interp = Interpolator::for_recording(recording, self.max_gap_secs);
        let mut grids = PerSide::from_fn(|_| HeatmapGrid::new(width, height));
        let mut sampler = StrideSampler::new(recording.fps(), self.seed);

        let mut visited_frames = 0;
        let mut frame = 0u32;
        while frame < recording.total_frames() {
            let step = sampler.next_step();
            for side in Side::BOTH {
                let Some(bbox) = interp.box_at(frame, side) else {
                    continue;
                };
                let px = bbox.to_pixels(&recording.video);
                let (ox, oy) = *origins.get(side);
                let local =
                    BoundingBox::new(px.x_min - ox, px.y_min - oy, px.x_max - ox, px.y_max - oy);
                grids.get_mut(side).splat(&local, self.cell_px, step as f64);
            }
            visited_frames += 1;
            frame = frame.saturating_add(step);
        }

        let max_values = PerSide::new(grids.left.max_value(), grids.right.max_value());
        let floor = self.floor_secs * recording.fps();
        grids.left.normalize(floor);
        grids.right.normalize(floor);

        log::debug!(
            "Heatmap {}x{}: visited {} frames, max left={:.1} right={:.1}",
            width,
            height,
            visited_frames,
            max_values.left,
            max_values.right
        );

        Heatmaps {
            grids,
            width,
            height,
            cell_px: self.cell_px,
            max_values,
            visited_frames,
        }
    }
}
