//! Invariant checks over a finished analysis report

use crate::analysis::{Heatmaps, TrajectoryPoint, Zone, ZoneFractions, ZoneOccupancy};
use crate::model::{PerSide, Side};
use crate::session::AnalysisReport;
use anyhow::{bail, ensure, Result};

const TOLERANCE: f64 = 1e-9;

/// Validate the in-memory results of one analysis run
///
/// # Returns
/// Ok(()) if every check passes, Err naming the first violation otherwise
pub fn validate_report(report: &AnalysisReport) -> Result<()> {
    log::info!("Validating analysis report...");
    let total = report.video.total_frames as usize;

    check_buffer_lengths(report, total)?;
    check_signal_ranges(report)?;
    check_zones(&report.zones)?;
    check_heatmaps(&report.heatmaps)?;
    for side in Side::BOTH {
        check_trajectory(report.trajectories.points.get(side), side)?;
    }
    check_frequencies(report)?;

    log::info!("✅ Report passed all invariant checks");
    Ok(())
}

fn check_buffer_lengths(report: &AnalysisReport, total: usize) -> Result<()> {
    let buffers: [(&str, &PerSide<Vec<f64>>); 3] = [
        ("activity", &report.activity.values),
        ("proximity", &report.proximity.proximity),
        ("verticality", &report.proximity.verticality),
    ];
    for (name, buffer) in buffers {
        for side in Side::BOTH {
            let len = buffer.get(side).len();
            ensure!(
                len == total,
                "{} {} buffer has {} entries, expected {}",
                side,
                name,
                len,
                total
            );
        }
    }

    for side in Side::BOTH {
        let len = report.zones.fractions.get(side).len();
        ensure!(
            len == total,
            "{} zone fractions have {} entries, expected {}",
            side,
            len,
            total
        );
    }
    ensure!(
        report.zones.overlap_fractions.len() == total,
        "Overlap zone fractions have {} entries, expected {}",
        report.zones.overlap_fractions.len(),
        total
    );
    Ok(())
}

fn check_signal_ranges(report: &AnalysisReport) -> Result<()> {
    for side in Side::BOTH {
        let max = *report.activity.max.get(side);
        for (frame, &value) in report.activity.values.get(side).iter().enumerate() {
            ensure!(
                value.is_finite() && value >= 0.0 && value <= max + TOLERANCE,
                "{} activity at frame {} is {} (max {})",
                side,
                frame,
                value,
                max
            );
        }

        let unit = [
            ("proximity", report.proximity.proximity.get(side)),
            ("verticality", report.proximity.verticality.get(side)),
        ];
        for (name, values) in unit {
            if let Some((frame, value)) = values
                .iter()
                .enumerate()
                .find(|(_, v)| !(0.0..=1.0).contains(*v))
            {
                bail!("{} {} at frame {} is outside [0, 1]: {}", side, name, frame, value);
            }
        }
    }
    Ok(())
}

fn check_zone_table(fractions: &ZoneFractions, side: Side, frame: usize) -> Result<()> {
    let out_of_range = fractions
        .iter()
        .find(|(_, v)| !(0.0..=1.0 + TOLERANCE).contains(v));
    if let Some((zone, value)) = out_of_range {
        bail!("{} zone {} at frame {} is outside [0, 1]: {}", side, zone, frame, value);
    }
    if fractions.get(Zone::Den) >= 1.0 {
        return Ok(());
    }

    let sums = [
        ("H1 + H2", fractions.get(Zone::Near) + fractions.get(Zone::Far)),
        ("T + B", fractions.get(Zone::Top) + fractions.get(Zone::Bottom)),
        (
            "H1T + H1B + H2T + H2B",
            fractions.get(Zone::NearTop)
                + fractions.get(Zone::NearBottom)
                + fractions.get(Zone::FarTop)
                + fractions.get(Zone::FarBottom),
        ),
    ];
    for (name, sum) in sums {
        ensure!(
            (sum - 1.0).abs() < 1e-6,
            "{} {} at frame {} sums to {}",
            side,
            name,
            frame,
            sum
        );
    }
    Ok(())
}

fn check_zones(zones: &ZoneOccupancy) -> Result<()> {
    for side in Side::BOTH {
        for (frame, fractions) in zones.fractions.get(side).iter().enumerate() {
            check_zone_table(fractions, side, frame)?;
        }
    }

    let frames = zones
        .overlap_fractions
        .iter()
        .zip(zones.fractions.left.iter().zip(zones.fractions.right.iter()));
    for (frame, (overlap, (left, right))) in frames.enumerate() {
        for (zone, value) in overlap.iter() {
            let bound = left.get(zone).max(right.get(zone));
            ensure!(
                value >= 0.0 && value <= bound + TOLERANCE,
                "Overlap zone {} at frame {} is {} (bound {})",
                zone,
                frame,
                value,
                bound
            );
        }
    }
    Ok(())
}

fn check_heatmaps(heatmaps: &Heatmaps) -> Result<()> {
    for side in Side::BOTH {
        let grid = heatmaps.grids.get(side);
        ensure!(
            grid.width() == heatmaps.width && grid.height() == heatmaps.height,
            "{} heatmap is {}x{}, expected {}x{}",
            side,
            grid.width(),
            grid.height(),
            heatmaps.width,
            heatmaps.height
        );
        ensure!(grid.is_normalized(), "{} heatmap was not normalized", side);
        if let Some(value) = grid.cells().iter().find(|v| !(0.0..=1.0).contains(*v)) {
            bail!("{} heatmap cell value {} is outside [0, 1]", side, value);
        }
    }
    Ok(())
}

fn check_trajectory(points: &[TrajectoryPoint], side: Side) -> Result<()> {
    for pair in points.windows(2) {
        ensure!(
            pair[0].frame < pair[1].frame,
            "{} trajectory is not ordered: frame {} follows {}",
            side,
            pair[1].frame,
            pair[0].frame
        );
    }
    if let Some(point) = points.iter().find(|p| !(0.0..=1.0).contains(&p.progress)) {
        bail!(
            "{} trajectory progress {} at frame {} is outside [0, 1]",
            side,
            point.progress,
            point.frame
        );
    }
    Ok(())
}

fn check_frequencies(report: &AnalysisReport) -> Result<()> {
    let top_k = report.config.top_k;
    let max_hz = report.config.max_frequency_hz;
    for entry in &report.frequencies {
        ensure!(
            entry.components.len() <= top_k,
            "{} lists {} components, more than top_k = {}",
            entry.signal,
            entry.components.len(),
            top_k
        );
        ensure!(
            entry
                .components
                .windows(2)
                .all(|w| w[0].magnitude >= w[1].magnitude),
            "{} components are not ranked by magnitude",
            entry.signal
        );
        if let Some(c) = entry
            .components
            .iter()
            .find(|c| !(c.frequency > 0.0 && c.frequency <= max_hz))
        {
            bail!("{} lists out-of-band frequency {} Hz", entry.signal, c.frequency);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::zones::zone_fractions;
    use crate::model::{BoundingBox, TankGeometry};

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
    fn test_zone_table_checks() {
        let bbox = BoundingBox::new(40.0, 40.0, 60.0, 60.0);
        let fractions = zone_fractions(&bbox, &tank(), Side::Left, 1.0 / 12.0);
        assert!(check_zone_table(&fractions, Side::Left, 0).is_ok());
        assert!(check_zone_table(&ZoneFractions::den(), Side::Left, 0).is_ok());

        let mut broken = fractions;
        broken.set(Zone::Far, 0.9);
        let err = check_zone_table(&broken, Side::Left, 7).unwrap_err();
        assert!(err.to_string().contains("H1 + H2"));
    }

    #[test]
    fn test_trajectory_ordering() {
        let point = |frame| TrajectoryPoint {
            frame,
            x: 0.5,
            y: 0.5,
            progress: frame as f64 / 100.0,
        };
        assert!(check_trajectory(&[point(0), point(15), point(30)], Side::Right).is_ok());
        assert!(check_trajectory(&[point(15), point(15)], Side::Right).is_err());
        assert!(check_trajectory(&[point(0), point(150)], Side::Right).is_err());
    }
}
