use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tank_behavior::analysis::Zone;
use tank_behavior::model::Side;
use tank_behavior::session::{ActivityMetric, ProximityMetric};
use tank_behavior::validation::validate_report;
use tank_behavior::{load_recording, AnalysisConfig, AnalysisReport, AnalysisSession};

#[derive(Parser, Debug)]
#[command(name = "tank-behavior")]
#[command(about = "Analyze subject behavior from tank keyframe detections", long_about = None)]
struct Args {
    /// Path to the keyframe JSON produced by the detector
    input: String,

    /// Write the full analysis report as JSON to this path
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Activity metric: iou or centroid
    #[arg(long, default_value = "iou")]
    activity_metric: ActivityMetric,

    /// Proximity metric: edge or centroid
    #[arg(long, default_value = "edge")]
    proximity_metric: ProximityMetric,

    /// Trajectory sampling rate override (default: detection rate from the input)
    #[arg(long)]
    hertz: Option<f64>,

    /// Longest keyframe gap in seconds that may be interpolated across
    #[arg(long, default_value = "15")]
    max_gap: f64,

    /// Frequency components reported per signal
    #[arg(long, default_value = "5")]
    top_k: usize,

    /// Seed for heatmap sampling (default: random)
    #[arg(long)]
    seed: Option<u64>,

    /// Keep every detection instead of reducing crowded keyframes to the best match
    #[arg(long)]
    no_preprocess: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::info!("Tank Behavior Analysis");
    log::info!("======================");

    // Expand ~ in paths
    let input = shellexpand::tilde(&args.input);
    let recording = load_recording(PathBuf::from(input.as_ref()).as_path(), !args.no_preprocess)?;

    let mut config = AnalysisConfig::new()
        .with_activity_metric(args.activity_metric)
        .with_proximity_metric(args.proximity_metric)
        .with_max_gap(args.max_gap)
        .with_top_k(args.top_k);
    if let Some(hertz) = args.hertz {
        config = config.with_hertz(hertz);
    }
    if let Some(seed) = args.seed {
        config = config.with_heatmap_seed(seed);
    }

    let mut session = AnalysisSession::with_recording(config, recording)?;
    let report = session.report()?;

    log_summary(&report);

    // Always validate before handing results on
    validate_report(&report)?;

    if let Some(output) = &args.output {
        let json = report.to_json().context("Failed to serialize analysis report")?;
        fs::write(output, json)
            .with_context(|| format!("Failed to write report: {:?}", output))?;
        log::info!("Report written to: {:?}", output);
    }

    log::info!("Analysis completed successfully!");
    Ok(())
}

fn log_summary(report: &AnalysisReport) {
    if let Some(filename) = &report.filename {
        log::info!("Video: {}", filename);
    }
    log::info!(
        "{} frames at {:.2} fps ({:.1}s)",
        report.video.total_frames,
        report.video.fps,
        report.video.duration_secs()
    );

    for side in Side::BOTH {
        let percentages = report.zones.percentages.get(side);
        let stats = report.trajectories.stats.get(side);
        log::info!(
            "{:>5}: max activity {:.3}, D {:.1}%, MP {:.1}%, H1 {:.1}%, H2 {:.1}%, path {:.0}px",
            side,
            report.activity.max.get(side),
            percentages.get(Zone::Den),
            percentages.get(Zone::MirrorPartition),
            percentages.get(Zone::Near),
            percentages.get(Zone::Far),
            stats.path_length_px
        );
    }
    log::info!(
        "Overlap: MP {:.1}%",
        report.zones.overlap_percentages.get(Zone::MirrorPartition)
    );

    for entry in &report.frequencies {
        if let Some(peak) = entry.components.first() {
            let side = entry.side.map(|s| s.name()).unwrap_or("both");
            log::info!(
                "Dominant {} ({}) frequency: {:.3} Hz, magnitude {:.4}",
                entry.signal,
                side,
                peak.frequency,
                peak.magnitude
            );
        }
    }
}
