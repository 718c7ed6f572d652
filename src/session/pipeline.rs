//! Analysis session orchestration

use super::config::{ActivityMetric, AnalysisConfig, ProximityMetric};
use super::report::{AnalysisReport, SignalFrequencies};
use crate::analysis::{
    ActivityAnalyzer, ActivitySignal, FrequencyComponent, HeatmapCalculator, Heatmaps,
    ProximityAnalyzer, ProximitySignal, SignalAnalyzer, SpectralAnalyzer, Trajectories,
    TrajectoryCalculator, Zone, ZoneAnalyzer, ZoneOccupancy,
};
use crate::error::{AnalysisError, AnalysisResult};
use crate::model::{DetectionStore, KeyframeMap, Recording, Side};
use std::sync::Arc;

/// A dense 1D signal the spectral analyzer can be pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Activity,
    Proximity,
    Verticality,
    /// Per-frame fraction of one zone for the requested side
    Zone(Zone),
    /// Per-frame co-occupancy of one zone; the side is ignored
    ZoneOverlap(Zone),
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Activity => write!(f, "activity"),
            SignalKind::Proximity => write!(f, "proximity"),
            SignalKind::Verticality => write!(f, "verticality"),
            SignalKind::Zone(zone) => write!(f, "zone:{}", zone),
            SignalKind::ZoneOverlap(zone) => write!(f, "overlap:{}", zone),
        }
    }
}

/// Cached analyzer results, each published whole
#[derive(Debug, Default)]
struct ResultCache {
    activity: Option<Arc<ActivitySignal>>,
    proximity: Option<Arc<ProximitySignal>>,
    zones: Option<Arc<ZoneOccupancy>>,
    heatmaps: Option<Arc<Heatmaps>>,
    trajectories: Option<Arc<Trajectories>>,
}

/// Owns one loaded recording and every signal derived from it
///
/// Results are computed on first request and cached until the recording or a
/// parameter they depend on changes. Consumers receive `Arc` snapshots, so a
/// recompute never mutates a result someone else is holding.
#[derive(Debug)]
pub struct AnalysisSession {
    config: AnalysisConfig,
    recording: Option<Arc<Recording>>,
    cache: ResultCache,
}

impl AnalysisSession {
    /// Create an empty session
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            recording: None,
            cache: ResultCache::default(),
        })
    }

    /// Create a session with a recording already loaded
    pub fn with_recording(config: AnalysisConfig, recording: Recording) -> AnalysisResult<Self> {
        let mut session = Self::new(config)?;
        session.load(recording);
        Ok(session)
    }

    /// Replace the loaded recording and drop every cached result
    pub fn load(&mut self, recording: Recording) {
        log::info!(
            "Loaded recording: {} frames at {:.2} fps, {} keyframes",
            recording.total_frames(),
            recording.fps(),
            recording.store.keyframe_count()
        );
        self.recording = Some(Arc::new(recording));
        self.invalidate_all();
    }

    /// Current analysis parameters
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Whether a recording has been loaded
    pub fn is_loaded(&self) -> bool {
        self.recording.is_some()
    }

    /// The loaded recording snapshot
    pub fn recording(&self) -> AnalysisResult<&Arc<Recording>> {
        self.recording
            .as_ref()
            .ok_or(AnalysisError::NoData { operation: "recording" })
    }

    fn invalidate_all(&mut self) {
        self.cache = ResultCache::default();
    }

    // Parameter changes

    /// Set the activity difference metric
    pub fn set_activity_metric(&mut self, metric: ActivityMetric) {
        if self.config.activity_metric != metric {
            self.config.activity_metric = metric;
            self.cache.activity = None;
        }
    }

    /// Set the proximity distance reference (edge or centroid)
    pub fn set_proximity_metric(&mut self, metric: ProximityMetric) {
        if self.config.proximity_metric != metric {
            self.config.proximity_metric = metric;
            self.cache.proximity = None;
        }
    }

    /// Set the activity color-mapping exponent
    pub fn set_activity_sensitivity(&mut self, sensitivity: f64) -> AnalysisResult<()> {
        self.update(|c| c.activity_sensitivity = sensitivity)?;
        self.cache.activity = None;
        Ok(())
    }

    /// Set the proximity color-mapping exponent
    pub fn set_proximity_sensitivity(&mut self, sensitivity: f64) -> AnalysisResult<()> {
        self.update(|c| c.proximity_sensitivity = sensitivity)?;
        self.cache.proximity = None;
        Ok(())
    }

    /// Override the detection rate used for trajectory and activity sampling
    pub fn set_hertz(&mut self, hertz: f64) -> AnalysisResult<()> {
        self.update(|c| c.hertz = Some(hertz))?;
        self.cache.trajectories = None;
        self.cache.activity = None;
        Ok(())
    }

    /// Set how many frequency components are reported per signal
    pub fn set_top_k(&mut self, top_k: usize) -> AnalysisResult<()> {
        // frequencies are not cached
        self.update(|c| c.top_k = top_k)
    }

    /// Set the longest interpolated keyframe gap, in seconds
    ///
    /// Every analyzer reads boxes through the interpolator, so this drops everything.
    pub fn set_max_gap(&mut self, secs: f64) -> AnalysisResult<()> {
        self.update(|c| c.max_interpolation_gap_secs = secs)?;
        self.invalidate_all();
        Ok(())
    }

    /// Seed the heatmap stride generator (None = OS entropy)
    pub fn set_heatmap_seed(&mut self, seed: Option<u64>) {
        self.config.heatmap_seed = seed;
        self.cache.heatmaps = None;
    }

    /// Apply a change to a candidate config and keep it only if it validates
    fn update(&mut self, change: impl FnOnce(&mut AnalysisConfig)) -> AnalysisResult<()> {
        let mut candidate = self.config.clone();
        change(&mut candidate);
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    // Keyframe edits

    /// Remove a keyframe entirely; returns whether it existed
    pub fn delete_keyframe(&mut self, frame: u32) -> AnalysisResult<bool> {
        self.edit_keyframes("delete_keyframe", |keyframes| {
            keyframes.remove(&frame).is_some()
        })
    }

    /// Drop one side's detections at a keyframe; returns whether any were removed
    pub fn clear_detections(&mut self, frame: u32, side: Side) -> AnalysisResult<bool> {
        self.edit_keyframes("clear_detections", |keyframes| {
            match keyframes.get_mut(&frame) {
                Some(record) if record.has_detections(side) => {
                    record.detections_mut(side).clear();
                    true
                }
                _ => false,
            }
        })
    }

    /// Swap in a whole new keyframe set for the loaded video
    pub fn replace_keyframes(&mut self, keyframes: KeyframeMap) -> AnalysisResult<()> {
        self.edit_keyframes("replace_keyframes", move |current| {
            *current = keyframes;
            true
        })?;
        Ok(())
    }

    /// Rebuild the store from an edited copy; caches drop only if something changed
    fn edit_keyframes(
        &mut self,
        operation: &'static str,
        edit: impl FnOnce(&mut KeyframeMap) -> bool,
    ) -> AnalysisResult<bool> {
        let recording = self
            .recording
            .as_ref()
            .ok_or(AnalysisError::NoData { operation })?;

        let mut keyframes = recording.store.keyframes().clone();
        if !edit(&mut keyframes) {
            return Ok(false);
        }

        let edited = recording.with_store(DetectionStore::new(keyframes));
        log::info!(
            "Keyframes edited ({}): {} keyframes remain",
            operation,
            edited.store.keyframe_count()
        );
        self.recording = Some(Arc::new(edited));
        self.invalidate_all();
        Ok(true)
    }

    // Analyses

    pub fn calculate_activity(&mut self) -> AnalysisResult<Arc<ActivitySignal>> {
        let recording = loaded(&self.recording, "calculate_activity")?;
        let analyzer = ActivityAnalyzer::new(&self.config);
        Ok(cached(&mut self.cache.activity, recording, &analyzer))
    }

    pub fn calculate_proximity(&mut self) -> AnalysisResult<Arc<ProximitySignal>> {
        let recording = loaded(&self.recording, "calculate_proximity")?;
        let analyzer = ProximityAnalyzer::new(&self.config);
        Ok(cached(&mut self.cache.proximity, recording, &analyzer))
    }

    pub fn calculate_zones(&mut self) -> AnalysisResult<Arc<ZoneOccupancy>> {
        let recording = loaded(&self.recording, "calculate_zones")?;
        let analyzer = ZoneAnalyzer::new(&self.config);
        Ok(cached(&mut self.cache.zones, recording, &analyzer))
    }

    pub fn calculate_heatmap(&mut self) -> AnalysisResult<Arc<Heatmaps>> {
        let recording = loaded(&self.recording, "calculate_heatmap")?;
        let analyzer = HeatmapCalculator::new(&self.config);
        Ok(cached(&mut self.cache.heatmaps, recording, &analyzer))
    }

    pub fn calculate_trajectories(&mut self) -> AnalysisResult<Arc<Trajectories>> {
        let recording = loaded(&self.recording, "calculate_trajectories")?;
        let analyzer = TrajectoryCalculator::new(&self.config);
        Ok(cached(&mut self.cache.trajectories, recording, &analyzer))
    }

    /// Ranked frequency components of one dense signal
    pub fn frequencies(
        &mut self,
        kind: SignalKind,
        side: Side,
    ) -> AnalysisResult<Vec<FrequencyComponent>> {
        let fps = loaded(&self.recording, "frequencies")?.fps();

        let signal = match kind {
            SignalKind::Activity => self.calculate_activity()?.values.get(side).clone(),
            SignalKind::Proximity => self.calculate_proximity()?.proximity.get(side).clone(),
            SignalKind::Verticality => self.calculate_proximity()?.verticality.get(side).clone(),
            SignalKind::Zone(zone) => self.calculate_zones()?.series(side, zone),
            SignalKind::ZoneOverlap(zone) => self.calculate_zones()?.overlap_series(zone),
        };

        Ok(SpectralAnalyzer::new(&self.config).dominant_frequencies(&signal, fps))
    }

    /// Run every analyzer and bundle the results
    pub fn report(&mut self) -> AnalysisResult<AnalysisReport> {
        let recording = Arc::clone(self.recording()?);
        log::info!("Running full analysis...");

        let activity = self.calculate_activity()?;
        let proximity = self.calculate_proximity()?;
        let zones = self.calculate_zones()?;
        let heatmaps = self.calculate_heatmap()?;
        let trajectories = self.calculate_trajectories()?;

        let mut frequencies = Vec::new();
        for kind in [SignalKind::Activity, SignalKind::Proximity] {
            for side in Side::BOTH {
                frequencies.push(SignalFrequencies {
                    signal: kind.to_string(),
                    side: Some(side),
                    components: self.frequencies(kind, side)?,
                });
            }
        }
        let interaction = SignalKind::ZoneOverlap(Zone::MirrorPartition);
        frequencies.push(SignalFrequencies {
            signal: interaction.to_string(),
            side: None,
            components: self.frequencies(interaction, Side::Left)?,
        });

        Ok(AnalysisReport {
            generated_at: chrono::Local::now().to_rfc3339(),
            filename: recording.filename.clone(),
            video: recording.video,
            tank: recording.tank,
            config: self.config.clone(),
            activity,
            proximity,
            zones,
            heatmaps,
            trajectories,
            frequencies,
        })
    }
}

fn loaded<'a>(
    recording: &'a Option<Arc<Recording>>,
    operation: &'static str,
) -> AnalysisResult<&'a Recording> {
    recording
        .as_deref()
        .ok_or(AnalysisError::NoData { operation })
}

/// Return the cached result, computing and storing it on a miss
fn cached<A: SignalAnalyzer>(
    slot: &mut Option<Arc<A::Output>>,
    recording: &Recording,
    analyzer: &A,
) -> Arc<A::Output> {
    if let Some(existing) = slot {
        return Arc::clone(existing);
    }

    log::debug!("Computing {} signal", analyzer.name());
    let result = Arc::new(analyzer.analyze(recording));
    *slot = Some(Arc::clone(&result));
    result
}
