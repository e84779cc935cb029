//! Scan session driver: waits for the scan, classifies every fragment once,
//! then runs plane extraction.
//!
//! The driver is a plain state machine advanced by the host, one step per
//! [`MeshScanDriver::poll`]:
//!
//! ```text
//! Scanning ──(elapsed >= scan_duration or scan complete)──> Analyzing
//! Analyzing ──(one fragment per poll; after the last one)──> Done
//! Done ──(terminal, analysis never re-runs)
//! ```
//!
//! [`analyze_fragments`] skips the gate for callers that already hold a
//! static snapshot.

use std::time::Duration;

use nalgebra::Vector3;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::classify::{ClassifiedSamples, NormalClassifier};
use crate::cluster::{PlaneClusterFinder, PlaneDescriptor};
use crate::config::{AnalyzerConfig, SampleSource};
use crate::error::{PlaneError, PlaneResult};
use crate::geometry::try_normalize;
use crate::histogram::OrientationHistogram;
use crate::progress::{ProgressCallback, ProgressTracker};
use crate::sample::Sample;
use crate::tracing_ext::{OperationTimer, log_classification_stats, log_mesh_stats, log_progress};
use crate::types::{MeshFragment, Triangle};

/// Where mesh fragments come from.
///
/// Implemented by the host around its spatial-mapping system.
pub trait MeshSource {
    /// Current fragments. `None` marks a slot whose data is unavailable.
    fn mesh_fragments(&self) -> Vec<Option<MeshFragment>>;

    /// Time since scanning started.
    fn scan_elapsed(&self) -> Duration;

    /// Whether the source has finished scanning on its own.
    fn is_scan_complete(&self) -> bool;

    /// Stop acquiring new geometry. Called once when analysis starts.
    fn stop_scanning(&mut self) {}
}

/// A source backed by a fixed set of fragments, complete from the start.
#[derive(Debug, Clone, Default)]
pub struct StaticMeshSource {
    fragments: Vec<Option<MeshFragment>>,
    elapsed: Duration,
    stopped: bool,
}

impl StaticMeshSource {
    /// Wrap a list of fragments.
    pub fn new(fragments: Vec<MeshFragment>) -> Self {
        Self::from_slots(fragments.into_iter().map(Some).collect())
    }

    /// Wrap fragment slots, some of which may be empty.
    pub fn from_slots(fragments: Vec<Option<MeshFragment>>) -> Self {
        Self {
            fragments,
            elapsed: Duration::ZERO,
            stopped: false,
        }
    }

    /// Report this elapsed scan time.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Whether [`MeshSource::stop_scanning`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl MeshSource for StaticMeshSource {
    fn mesh_fragments(&self) -> Vec<Option<MeshFragment>> {
        self.fragments.clone()
    }

    fn scan_elapsed(&self) -> Duration {
        self.elapsed
    }

    fn is_scan_complete(&self) -> bool {
        true
    }

    fn stop_scanning(&mut self) {
        self.stopped = true;
    }
}

/// A fragment that was not analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFragment {
    /// Position in the source's fragment list.
    pub index: usize,
    /// Why it was skipped.
    pub reason: String,
}

/// Everything one analysis pass produces.
#[derive(Debug, Clone, Default)]
pub struct PlaneAnalysis {
    /// Up-facing samples (ceiling or floor surfaces seen from below).
    pub up: Vec<Sample>,
    /// Down-facing samples.
    pub down: Vec<Sample>,
    /// Wall candidates.
    pub horizontal: Vec<Sample>,
    /// Extracted wall planes, most populated first.
    pub planes: Vec<PlaneDescriptor>,
    /// Wall candidates agreeing on the dominant orientation.
    pub dominant_orientation: Vec<Sample>,
    /// Start of the winning histogram window in degrees.
    pub dominant_window_deg: Option<f64>,
    /// Oblique or degenerate samples.
    pub discarded: usize,
    /// Samples dropped as duplicates.
    pub duplicates: usize,
    /// Fragments that contributed samples.
    pub fragments_processed: usize,
    /// Fragments that were missing or invalid.
    pub skipped_fragments: Vec<SkippedFragment>,
}

/// Lifecycle of a scan session.
#[derive(Debug, Clone)]
pub enum ScanState {
    /// Waiting for enough scan time or for the source to finish.
    Scanning,
    /// Classifying fragments, one per poll.
    Analyzing {
        /// Index of the next fragment.
        next: usize,
        /// Number of fragments in the snapshot.
        total: usize,
    },
    /// Analysis finished. Terminal.
    Done(PlaneAnalysis),
}

impl ScanState {
    /// Whether analysis has finished.
    pub fn is_done(&self) -> bool {
        matches!(self, ScanState::Done(_))
    }
}

/// Single-shot plane analysis over a [`MeshSource`].
///
/// There is no `reset`; a new scan session uses a new driver.
#[derive(Debug)]
pub struct MeshScanDriver {
    config: AnalyzerConfig,
    classifier: NormalClassifier,
    state: ScanState,
    pending: Vec<Option<MeshFragment>>,
    samples: ClassifiedSamples,
    fragments_processed: usize,
    skipped: Vec<SkippedFragment>,
}

impl MeshScanDriver {
    /// Create a driver in the `Scanning` state.
    ///
    /// # Errors
    ///
    /// Returns [`PlaneError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: AnalyzerConfig) -> PlaneResult<Self> {
        config.validate()?;
        Ok(Self {
            classifier: NormalClassifier::from_config(&config),
            samples: ClassifiedSamples::new(config.dedup_decimals),
            config,
            state: ScanState::Scanning,
            pending: Vec::new(),
            fragments_processed: 0,
            skipped: Vec::new(),
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// The finished analysis, once `Done`.
    pub fn analysis(&self) -> Option<&PlaneAnalysis> {
        match &self.state {
            ScanState::Done(analysis) => Some(analysis),
            _ => None,
        }
    }

    /// Consume the driver, returning the analysis if it finished.
    pub fn into_analysis(self) -> Option<PlaneAnalysis> {
        match self.state {
            ScanState::Done(analysis) => Some(analysis),
            _ => None,
        }
    }

    /// Advance by one step.
    ///
    /// While `Scanning`, checks the gate and, when it opens, stops the source
    /// and snapshots its fragments. While `Analyzing`, classifies one fragment;
    /// after the last one, runs plane extraction and moves to `Done`. Polling
    /// a finished driver returns the same result without touching the source.
    pub fn poll<S: MeshSource + ?Sized>(&mut self, source: &mut S) -> &ScanState {
        match self.state {
            ScanState::Scanning => self.check_gate(source),
            ScanState::Analyzing { next, total } => self.step(next, total),
            ScanState::Done(_) => {}
        }
        &self.state
    }

    fn check_gate<S: MeshSource + ?Sized>(&mut self, source: &mut S) {
        let elapsed = source.scan_elapsed();
        let complete = source.is_scan_complete();
        if elapsed < self.config.scan_duration() && !complete {
            debug!(
                target: "mesh_planes::scan",
                elapsed_s = elapsed.as_secs_f64(),
                "No mesh analysis for now"
            );
            return;
        }

        source.stop_scanning();
        self.pending = source.mesh_fragments();
        let total = self.pending.len();
        info!(
            target: "mesh_planes::scan",
            elapsed_s = elapsed.as_secs_f64(),
            scan_complete = complete,
            fragments = total,
            "Starting mesh analysis"
        );
        self.state = ScanState::Analyzing { next: 0, total };
    }

    fn step(&mut self, next: usize, total: usize) {
        if next < total {
            let fragment = self.pending[next].take();
            match classify_fragment(next, fragment, &self.classifier, &self.config) {
                Ok(samples) => {
                    self.samples.merge(samples);
                    self.fragments_processed += 1;
                }
                Err(skipped) => {
                    warn_skipped(&skipped);
                    self.skipped.push(skipped);
                }
            }
            log_progress("mesh_scan", next + 1, total, Some("classify"));
        }

        if next + 1 >= total {
            self.pending.clear();
            let samples = std::mem::take(&mut self.samples);
            let skipped = std::mem::take(&mut self.skipped);
            let analysis = finish_analysis(samples, &self.config, self.fragments_processed, skipped);
            info!(
                target: "mesh_planes::scan",
                planes = analysis.planes.len(),
                "Mesh analysis done"
            );
            self.state = ScanState::Done(analysis);
        } else {
            self.state = ScanState::Analyzing {
                next: next + 1,
                total,
            };
        }
    }
}

/// Classify and cluster a static set of fragments in one call.
///
/// Accepts `MeshFragment`s or `Option<MeshFragment>` slots.
///
/// # Errors
///
/// Returns [`PlaneError::InvalidConfig`] if `config` fails validation.
pub fn analyze_fragments<I, F>(fragments: I, config: &AnalyzerConfig) -> PlaneResult<PlaneAnalysis>
where
    I: IntoIterator<Item = F>,
    F: Into<Option<MeshFragment>>,
{
    analyze_fragments_with_progress(fragments, config, None)
}

/// Like [`analyze_fragments`], reporting progress after each fragment.
///
/// Fragments are classified on the rayon pool when `config.parallel` is set;
/// per-fragment results are merged in fragment order either way.
///
/// # Errors
///
/// Returns [`PlaneError::InvalidConfig`] for a bad configuration and
/// [`PlaneError::Cancelled`] if the callback returns `false`.
pub fn analyze_fragments_with_progress<I, F>(
    fragments: I,
    config: &AnalyzerConfig,
    callback: Option<&ProgressCallback>,
) -> PlaneResult<PlaneAnalysis>
where
    I: IntoIterator<Item = F>,
    F: Into<Option<MeshFragment>>,
{
    config.validate()?;

    let fragments: Vec<Option<MeshFragment>> = fragments.into_iter().map(Into::into).collect();
    let _timer = OperationTimer::new("analyze_fragments");
    let classifier = NormalClassifier::from_config(config);
    let tracker = ProgressTracker::new(fragments.len() as u64);

    let run = |(index, fragment): (usize, Option<MeshFragment>)| {
        if tracker.is_cancelled() {
            return None;
        }
        let result = classify_fragment(index, fragment, &classifier, config);
        tracker.increment();
        tracker.maybe_callback(callback, format!("fragment {}", index));
        Some(result)
    };

    let results: Vec<_> = if config.parallel {
        fragments.into_par_iter().enumerate().map(run).collect()
    } else {
        fragments.into_iter().enumerate().map(run).collect()
    };

    if tracker.is_cancelled() {
        return Err(PlaneError::Cancelled {
            stage: "fragment classification".to_string(),
        });
    }

    let mut samples = ClassifiedSamples::new(config.dedup_decimals);
    let mut processed = 0;
    let mut skipped = Vec::new();
    for result in results.into_iter().flatten() {
        match result {
            Ok(fragment_samples) => {
                samples.merge(fragment_samples);
                processed += 1;
            }
            Err(skip) => {
                warn_skipped(&skip);
                skipped.push(skip);
            }
        }
    }

    Ok(finish_analysis(samples, config, processed, skipped))
}

/// World-space samples of one fragment.
///
/// Vertex normals must already be computed. Vertices without a normal and
/// degenerate triangles yield zero directions, which classify as discards.
pub fn fragment_samples(fragment: &MeshFragment, source: SampleSource) -> Vec<Sample> {
    let transform = &fragment.transform;
    let mesh = &fragment.mesh;

    match source {
        SampleSource::Vertices => mesh
            .vertices
            .iter()
            .map(|v| {
                let direction = v
                    .normal
                    .and_then(|n| try_normalize(&transform.transform_direction(&n)))
                    .unwrap_or_else(Vector3::zeros);
                Sample::new(transform.transform_point(&v.position), direction)
            })
            .collect(),
        SampleSource::Faces => mesh
            .triangles()
            .map(|tri| {
                let world = Triangle::new(
                    transform.transform_point(&tri.v0),
                    transform.transform_point(&tri.v1),
                    transform.transform_point(&tri.v2),
                );
                Sample::new(world.centroid(), world.normal().unwrap_or_else(Vector3::zeros))
            })
            .collect(),
    }
}

fn classify_fragment(
    index: usize,
    fragment: Option<MeshFragment>,
    classifier: &NormalClassifier,
    config: &AnalyzerConfig,
) -> Result<ClassifiedSamples, SkippedFragment> {
    let Some(mut fragment) = fragment else {
        return Err(SkippedFragment {
            index,
            reason: "mesh data unavailable".to_string(),
        });
    };

    fragment.mesh.validate().map_err(|e| SkippedFragment {
        index,
        reason: e.to_string(),
    })?;

    log_mesh_stats(&fragment.mesh, "fragment");
    // Supplied normals are not trusted
    fragment.mesh.compute_vertex_normals();

    let mut samples = ClassifiedSamples::new(config.dedup_decimals);
    for sample in fragment_samples(&fragment, config.sample_source) {
        classifier.classify_into(&mut samples, sample);
    }
    Ok(samples)
}

fn finish_analysis(
    samples: ClassifiedSamples,
    config: &AnalyzerConfig,
    fragments_processed: usize,
    skipped_fragments: Vec<SkippedFragment>,
) -> PlaneAnalysis {
    log_classification_stats(&samples, "scan");

    let planes = PlaneClusterFinder::from_config(config)
        .find_top_planes(samples.horizontal(), config.target_plane_count);
    let dominant = OrientationHistogram::from_config(config).dominant_orientation(samples.horizontal());

    let discarded = samples.discarded();
    let duplicates = samples.duplicates();
    let (up, down, horizontal) = samples.into_parts();

    PlaneAnalysis {
        up,
        down,
        horizontal,
        planes,
        dominant_orientation: dominant.members,
        dominant_window_deg: dominant.window_start_deg,
        discarded,
        duplicates,
        fragments_processed,
        skipped_fragments,
    }
}

fn warn_skipped(skipped: &SkippedFragment) {
    warn!(
        target: "mesh_planes::scan",
        fragment = skipped.index,
        reason = %skipped.reason,
        "Skipping fragment"
    );
}
