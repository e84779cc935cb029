//! Dominant wall orientation via a 90°-periodic circular histogram.
//!
//! Walls of a rectangular room agree on their azimuth modulo 90°. Each wall
//! candidate is reduced to the azimuth of its horizontal projection, then a
//! window of `span` one-degree bins is repeated in all four quadrants and slid
//! across every integer phase in `[0, 90)`. The phase that collects the most
//! samples defines the dominant orientation cluster.

use hashbrown::HashSet;
use nalgebra::Vector3;
use tracing::{debug, trace};

use crate::config::{AnalyzerConfig, AzimuthCollision};
use crate::geometry::{azimuth_deg, circular_difference, try_normalize};
use crate::sample::{Sample, quantize};
use crate::tracing_ext::{OperationTimer, log_perf_section};

/// Half-width of the matching band around each bin center, in degrees.
const BAND_HALF_WIDTH_DEG: f64 = 0.5;

/// Number of window start positions tried.
const WINDOW_POSITIONS: u32 = 90;

/// Default rounding of azimuth keys, in decimal degrees.
const DEFAULT_AZIMUTH_DECIMALS: u32 = 4;

/// Result of the orientation search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DominantOrientation {
    /// Samples in the winning window, in input order.
    pub members: Vec<Sample>,
    /// Start of the winning window in degrees. `None` when nothing matched.
    pub window_start_deg: Option<f64>,
}

/// Circular azimuth histogram over wall candidates.
#[derive(Debug, Clone)]
pub struct OrientationHistogram {
    up: Vector3<f64>,
    reference: Vector3<f64>,
    span: u32,
    collision: AzimuthCollision,
    key_decimals: u32,
}

impl OrientationHistogram {
    /// Create a histogram for the given axes and vertical tolerance.
    ///
    /// The window spans `floor(vertical_tolerance_deg)` bins per quadrant
    /// (at least one).
    pub fn new(up: Vector3<f64>, reference: Vector3<f64>, vertical_tolerance_deg: f64) -> Self {
        let span = if vertical_tolerance_deg.is_finite() {
            (vertical_tolerance_deg.floor() as u32).max(1)
        } else {
            1
        };

        Self {
            up: try_normalize(&up).unwrap_or_else(Vector3::zeros),
            reference,
            span,
            collision: AzimuthCollision::default(),
            key_decimals: DEFAULT_AZIMUTH_DECIMALS,
        }
    }

    /// Create a histogram from an analysis configuration.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(
            config.up_axis,
            config.reference_axis,
            config.thresholds.vertical_tolerance_deg,
        )
        .with_collision(config.azimuth_collision)
        .with_key_decimals(config.azimuth_decimals)
    }

    /// Set how samples with equal azimuth are handled.
    pub fn with_collision(mut self, collision: AzimuthCollision) -> Self {
        self.collision = collision;
        self
    }

    /// Set the decimal precision of azimuth keys.
    pub fn with_key_decimals(mut self, decimals: u32) -> Self {
        self.key_decimals = decimals;
        self
    }

    /// Window width per quadrant, in one-degree bins.
    pub fn span(&self) -> u32 {
        self.span
    }

    /// Samples agreeing on the dominant orientation.
    pub fn dominant_orientation_cluster(&self, candidates: &[Sample]) -> Vec<Sample> {
        self.dominant_orientation(candidates).members
    }

    /// Dominant orientation cluster plus the winning window start.
    ///
    /// Ties keep the earliest window. Empty input gives an empty result.
    pub fn dominant_orientation(&self, candidates: &[Sample]) -> DominantOrientation {
        let _timer = OperationTimer::with_samples("dominant_orientation", candidates.len());
        let entries = self.azimuth_entries(candidates);
        if entries.is_empty() {
            return DominantOrientation::default();
        }

        let mut best: Vec<usize> = Vec::new();
        let mut best_start = None;

        for position in 0..WINDOW_POSITIONS {
            let _section = log_perf_section("histogram_window");
            let subset = self.window_members(&entries, position);
            trace!(
                target: "mesh_planes::histogram",
                position = position,
                members = subset.len(),
                "Window evaluated"
            );

            if subset.len() > best.len() {
                debug!(
                    target: "mesh_planes::histogram",
                    position = position,
                    members = subset.len(),
                    "New maximum window"
                );
                best = subset;
                best_start = Some(f64::from(position));
            }
        }

        best.sort_unstable();
        DominantOrientation {
            members: best.into_iter().map(|i| candidates[i]).collect(),
            window_start_deg: best_start,
        }
    }

    /// `(azimuth, candidate index)` pairs after applying the collision policy.
    ///
    /// Azimuths are rounded to the key precision; samples without a
    /// horizontal component are skipped.
    fn azimuth_entries(&self, candidates: &[Sample]) -> Vec<(f64, usize)> {
        let scale = 10f64.powi(self.key_decimals as i32);
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(candidates.len());

        for (i, sample) in candidates.iter().enumerate() {
            let Some(azimuth) = azimuth_deg(&sample.direction, &self.up, &self.reference) else {
                continue;
            };
            let key = quantize(azimuth, scale);

            if self.collision == AzimuthCollision::KeepFirst && !seen.insert(key) {
                continue;
            }
            entries.push((key as f64 / scale, i));
        }

        if entries.len() < candidates.len() {
            debug!(
                target: "mesh_planes::histogram",
                candidates = candidates.len(),
                kept = entries.len(),
                "Azimuth map dropped samples"
            );
        }
        entries
    }

    /// Candidate indices matched by the window starting at `position`.
    fn window_members(&self, entries: &[(f64, usize)], position: u32) -> Vec<usize> {
        let mut matched = vec![false; entries.len()];

        for quadrant in 0..4u32 {
            for offset in 0..self.span {
                let center = f64::from((quadrant * 90 + offset + position) % 360);
                for (slot, &(azimuth, _)) in entries.iter().enumerate() {
                    let d = circular_difference(azimuth, center);
                    if (-BAND_HALF_WIDTH_DEG..BAND_HALF_WIDTH_DEG).contains(&d) {
                        matched[slot] = true;
                    }
                }
            }
        }

        entries
            .iter()
            .zip(matched)
            .filter(|(_, hit)| *hit)
            .map(|(&(_, index), _)| index)
            .collect()
    }
}

impl Default for OrientationHistogram {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}
