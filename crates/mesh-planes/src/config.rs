//! Analysis configuration.
//!
//! All parameters have defaults matching a room scan in meter units with a
//! Y-up world (the convention of common AR/VR engines). Values are checked
//! once, up front, by [`AnalyzerConfig::validate`]; the algorithms themselves
//! assume a valid configuration.
//!
//! # Example
//!
//! ```
//! use mesh_planes::{AnalyzerConfig, AngleThresholds};
//!
//! let config = AnalyzerConfig::default()
//!     .with_target_plane_count(6)
//!     .with_thresholds(AngleThresholds::new(15.0, 0.03));
//! assert!(config.validate().is_ok());
//!
//! let bad = AnalyzerConfig::default().with_target_plane_count(0);
//! assert!(bad.validate().is_err());
//! ```

use std::time::Duration;

use nalgebra::Vector3;

use crate::error::{PlaneError, PlaneResult};

/// Highest supported rounding precision for sample and azimuth keys.
pub const MAX_DEDUP_DECIMALS: u32 = 12;

/// Angular and distance tolerances for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct AngleThresholds {
    /// Maximum deviation (degrees) from the up/down axis for a sample to be
    /// classified as floor- or ceiling-facing, and from the horizontal plane
    /// for a wall candidate.
    ///
    /// Also sets the per-quadrant window span of the orientation histogram.
    ///
    /// Default: `20.0`
    pub vertical_tolerance_deg: f64,

    /// Maximum distance from a seed plane for a sample to count as co-planar.
    ///
    /// Default: `0.05` (5 cm in meter units)
    pub planar_distance_tolerance: f64,

    /// Maximum angle (degrees) between two directions for them to count as
    /// co-oriented. Anti-parallel directions are co-oriented as well.
    ///
    /// Default: same as `vertical_tolerance_deg`
    pub parallel_tolerance_deg: f64,
}

impl Default for AngleThresholds {
    fn default() -> Self {
        Self::new(20.0, 0.05)
    }
}

impl AngleThresholds {
    /// Create thresholds where the parallel tolerance reuses the vertical one.
    pub fn new(vertical_tolerance_deg: f64, planar_distance_tolerance: f64) -> Self {
        Self {
            vertical_tolerance_deg,
            planar_distance_tolerance,
            parallel_tolerance_deg: vertical_tolerance_deg,
        }
    }

    /// Override the co-orientation tolerance.
    pub fn with_parallel_tolerance(mut self, degrees: f64) -> Self {
        self.parallel_tolerance_deg = degrees;
        self
    }

    /// Check that every tolerance is finite and within range.
    pub fn validate(&self) -> PlaneResult<()> {
        check_angle("vertical_tolerance_deg", self.vertical_tolerance_deg)?;
        check_angle("parallel_tolerance_deg", self.parallel_tolerance_deg)?;
        check_non_negative("planar_distance_tolerance", self.planar_distance_tolerance)
    }
}

/// Which mesh elements become samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum SampleSource {
    /// One sample per vertex: position and recomputed vertex normal.
    #[default]
    Vertices,
    /// One sample per triangle: centroid and face normal.
    Faces,
}

/// What the orientation histogram does when two samples share an azimuth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum AzimuthCollision {
    /// Keep only the first sample seen at each azimuth.
    #[default]
    KeepFirst,
    /// Keep every sample. Clusters grow with sample density instead of
    /// counting distinct azimuths.
    KeepAll,
}

/// Full configuration for a plane detection session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct AnalyzerConfig {
    /// Minimum scan time before analysis starts, in seconds.
    ///
    /// Default: `30.0`
    pub scan_duration_secs: f64,

    /// Number of wall planes to extract.
    ///
    /// Default: `4`
    pub target_plane_count: usize,

    /// Angular and distance tolerances.
    pub thresholds: AngleThresholds,

    /// World up direction. Ceiling-facing normals point along it.
    ///
    /// Default: `+Y`
    pub up_axis: Vector3<f64>,

    /// Horizontal axis that azimuths are measured from. Must be
    /// perpendicular to `up_axis`.
    ///
    /// Default: `+Z`
    pub reference_axis: Vector3<f64>,

    /// Decimal places used to de-duplicate classified samples, or `None` to
    /// keep every sample.
    ///
    /// Default: `Some(4)`
    pub dedup_decimals: Option<u32>,

    /// Decimal places (in degrees) azimuths are rounded to before the
    /// orientation histogram compares them. Independent of
    /// `dedup_decimals`, which is a length precision.
    ///
    /// Default: `4`
    pub azimuth_decimals: u32,

    /// Collision handling in the orientation histogram.
    ///
    /// Default: [`AzimuthCollision::KeepFirst`]
    pub azimuth_collision: AzimuthCollision,

    /// Which mesh elements become samples.
    ///
    /// Default: [`SampleSource::Vertices`]
    pub sample_source: SampleSource,

    /// Use the rayon thread pool for classification and cluster scoring.
    /// Results are identical to the sequential run.
    ///
    /// Default: `false`
    pub parallel: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            scan_duration_secs: 30.0,
            target_plane_count: 4,
            thresholds: AngleThresholds::default(),
            up_axis: Vector3::y(),
            reference_axis: Vector3::z(),
            dedup_decimals: Some(4),
            azimuth_decimals: 4,
            azimuth_collision: AzimuthCollision::KeepFirst,
            sample_source: SampleSource::Vertices,
            parallel: false,
        }
    }
}

impl AnalyzerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for Z-up data (CAD exports, most scanners' native frame).
    ///
    /// Azimuths are measured from `+Y`.
    pub fn for_z_up() -> Self {
        Self {
            up_axis: Vector3::z(),
            reference_axis: Vector3::y(),
            ..Self::default()
        }
    }

    /// Minimum scan time as a [`Duration`].
    ///
    /// Call [`AnalyzerConfig::validate`] first; invalid values saturate.
    pub fn scan_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.scan_duration_secs).unwrap_or(Duration::MAX)
    }

    /// Set the minimum scan time.
    pub fn with_scan_duration(mut self, duration: Duration) -> Self {
        self.scan_duration_secs = duration.as_secs_f64();
        self
    }

    /// Set the number of planes to extract.
    pub fn with_target_plane_count(mut self, count: usize) -> Self {
        self.target_plane_count = count;
        self
    }

    /// Set the tolerances.
    pub fn with_thresholds(mut self, thresholds: AngleThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the up and azimuth reference axes.
    pub fn with_axes(mut self, up: Vector3<f64>, reference: Vector3<f64>) -> Self {
        self.up_axis = up;
        self.reference_axis = reference;
        self
    }

    /// Set the de-duplication precision (`None` disables de-duplication).
    pub fn with_dedup_decimals(mut self, decimals: Option<u32>) -> Self {
        self.dedup_decimals = decimals;
        self
    }

    /// Set the azimuth rounding precision of the orientation histogram.
    pub fn with_azimuth_decimals(mut self, decimals: u32) -> Self {
        self.azimuth_decimals = decimals;
        self
    }

    /// Set the azimuth collision policy.
    pub fn with_azimuth_collision(mut self, policy: AzimuthCollision) -> Self {
        self.azimuth_collision = policy;
        self
    }

    /// Set which mesh elements become samples.
    pub fn with_sample_source(mut self, source: SampleSource) -> Self {
        self.sample_source = source;
        self
    }

    /// Enable or disable rayon parallelism.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PlaneError::InvalidConfig`] naming the first offending
    /// parameter.
    pub fn validate(&self) -> PlaneResult<()> {
        self.thresholds.validate()?;
        check_non_negative("scan_duration_secs", self.scan_duration_secs)?;

        if self.target_plane_count == 0 {
            return Err(PlaneError::invalid_config(
                "target_plane_count",
                self.target_plane_count,
                "must be at least 1",
            ));
        }

        let up = check_axis("up_axis", &self.up_axis)?;
        let reference = check_axis("reference_axis", &self.reference_axis)?;
        if up.dot(&reference).abs() > 1e-6 {
            return Err(PlaneError::invalid_config(
                "reference_axis",
                format_vector(&self.reference_axis),
                "must be perpendicular to up_axis",
            ));
        }

        if self.azimuth_decimals > MAX_DEDUP_DECIMALS {
            return Err(PlaneError::invalid_config(
                "azimuth_decimals",
                self.azimuth_decimals,
                format!("must be at most {}", MAX_DEDUP_DECIMALS),
            ));
        }

        if let Some(decimals) = self.dedup_decimals {
            if decimals > MAX_DEDUP_DECIMALS {
                return Err(PlaneError::invalid_config(
                    "dedup_decimals",
                    decimals,
                    format!("must be at most {}", MAX_DEDUP_DECIMALS),
                ));
            }
        }

        Ok(())
    }

    /// Load configuration from a JSON string. Missing fields take defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize to a JSON string.
    #[cfg(feature = "config")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn check_angle(parameter: &'static str, degrees: f64) -> PlaneResult<()> {
    if !degrees.is_finite() || !(0.0..=90.0).contains(&degrees) {
        return Err(PlaneError::invalid_config(
            parameter,
            degrees,
            "must be within [0, 90] degrees",
        ));
    }
    Ok(())
}

fn check_non_negative(parameter: &'static str, value: f64) -> PlaneResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PlaneError::invalid_config(
            parameter,
            value,
            "must be finite and non-negative",
        ));
    }
    Ok(())
}

fn check_axis(parameter: &'static str, axis: &Vector3<f64>) -> PlaneResult<Vector3<f64>> {
    crate::geometry::try_normalize(axis).ok_or_else(|| {
        PlaneError::invalid_config(
            parameter,
            format_vector(axis),
            "must be a finite, non-zero vector",
        )
    })
}

fn format_vector(v: &Vector3<f64>) -> String {
    format!("({}, {}, {})", v.x, v.y, v.z)
}
