//! Orientation classification of surface samples.
//!
//! Every sample falls into exactly one [`OrientationClass`]. Checks run in a
//! fixed order and the first match wins:
//!
//! 1. Direction within tolerance of the up axis → `Up`
//! 2. Within tolerance of the down axis → `Down`
//! 3. Direction in range of its own horizontal projection → `HorizontalCandidate`
//! 4. Anything else (oblique or zero-length) → `Discard`
//!
//! The vertical checks are one-sided so that floors and ceilings land in
//! different classes. The horizontal check uses [`in_acceptable_range`],
//! where a direction and its opposite count as aligned.

use hashbrown::HashSet;
use nalgebra::Vector3;

use crate::config::AnalyzerConfig;
use crate::geometry::{horizontal_projection, in_acceptable_range, try_normalize, within_angle};
use crate::sample::{Sample, SampleKey};

/// Orientation class of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrientationClass {
    /// Aligned with the up axis (ceiling or floor surface).
    Up,
    /// Aligned with the down axis.
    Down,
    /// Nearly horizontal normal: a wall candidate.
    HorizontalCandidate,
    /// Oblique or degenerate; not used further.
    Discard,
}

/// Classifies sample directions against the up/down axes.
#[derive(Debug, Clone)]
pub struct NormalClassifier {
    up: Vector3<f64>,
    down: Vector3<f64>,
    tolerance_deg: f64,
}

impl NormalClassifier {
    /// Create a classifier for the given up axis and vertical tolerance.
    ///
    /// The axis is normalized. A zero axis classifies everything as `Discard`.
    pub fn new(up_axis: Vector3<f64>, tolerance_deg: f64) -> Self {
        let up = try_normalize(&up_axis).unwrap_or_else(Vector3::zeros);
        Self {
            up,
            down: -up,
            tolerance_deg,
        }
    }

    /// Create a classifier from an analysis configuration.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.up_axis, config.thresholds.vertical_tolerance_deg)
    }

    /// The normalized up axis.
    pub fn up_axis(&self) -> &Vector3<f64> {
        &self.up
    }

    /// Classify a direction.
    pub fn classify(&self, direction: &Vector3<f64>) -> OrientationClass {
        if within_angle(&self.up, direction, self.tolerance_deg) {
            OrientationClass::Up
        } else if within_angle(&self.down, direction, self.tolerance_deg) {
            OrientationClass::Down
        } else if in_acceptable_range(
            &horizontal_projection(direction, &self.up),
            direction,
            self.tolerance_deg,
        ) {
            OrientationClass::HorizontalCandidate
        } else {
            OrientationClass::Discard
        }
    }

    /// Classify a sample by its direction.
    #[inline]
    pub fn classify_sample(&self, sample: &Sample) -> OrientationClass {
        self.classify(&sample.direction)
    }

    /// Classify `sample` and record it in `samples`.
    pub fn classify_into(&self, samples: &mut ClassifiedSamples, sample: Sample) -> OrientationClass {
        let class = self.classify_sample(&sample);
        samples.insert(class, sample);
        class
    }
}

/// Per-class containers filled during a scan pass.
///
/// With de-duplication enabled, a sample whose [`SampleKey`] was already
/// recorded in the same class is dropped. Discarded samples never claim a
/// key, and samples that round together but straddle a class boundary stay
/// in their own classes. Only exact repeats (same rounded origin and
/// direction) collide; wall samples that share a normal but sit at different
/// positions are all kept. Insertion order is preserved.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedSamples {
    up: Vec<Sample>,
    down: Vec<Sample>,
    horizontal: Vec<Sample>,
    discarded: usize,
    duplicates: usize,
    dedup_decimals: Option<u32>,
    seen: HashSet<(OrientationClass, SampleKey)>,
}

impl ClassifiedSamples {
    /// Create empty containers. `dedup_decimals = None` keeps every sample.
    pub fn new(dedup_decimals: Option<u32>) -> Self {
        Self {
            dedup_decimals,
            ..Self::default()
        }
    }

    /// Record a classified sample. Returns `false` if it was dropped as a
    /// duplicate or discarded.
    pub fn insert(&mut self, class: OrientationClass, sample: Sample) -> bool {
        let bucket = match class {
            OrientationClass::Up => &mut self.up,
            OrientationClass::Down => &mut self.down,
            OrientationClass::HorizontalCandidate => &mut self.horizontal,
            OrientationClass::Discard => {
                self.discarded += 1;
                return false;
            }
        };

        if let Some(decimals) = self.dedup_decimals {
            if !self.seen.insert((class, sample.key(decimals))) {
                self.duplicates += 1;
                return false;
            }
        }

        bucket.push(sample);
        true
    }

    /// Append everything from `other`, in order, applying this container's
    /// de-duplication.
    pub fn merge(&mut self, other: ClassifiedSamples) {
        self.discarded += other.discarded;
        self.duplicates += other.duplicates;

        for sample in other.up {
            self.insert(OrientationClass::Up, sample);
        }
        for sample in other.down {
            self.insert(OrientationClass::Down, sample);
        }
        for sample in other.horizontal {
            self.insert(OrientationClass::HorizontalCandidate, sample);
        }
    }

    /// Up-facing samples.
    pub fn up(&self) -> &[Sample] {
        &self.up
    }

    /// Down-facing samples.
    pub fn down(&self) -> &[Sample] {
        &self.down
    }

    /// Wall candidates.
    pub fn horizontal(&self) -> &[Sample] {
        &self.horizontal
    }

    /// Number of samples classified as `Discard`.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Number of samples dropped as duplicates.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Total number of kept samples.
    pub fn len(&self) -> usize {
        self.up.len() + self.down.len() + self.horizontal.len()
    }

    /// Whether no sample was kept.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split into (up, down, horizontal).
    pub fn into_parts(self) -> (Vec<Sample>, Vec<Sample>, Vec<Sample>) {
        (self.up, self.down, self.horizontal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn classifier() -> NormalClassifier {
        NormalClassifier::new(Vector3::y(), 20.0)
    }

    #[test]
    fn test_exact_axes() {
        let c = classifier();
        assert_eq!(c.classify(&Vector3::y()), OrientationClass::Up);
        assert_eq!(c.classify(&-Vector3::y()), OrientationClass::Down);
        assert_eq!(c.classify(&Vector3::x()), OrientationClass::HorizontalCandidate);
        assert_eq!(c.classify(&-Vector3::z()), OrientationClass::HorizontalCandidate);
    }

    #[test]
    fn test_tilted_floor_is_down() {
        let c = classifier();
        assert_eq!(c.classify(&Vector3::new(0.1, -1.0, 0.0)), OrientationClass::Down);
        assert_eq!(c.classify(&Vector3::new(0.0, 3.0, 0.2)), OrientationClass::Up);
    }

    #[test]
    fn test_tolerance_boundaries() {
        let c = classifier();
        let tilt = |deg: f64| {
            let r = deg.to_radians();
            Vector3::new(r.sin(), r.cos(), 0.0)
        };
        assert_eq!(c.classify(&tilt(19.0)), OrientationClass::Up);
        assert_eq!(c.classify(&tilt(45.0)), OrientationClass::Discard);
        assert_eq!(c.classify(&tilt(71.0)), OrientationClass::HorizontalCandidate);
        assert_eq!(c.classify(&tilt(109.0)), OrientationClass::HorizontalCandidate);
        assert_eq!(c.classify(&tilt(161.0)), OrientationClass::Down);
    }

    #[test]
    fn test_zero_direction_is_discarded() {
        assert_eq!(classifier().classify(&Vector3::zeros()), OrientationClass::Discard);
    }

    #[test]
    fn test_z_up_classifier() {
        let c = NormalClassifier::new(Vector3::new(0.0, 0.0, 2.0), 20.0);
        assert_eq!(c.classify(&Vector3::z()), OrientationClass::Up);
        assert_eq!(c.classify(&Vector3::y()), OrientationClass::HorizontalCandidate);
        assert!((c.up_axis().norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_classify_into_dedup() {
        let c = classifier();
        let mut samples = ClassifiedSamples::new(Some(4));
        let wall = Sample::new(Point3::new(1.0, 0.0, 0.0), Vector3::x());

        assert_eq!(c.classify_into(&mut samples, wall), OrientationClass::HorizontalCandidate);
        c.classify_into(&mut samples, wall);
        c.classify_into(&mut samples, Sample::new(Point3::new(1.0, 1.0, 0.0), Vector3::x()));
        c.classify_into(&mut samples, Sample::new(Point3::origin(), Vector3::y()));
        c.classify_into(&mut samples, Sample::new(Point3::origin(), Vector3::new(1.0, 1.0, 0.0)));

        assert_eq!(samples.horizontal().len(), 2);
        assert_eq!(samples.up().len(), 1);
        assert_eq!(samples.duplicates(), 1);
        assert_eq!(samples.discarded(), 1);
        assert_eq!(samples.len(), 3);
    }

    #[test]
    fn test_no_dedup_keeps_repeats() {
        let mut samples = ClassifiedSamples::new(None);
        let s = Sample::new(Point3::origin(), Vector3::x());
        assert!(samples.insert(OrientationClass::HorizontalCandidate, s));
        assert!(samples.insert(OrientationClass::HorizontalCandidate, s));
        assert_eq!(samples.horizontal().len(), 2);
    }

    #[test]
    fn test_merge_preserves_order_and_dedup() {
        let a_sample = Sample::new(Point3::new(0.0, 0.0, 0.0), Vector3::x());
        let b_sample = Sample::new(Point3::new(0.0, 1.0, 0.0), Vector3::x());

        let mut a = ClassifiedSamples::new(Some(4));
        a.insert(OrientationClass::HorizontalCandidate, a_sample);

        let mut b = ClassifiedSamples::new(Some(4));
        b.insert(OrientationClass::HorizontalCandidate, a_sample);
        b.insert(OrientationClass::HorizontalCandidate, b_sample);

        a.merge(b);
        assert_eq!(a.horizontal(), &[a_sample, b_sample]);
        assert_eq!(a.duplicates(), 1);
    }

    /// Direction tilted `deg` degrees above the horizontal +X axis.
    fn above_horizontal(deg: f64) -> Vector3<f64> {
        let r = deg.to_radians();
        Vector3::new(r.cos(), r.sin(), 0.0)
    }

    #[test]
    fn test_discard_does_not_shadow_wall_candidate() {
        // Both round to the same key at 4 decimals but sit on either side of
        // the horizontal tolerance
        let c = classifier();
        let oblique = Sample::new(Point3::origin(), above_horizontal(20.00004));
        let wall = Sample::new(Point3::origin(), above_horizontal(19.99996));
        assert_eq!(oblique.key(4), wall.key(4));

        let mut samples = ClassifiedSamples::new(Some(4));
        assert_eq!(c.classify_into(&mut samples, oblique), OrientationClass::Discard);
        assert_eq!(
            c.classify_into(&mut samples, wall),
            OrientationClass::HorizontalCandidate
        );

        assert_eq!(samples.horizontal(), &[wall]);
        assert_eq!(samples.discarded(), 1);
        assert_eq!(samples.duplicates(), 0);
    }

    #[test]
    fn test_same_key_across_classes_kept_in_both() {
        // With a 45 degree tolerance the Up and wall bands touch
        let c = NormalClassifier::new(Vector3::y(), 45.0);
        let up = Sample::new(Point3::origin(), above_horizontal(45.00001));
        let wall = Sample::new(Point3::origin(), above_horizontal(44.99999));
        assert_eq!(up.key(4), wall.key(4));

        let mut samples = ClassifiedSamples::new(Some(4));
        assert_eq!(c.classify_into(&mut samples, up), OrientationClass::Up);
        assert_eq!(
            c.classify_into(&mut samples, wall),
            OrientationClass::HorizontalCandidate
        );

        assert_eq!(samples.up(), &[up]);
        assert_eq!(samples.horizontal(), &[wall]);
        assert_eq!(samples.duplicates(), 0);
    }
}
