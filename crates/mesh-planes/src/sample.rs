//! Surface samples and the tolerance-aware key used to de-duplicate them.

use nalgebra::{Point3, Vector3};

/// One world-space surface sample: where it is and which way the surface faces.
///
/// Produced once per scan pass from a mesh vertex (or triangle) and never
/// modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// World-space position.
    pub origin: Point3<f64>,
    /// Outward surface normal. Usually unit length, but not required.
    pub direction: Vector3<f64>,
}

impl Sample {
    /// Create a sample.
    #[inline]
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// Create a sample from raw coordinates.
    #[inline]
    pub fn from_coords(origin: [f64; 3], direction: [f64; 3]) -> Self {
        Self::new(
            Point3::new(origin[0], origin[1], origin[2]),
            Vector3::new(direction[0], direction[1], direction[2]),
        )
    }

    /// Hash key with origin and direction rounded to `decimals` decimal places.
    #[inline]
    pub fn key(&self, decimals: u32) -> SampleKey {
        SampleKey::new(self, decimals)
    }
}

/// Rounded, hashable identity of a [`Sample`].
///
/// Floating-point values are never hashed directly: each coordinate is
/// scaled by `10^decimals` and rounded to an integer, so samples that agree to
/// that precision collide. With 4 decimals and meter units, coordinates are
/// compared on a 0.1 mm grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleKey {
    origin: [i64; 3],
    direction: [i64; 3],
}

impl SampleKey {
    /// Build the key for `sample` at the given precision.
    pub fn new(sample: &Sample, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        let round = |v: f64| quantize(v, scale);
        Self {
            origin: [
                round(sample.origin.x),
                round(sample.origin.y),
                round(sample.origin.z),
            ],
            direction: [
                round(sample.direction.x),
                round(sample.direction.y),
                round(sample.direction.z),
            ],
        }
    }
}

/// Round `value * scale` to the nearest integer.
///
/// Saturates for out-of-range values and maps NaN to 0 (the behavior of
/// float-to-int `as` casts). `-0.0` and `0.0` both map to 0.
#[inline]
pub(crate) fn quantize(value: f64, scale: f64) -> i64 {
    (value * scale).round() as i64
}
