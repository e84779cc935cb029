//! Angle and plane primitives shared by the classifier and the clustering passes.
//!
//! All angles are in degrees. Directions are normalized before use and a
//! (near-)zero-length vector has no angle to anything, so comparisons
//! involving one are never "in range".

use nalgebra::{Point3, Vector3};

/// Squared length below which a vector is treated as zero.
const ZERO_LENGTH_SQ: f64 = 1e-24;

/// Normalize `v`, or `None` if it has (near-)zero length.
#[inline]
pub fn try_normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let len_sq = v.norm_squared();
    if len_sq > ZERO_LENGTH_SQ && len_sq.is_finite() {
        Some(v / len_sq.sqrt())
    } else {
        None
    }
}

/// Unsigned angle between two directions in degrees, in `[0, 180]`.
///
/// Computed as `atan2(|a × b|, a · b)`, which is exactly symmetric in its
/// arguments and stable for nearly parallel vectors. Returns `None` when
/// either vector has zero length.
pub fn angle_deg(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<f64> {
    let a = try_normalize(a)?;
    let b = try_normalize(b)?;
    Some(a.cross(&b).norm().atan2(a.dot(&b)).to_degrees())
}

/// Whether `b` is aligned with the axis `a`, counting anti-parallel as aligned.
///
/// True iff the angle is defined and `angle <= tolerance_deg` or
/// `angle >= 180 - tolerance_deg`.
pub fn in_acceptable_range(a: &Vector3<f64>, b: &Vector3<f64>, tolerance_deg: f64) -> bool {
    match angle_deg(a, b) {
        Some(angle) => angle <= tolerance_deg || angle >= 180.0 - tolerance_deg,
        None => false,
    }
}

/// Whether `b` points within `tolerance_deg` of `a`. Anti-parallel does not count.
pub fn within_angle(a: &Vector3<f64>, b: &Vector3<f64>, tolerance_deg: f64) -> bool {
    angle_deg(a, b).is_some_and(|angle| angle <= tolerance_deg)
}

/// Remove the component of `direction` along the unit vector `up`.
#[inline]
pub fn horizontal_projection(direction: &Vector3<f64>, up: &Vector3<f64>) -> Vector3<f64> {
    direction - up * direction.dot(up)
}

/// Azimuth of `direction` around the unit `up` axis, in `[0, 360)`.
///
/// Measured counter-clockwise (right-hand rule about `up`) from `reference`,
/// which must be perpendicular to `up`. Returns `None` for directions with no
/// horizontal component.
pub fn azimuth_deg(
    direction: &Vector3<f64>,
    up: &Vector3<f64>,
    reference: &Vector3<f64>,
) -> Option<f64> {
    let projected = try_normalize(&horizontal_projection(direction, up))?;
    let reference = try_normalize(reference)?;

    let sin = reference.cross(&projected).dot(up);
    let cos = reference.dot(&projected);
    let degrees = sin.atan2(cos).to_degrees();

    Some(normalize_degrees(degrees))
}

/// Wrap an angle into `[0, 360)`.
#[inline]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed difference `a - b` wrapped into `[-180, 180)`.
#[inline]
pub fn circular_difference(a: f64, b: f64) -> f64 {
    (a - b + 180.0).rem_euclid(360.0) - 180.0
}

/// A plane in 3D space defined by a point and a unit normal.
///
/// The plane equation is `normal · (p - point) = 0`.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// A point on the plane.
    pub point: Point3<f64>,
    /// The plane normal (unit vector).
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Create a plane through `point` with the given normal.
    ///
    /// The normal is normalized; returns `None` if it has zero length.
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        try_normalize(&normal).map(|normal| Self { point, normal })
    }

    /// Signed distance from `point` to the plane.
    ///
    /// Positive on the side the normal points to.
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&(point - self.point))
    }

    /// Absolute distance from `point` to the plane.
    #[inline]
    pub fn distance(&self, point: &Point3<f64>) -> f64 {
        self.signed_distance(point).abs()
    }

    /// Whether `point` lies within `threshold` of the plane.
    #[inline]
    pub fn is_inlier(&self, point: &Point3<f64>, threshold: f64) -> bool {
        self.distance(point) <= threshold
    }
}
