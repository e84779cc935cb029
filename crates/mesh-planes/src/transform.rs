//! Local-to-world placement of mesh fragments.

use nalgebra::{Point3, UnitQuaternion, Vector3};

/// A rigid transformation: rotation followed by translation.
///
/// Points are rotated, then translated. Directions are only rotated, so
/// normals stay consistent with the points they belong to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    /// Rotation quaternion.
    pub rotation: UnitQuaternion<f64>,
    /// Translation vector.
    pub translation: Vector3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// Create an identity transformation.
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Create a pure translation.
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Create a pure rotation.
    pub fn from_rotation(rotation: UnitQuaternion<f64>) -> Self {
        Self {
            rotation,
            ..Self::identity()
        }
    }

    /// Create a transformation from rotation and translation.
    pub fn from_rotation_translation(
        rotation: UnitQuaternion<f64>,
        translation: Vector3<f64>,
    ) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Apply the transformation to a point.
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    /// Rotate a direction into world space.
    ///
    /// Translation does not apply; the length of the input is kept.
    pub fn transform_direction(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * direction
    }
}
