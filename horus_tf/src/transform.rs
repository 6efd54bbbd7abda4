//! Rigid-body transform math
//!
//! Translation is stored as `[x, y, z]`, rotation as a unit quaternion
//! `[x, y, z, w]`. The heavy lifting is delegated to nalgebra.

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D rigid transform (rotation followed by translation)
///
/// A transform stored for frame `child` with parent `parent` is the pose of
/// `child` expressed in `parent`: it maps points from `child` into `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation [x, y, z] in meters
    pub translation: [f64; 3],
    /// Rotation quaternion [x, y, z, w]
    pub rotation: [f64; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity transform
    pub fn identity() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Create a transform, normalizing the rotation
    pub fn new(translation: [f64; 3], rotation: [f64; 4]) -> Self {
        Self {
            translation,
            rotation,
        }
        .normalized()
    }

    /// Pure translation
    pub fn from_translation(translation: [f64; 3]) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Translation plus a rotation about Z
    pub fn from_translation_yaw(translation: [f64; 3], yaw: f64) -> Self {
        Self {
            translation,
            rotation: quaternion_from_yaw(yaw),
        }
    }

    /// Translation plus roll/pitch/yaw (radians)
    pub fn from_euler(translation: [f64; 3], roll: f64, pitch: f64, yaw: f64) -> Self {
        let q = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
        Self {
            translation,
            rotation: [q.i, q.j, q.k, q.w],
        }
    }

    /// Convert to a nalgebra isometry
    pub fn to_isometry(&self) -> Isometry3<f64> {
        let [x, y, z] = self.translation;
        Isometry3::from_parts(Translation3::new(x, y, z), unit_quaternion(self.rotation))
    }

    /// Convert from a nalgebra isometry
    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        let t = iso.translation.vector;
        let q = iso.rotation;
        Self {
            translation: [t.x, t.y, t.z],
            rotation: [q.i, q.j, q.k, q.w],
        }
    }

    /// `self * other`: apply `other` first, then `self`
    pub fn compose(&self, other: &Transform) -> Transform {
        Self::from_isometry(&(self.to_isometry() * other.to_isometry()))
    }

    /// Inverse transform
    pub fn inverse(&self) -> Transform {
        Self::from_isometry(&self.to_isometry().inverse())
    }

    /// Transform a point
    pub fn transform_point(&self, point: [f64; 3]) -> [f64; 3] {
        let p = self
            .to_isometry()
            .transform_point(&nalgebra::Point3::new(point[0], point[1], point[2]));
        [p.x, p.y, p.z]
    }

    /// Rotate a vector (translation ignored)
    pub fn transform_vector(&self, vector: [f64; 3]) -> [f64; 3] {
        let v = unit_quaternion(self.rotation) * Vector3::new(vector[0], vector[1], vector[2]);
        [v.x, v.y, v.z]
    }

    /// Rotate an orientation quaternion `[x, y, z, w]`
    pub fn transform_orientation(&self, orientation: [f64; 4]) -> [f64; 4] {
        let q = unit_quaternion(self.rotation) * unit_quaternion(orientation);
        [q.i, q.j, q.k, q.w]
    }

    /// Linear interpolation of translation, SLERP of rotation
    pub fn interpolate(&self, other: &Transform, t: f64) -> Transform {
        let t = t.clamp(0.0, 1.0);
        let mut translation = [0.0; 3];
        for (i, out) in translation.iter_mut().enumerate() {
            *out = self.translation[i] + (other.translation[i] - self.translation[i]) * t;
        }

        let qa = unit_quaternion(self.rotation);
        let qb = unit_quaternion(other.rotation);
        // Falls back to nlerp for nearly identical rotations
        let q = qa.try_slerp(&qb, t, 1e-9).unwrap_or_else(|| qa.nlerp(&qb, t));

        Transform {
            translation,
            rotation: [q.i, q.j, q.k, q.w],
        }
    }

    /// Rotation about Z (radians)
    pub fn yaw(&self) -> f64 {
        yaw_from_quaternion(self.rotation)
    }

    /// Whether this transform is the identity within `epsilon`
    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.translation.iter().all(|v| v.abs() < epsilon)
            && unit_quaternion(self.rotation).angle() < epsilon
    }

    /// Copy with a unit-length rotation
    pub fn normalized(&self) -> Transform {
        let q = unit_quaternion(self.rotation);
        Transform {
            translation: self.translation,
            rotation: [q.i, q.j, q.k, q.w],
        }
    }
}

/// Quaternion `[x, y, z, w]` for a pure rotation about Z
pub fn quaternion_from_yaw(yaw: f64) -> [f64; 4] {
    let half = yaw * 0.5;
    [0.0, 0.0, half.sin(), half.cos()]
}

/// Yaw of an orientation quaternion `[x, y, z, w]`
pub fn yaw_from_quaternion(q: [f64; 4]) -> f64 {
    let (_, _, yaw) = unit_quaternion(q).euler_angles();
    yaw
}

/// Build a normalized nalgebra quaternion, treating a zero quaternion as identity
fn unit_quaternion(q: [f64; 4]) -> UnitQuaternion<f64> {
    let raw = Quaternion::new(q[3], q[0], q[1], q[2]);
    if raw.norm_squared() < 1e-12 {
        UnitQuaternion::identity()
    } else {
        UnitQuaternion::from_quaternion(raw)
    }
}
