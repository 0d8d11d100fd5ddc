//! Math utilities and types
//!
//! Provides the math types shared by the scene model and the plugin
//! attribute values (colors, vectors and 4x4 transforms).

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position, rotation and scale
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Interpolate between two transforms
    ///
    /// Position and scale are interpolated linearly, rotation spherically.
    /// `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, other: &Transform, t: f32) -> Transform {
        let t = t.clamp(0.0, 1.0);
        Transform {
            position: self.position.lerp(&other.position, t),
            rotation: self
                .rotation
                .try_slerp(&other.rotation, t, f32::EPSILON)
                .unwrap_or(if t < 0.5 { self.rotation } else { other.rotation }),
            scale: self.scale.lerp(&other.scale, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_matrix() {
        assert_relative_eq!(Transform::identity().to_matrix(), Mat4::identity());
    }

    #[test]
    fn test_translation_in_last_column() {
        let matrix = Transform::from_position(Vec3::new(1.0, 2.0, 3.0)).to_matrix();
        assert_relative_eq!(matrix.m14, 1.0);
        assert_relative_eq!(matrix.m24, 2.0);
        assert_relative_eq!(matrix.m34, 3.0);
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = Transform::from_position(Vec3::zeros());
        let b = Transform::new(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::identity(),
            Vec3::new(3.0, 3.0, 3.0),
        );

        let mid = a.lerp(&b, 0.5);
        assert_relative_eq!(mid.position, Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(mid.scale, Vec3::new(2.0, 2.0, 2.0), epsilon = 1e-6);
    }

    #[test]
    fn test_lerp_clamps_factor() {
        let a = Transform::from_position(Vec3::zeros());
        let b = Transform::from_position(Vec3::new(4.0, 0.0, 0.0));
        assert_relative_eq!(a.lerp(&b, 2.0).position, b.position, epsilon = 1e-6);
    }
}
