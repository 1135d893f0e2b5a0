use glam::{Affine3A, Mat4, Quat, Vec3};

use super::camera::rotation_looking_to;

/// A directional light.
///
/// Only the orientation matters for shadow casting: the light shines along
/// its local `-Z` axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub rotation: Quat,
}

impl DirectionalLight {
    #[must_use]
    pub fn new(rotation: Quat) -> Self {
        Self { rotation }
    }

    /// Creates a light shining along `direction`.
    ///
    /// A zero-length direction falls back to `-Z`.
    #[must_use]
    pub fn from_direction(direction: Vec3) -> Self {
        let safe_dir = if direction.length_squared() > 1e-6 {
            direction.normalize()
        } else {
            -Vec3::Z
        };
        let up = if safe_dir.y.abs() > 0.99 {
            Vec3::X
        } else {
            Vec3::Y
        };
        Self {
            rotation: rotation_looking_to(safe_dir, up),
        }
    }

    /// World-space direction the light is shining in.
    #[inline]
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }
}

/// World pose of a shadow-casting light camera.
///
/// Defines the light-local frame: origin at `position`, `x` right, `y` up,
/// and `z` the depth along the light direction (growing away from the
/// light), so that visible points have positive local `z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl LightPose {
    #[must_use]
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// World point → light-local point.
    #[inline]
    #[must_use]
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        let view = self.rotation.inverse() * (world - self.position);
        Vec3::new(view.x, view.y, -view.z)
    }

    /// Light-local point → world point.
    #[inline]
    #[must_use]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * Vec3::new(local.x, local.y, -local.z)
    }

    /// Right-handed world-to-view matrix of the light camera.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from(Affine3A::from_rotation_translation(self.rotation, self.position).inverse())
    }
}
