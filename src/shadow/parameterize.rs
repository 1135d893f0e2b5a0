//! Cascade light-camera parameterization
//!
//! Turns a fitted light-local box into the pose and orthographic extents of
//! the light camera that renders the cascade.
//!
//! The box is measured against the pose of the *previous* frame, and the new
//! position is the box's near-face center mapped back to world space through
//! that same previous pose. Rendering therefore uses this frame's pose with
//! extents measured one frame earlier; for a static camera the pose
//! converges after one frame.

use glam::{Mat4, Quat};

use super::frustum::{CornerSpace, FrustumCorners};
use crate::scene::LightPose;

/// Smallest width, height and depth range a cascade volume may have.
pub const MIN_EXTENT: f32 = 1e-4;

/// Orthographic intrinsics of a cascade's light camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoExtents {
    /// Near plane depth along the light direction.
    pub near: f32,
    /// Far plane depth along the light direction.
    pub far: f32,
    /// Width / height of the view volume.
    pub aspect: f32,
    /// Half of the view volume height.
    pub half_size: f32,
}

impl OrthoExtents {
    #[inline]
    #[must_use]
    pub fn half_width(&self) -> f32 {
        self.half_size * self.aspect
    }

    /// Right-handed orthographic projection with an OpenGL `[-1, 1]` depth
    /// range. Backend conventions are applied by
    /// [`ClipSpace::gpu_projection`](super::ClipSpace::gpu_projection).
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        let w = self.half_width();
        let h = self.half_size;
        Mat4::orthographic_rh_gl(-w, w, -h, h, self.near, self.far)
    }
}

/// Pose and intrinsics of one cascade's light camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightCameraParams {
    pub pose: LightPose,
    pub extents: OrthoExtents,
    /// `true` when a degenerate box had to be widened to [`MIN_EXTENT`].
    pub clamped: bool,
}

/// Derives the light camera for one cascade.
///
/// - `bounds`: light-local box from
///   [`fit_light_space_bounds`](super::fit_light_space_bounds)
/// - `light_rotation`: current world orientation of the light
/// - `previous`: the pose `bounds` was measured against
#[must_use]
pub fn parameterize_cascade(
    bounds: &FrustumCorners,
    light_rotation: Quat,
    previous: &LightPose,
) -> LightCameraParams {
    debug_assert_eq!(bounds.space, CornerSpace::LightLocal);
    let [n0, n1, n2, _] = bounds.near;

    let width = (n0 - n1).length();
    let height = (n1 - n2).length();
    let near = n0.z;
    let mut far = bounds.far[0].z;

    let too_small = |v: f32| v.is_nan() || v < MIN_EXTENT;
    let mut clamped = too_small(width) || too_small(height);
    // `f32::max` drops NaN, so NaN extents also end up at MIN_EXTENT.
    let width = width.max(MIN_EXTENT);
    let height = height.max(MIN_EXTENT);
    if too_small(far - near) {
        clamped = true;
        far = near + MIN_EXTENT;
    }

    let center = n0 + (n2 - n0) * 0.5;

    LightCameraParams {
        pose: LightPose::new(previous.to_world(center), light_rotation),
        extents: OrthoExtents {
            near,
            far,
            aspect: width / height,
            half_size: height * 0.5,
        },
        clamped,
    }
}
