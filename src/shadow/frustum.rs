//! Frustum slices
//!
//! [`FrustumCorners`] holds the near and far quads of one view-volume slice.
//! Both quads use the ring order bottom-left, bottom-right, top-right,
//! top-left; the bounds fitter and the light parameterization index into
//! them and rely on that order.

use glam::Vec3;

use crate::scene::CameraState;

/// Coordinate space a set of corners is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CornerSpace {
    World,
    LightLocal,
}

/// Near and far quads of a frustum slice (or of a fitted box).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumCorners {
    pub near: [Vec3; 4],
    pub far: [Vec3; 4],
    pub space: CornerSpace,
}

impl FrustumCorners {
    /// All 8 points, near quad first.
    pub fn points(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.near.iter().chain(self.far.iter()).copied()
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.points().all(Vec3::is_finite)
    }
}

/// World-space corners of the main camera's view volume between
/// `slice_near` and `slice_far`.
#[must_use]
pub fn compute_slice_corners(camera: &CameraState, slice_near: f32, slice_far: f32) -> FrustumCorners {
    FrustumCorners {
        near: camera.frustum_corners(slice_near),
        far: camera.frustum_corners(slice_far),
        space: CornerSpace::World,
    }
}
