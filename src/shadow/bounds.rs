//! Light-space bounds fitting
//!
//! Re-expresses a world-space frustum slice in the light-local frame of a
//! cascade and encloses it in the minimal axis-aligned box of that frame.
//! The result is a box, not a frustum: its near quad lies at `z = min_z`
//! and its far quad at `z = max_z`.

use glam::Vec3;

use super::frustum::{CornerSpace, FrustumCorners};
use crate::scene::LightPose;

/// Axis-aligned box in light-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpaceBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl LightSpaceBox {
    /// Minimal box enclosing `points`.
    ///
    /// Returns an inverted box (`min = +MAX`, `max = -MAX`) for an empty
    /// iterator.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for p in points {
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns `true` if `point` lies inside the box, with `epsilon` slack
    /// on every face.
    #[must_use]
    pub fn contains(&self, point: Vec3, epsilon: f32) -> bool {
        point.cmpge(self.min - Vec3::splat(epsilon)).all()
            && point.cmple(self.max + Vec3::splat(epsilon)).all()
    }

    /// The box as a near quad at `min.z` and a far quad at `max.z`.
    #[must_use]
    pub fn corners(&self) -> FrustumCorners {
        let Self { min, max } = *self;
        FrustumCorners {
            near: [
                Vec3::new(min.x, min.y, min.z),
                Vec3::new(max.x, min.y, min.z),
                Vec3::new(max.x, max.y, min.z),
                Vec3::new(min.x, max.y, min.z),
            ],
            far: [
                Vec3::new(min.x, min.y, max.z),
                Vec3::new(max.x, min.y, max.z),
                Vec3::new(max.x, max.y, max.z),
                Vec3::new(min.x, max.y, max.z),
            ],
            space: CornerSpace::LightLocal,
        }
    }
}

/// Transforms world-space `slice` corners into the light-local frame of
/// `pose`.
#[must_use]
pub fn to_light_local(slice: &FrustumCorners, pose: &LightPose) -> FrustumCorners {
    debug_assert_eq!(slice.space, CornerSpace::World);
    FrustumCorners {
        near: slice.near.map(|p| pose.to_local(p)),
        far: slice.far.map(|p| pose.to_local(p)),
        space: CornerSpace::LightLocal,
    }
}

/// Fits the light-local axis-aligned box around a world-space slice.
///
/// `pose` is the cascade's light camera pose from the previous frame (or
/// its initial placement on the first frame).
#[must_use]
pub fn fit_light_space_bounds(slice: &FrustumCorners, pose: &LightPose) -> FrustumCorners {
    let local = to_light_local(slice, pose);
    LightSpaceBox::from_points(local.points()).corners()
}
