//! World-to-shadow matrix composition

use glam::Mat4;

use super::clip_space::ClipSpace;
use super::parameterize::LightCameraParams;

/// Matrices of one cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMatrices {
    /// World → light view.
    pub view: Mat4,
    /// Light view → backend clip space.
    pub projection: Mat4,
    /// World → shadow-map texture coordinates and stored depth.
    pub world_to_shadow: Mat4,
}

/// Builds the view, projection and world-to-shadow matrices for a cascade.
///
/// `world_to_shadow = bias · gpu_projection · view`.
#[must_use]
pub fn build_shadow_matrices(params: &LightCameraParams, clip_space: &ClipSpace) -> ShadowMatrices {
    let view = params.pose.view_matrix();
    let projection = clip_space.gpu_projection(params.extents.projection());
    ShadowMatrices {
        view,
        projection,
        world_to_shadow: clip_space.bias_matrix() * projection * view,
    }
}

/// Shorthand for [`build_shadow_matrices`]`(..).world_to_shadow`.
#[inline]
#[must_use]
pub fn build_world_to_shadow(params: &LightCameraParams, clip_space: &ClipSpace) -> Mat4 {
    build_shadow_matrices(params, clip_space).world_to_shadow
}
