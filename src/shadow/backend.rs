//! Rendering backend seam
//!
//! The shadow system never rasterizes anything itself. It allocates depth
//! targets and issues fully parameterized depth-render requests through
//! [`ShadowBackend`]; the host renderer decides how geometry is drawn.
//!
//! [`WgpuShadowBackend`](crate::renderer::WgpuShadowBackend) is the
//! built-in implementation.

use glam::Mat4;

use super::settings::FALLBACK_DEPTH_FORMAT;
use crate::scene::LayerMask;

/// Description of a cascade depth texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthTextureDesc<'a> {
    pub label: &'a str,
    /// Width and height in texels.
    pub size: u32,
    pub format: wgpu::TextureFormat,
}

/// One depth-only render of the scene from a cascade's light camera.
#[derive(Debug)]
pub struct DepthRenderRequest<'a, T> {
    /// Cascade index, `0..CASCADE_COUNT`.
    pub cascade: usize,
    /// World → light view.
    pub view: Mat4,
    /// Light view → clip space, already adapted to the backend convention.
    pub projection: Mat4,
    /// Only geometry on these layers is drawn.
    pub culling: LayerMask,
    /// Value the target is cleared to before drawing.
    pub clear_depth: f32,
    /// Depth test keeping the closest fragment.
    pub depth_compare: wgpu::CompareFunction,
    pub target: &'a T,
}

impl<T> DepthRenderRequest<'_, T> {
    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Depth texture allocation and depth rendering, provided by the host.
pub trait ShadowBackend {
    /// Handle to a depth texture owned by the backend.
    type Texture;

    /// Returns `true` if `format` can be rendered to and sampled.
    fn supports_depth_format(&self, format: wgpu::TextureFormat) -> bool;

    fn create_depth_texture(&mut self, desc: &DepthTextureDesc<'_>) -> Self::Texture;

    fn release_depth_texture(&mut self, texture: Self::Texture);

    /// Renders depth into `request.target`.
    ///
    /// May be queued to the GPU without waiting for completion.
    fn render_depth(&mut self, request: &DepthRenderRequest<'_, Self::Texture>);
}

/// Picks `requested` if the backend supports it, else
/// [`FALLBACK_DEPTH_FORMAT`].
pub fn resolve_depth_format<B: ShadowBackend + ?Sized>(
    backend: &B,
    requested: wgpu::TextureFormat,
) -> wgpu::TextureFormat {
    if backend.supports_depth_format(requested) {
        return requested;
    }
    log::warn!(
        "Shadow depth format {requested:?} is not supported, falling back to {FALLBACK_DEPTH_FORMAT:?}"
    );
    FALLBACK_DEPTH_FORMAT
}
