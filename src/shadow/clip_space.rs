//! Clip-space conventions
//!
//! Shadow projections are built in the OpenGL convention (right-handed,
//! `[-1, 1]` depth, `+Y` up in NDC). [`ClipSpace`] describes how a target
//! backend differs from that and supplies the matching projection fix-up,
//! texture-space bias matrix, depth clear value and depth test.
//!
//! | Preset       | Depth range  | NDC Y flipped | Texture origin |
//! |--------------|--------------|---------------|----------------|
//! | `OPENGL`     | `[-1, 1]`    | no            | bottom-left    |
//! | `WGPU`       | `[0, 1]`     | no            | top-left       |
//! | `VULKAN`     | `[0, 1]`     | yes           | top-left       |
//! | `DIRECT3D`   | reversed `[1, 0]` | no       | top-left       |

use glam::{Mat4, Vec4};

/// Canonical bias matrix remapping `[-1, 1]` to `[0, 1]` on all three axes.
///
/// Rows: `(0.5, 0, 0, 0.5)`, `(0, 0.5, 0, 0.5)`, `(0, 0, 0.5, 0.5)`,
/// `(0, 0, 0, 1)`. This is [`ClipSpace::bias_matrix`] for
/// [`ClipSpace::OPENGL`].
pub const BIAS_MATRIX: Mat4 = Mat4::from_cols(
    Vec4::new(0.5, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 0.5, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.5, 0.5, 0.5, 1.0),
);

/// Depth values produced by the rasterizer, from near to far plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthRange {
    /// OpenGL: near → -1, far → 1 (stored as `[0, 1]` after the depth-range
    /// transform).
    NegativeOneToOne,
    /// Direct3D / Metal / Vulkan / WebGPU: near → 0, far → 1.
    ZeroToOne,
    /// Reversed-Z: near → 1, far → 0.
    ReversedZeroToOne,
}

/// Clip-space convention of a rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipSpace {
    pub depth_range: DepthRange,
    /// Negate clip-space Y (Vulkan without a negative-height viewport).
    pub flip_y: bool,
    /// Texture row 0 is the top of the image.
    pub texture_origin_top_left: bool,
}

impl ClipSpace {
    pub const OPENGL: Self = Self {
        depth_range: DepthRange::NegativeOneToOne,
        flip_y: false,
        texture_origin_top_left: false,
    };

    pub const WGPU: Self = Self {
        depth_range: DepthRange::ZeroToOne,
        flip_y: false,
        texture_origin_top_left: true,
    };

    pub const VULKAN: Self = Self {
        depth_range: DepthRange::ZeroToOne,
        flip_y: true,
        texture_origin_top_left: true,
    };

    pub const DIRECT3D: Self = Self {
        depth_range: DepthRange::ReversedZeroToOne,
        flip_y: false,
        texture_origin_top_left: true,
    };

    /// Matrix taking OpenGL clip coordinates to this convention's clip
    /// coordinates.
    #[must_use]
    pub fn correction(&self) -> Mat4 {
        let sy = if self.flip_y { -1.0 } else { 1.0 };
        // z' = a·z + b·w
        let (a, b) = match self.depth_range {
            DepthRange::NegativeOneToOne => (1.0, 0.0),
            DepthRange::ZeroToOne => (0.5, 0.5),
            DepthRange::ReversedZeroToOne => (-0.5, 0.5),
        };
        Mat4::from_cols(
            Vec4::X,
            Vec4::new(0.0, sy, 0.0, 0.0),
            Vec4::new(0.0, 0.0, a, 0.0),
            Vec4::new(0.0, 0.0, b, 1.0),
        )
    }

    /// Adapts an OpenGL-convention projection to this backend.
    #[inline]
    #[must_use]
    pub fn gpu_projection(&self, projection: Mat4) -> Mat4 {
        self.correction() * projection
    }

    /// Matrix taking this convention's clip coordinates to shadow-map
    /// texture coordinates and stored depth.
    ///
    /// `x` and `y` are remapped to `[0, 1]`, with `v` following the texture
    /// origin. `z` is remapped only for [`DepthRange::NegativeOneToOne`];
    /// the other ranges already store NDC depth as-is.
    #[must_use]
    pub fn bias_matrix(&self) -> Mat4 {
        // NDC +Y ends up at texture row 0 exactly when the origin is
        // top-left and Y is not flipped (or bottom-left and flipped).
        let sv = if self.texture_origin_top_left == self.flip_y {
            0.5
        } else {
            -0.5
        };
        let (sz, tz) = match self.depth_range {
            DepthRange::NegativeOneToOne => (0.5, 0.5),
            DepthRange::ZeroToOne | DepthRange::ReversedZeroToOne => (1.0, 0.0),
        };
        Mat4::from_cols(
            Vec4::new(0.5, 0.0, 0.0, 0.0),
            Vec4::new(0.0, sv, 0.0, 0.0),
            Vec4::new(0.0, 0.0, sz, 0.0),
            Vec4::new(0.5, 0.5, tz, 1.0),
        )
    }

    /// Depth value a cleared shadow map holds (the far plane).
    #[inline]
    #[must_use]
    pub fn clear_depth(&self) -> f32 {
        match self.depth_range {
            DepthRange::ReversedZeroToOne => 0.0,
            DepthRange::NegativeOneToOne | DepthRange::ZeroToOne => 1.0,
        }
    }

    /// Depth test keeping the fragment closest to the light.
    #[inline]
    #[must_use]
    pub fn depth_compare(&self) -> wgpu::CompareFunction {
        match self.depth_range {
            DepthRange::ReversedZeroToOne => wgpu::CompareFunction::Greater,
            DepthRange::NegativeOneToOne | DepthRange::ZeroToOne => wgpu::CompareFunction::Less,
        }
    }
}

impl Default for ClipSpace {
    fn default() -> Self {
        Self::WGPU
    }
}
