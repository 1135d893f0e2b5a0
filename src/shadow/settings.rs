//! Cascade Shadow Settings
//!
//! Configuration consumed when a [`CascadeShadowMap`](super::CascadeShadowMap)
//! is created.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use umbra::shadow::{CascadeShadowSettings, ClipSpace};
//!
//! let settings = CascadeShadowSettings {
//!     resolution: 2048,
//!     clip_space: ClipSpace::OPENGL,
//!     ..Default::default()
//! };
//! settings.validate()?;
//! ```

use glam::Vec3;

use super::clip_space::ClipSpace;
use super::splits::{CASCADE_COUNT, DEFAULT_SPLIT_SPANS};
use crate::errors::{Result, ShadowError};
use crate::scene::LayerMask;

/// Depth format used when the requested one is not renderable.
///
/// `Depth32Float` is supported by every wgpu backend as a render attachment.
pub const FALLBACK_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Tolerance for the split spans adding up to `1.0`.
const SPAN_SUM_TOLERANCE: f32 = 1e-3;

/// Configuration of the cascaded shadow maps of one directional light.
///
/// # Fields
///
/// | Field             | Description                                   | Default              |
/// |-------------------|-----------------------------------------------|----------------------|
/// | `resolution`      | Width and height of each depth texture        | `1024`               |
/// | `depth_format`    | Requested depth texture format                | `Depth24Plus`        |
/// | `split_spans`     | Relative depth span of each cascade           | `[.067, .133, .267, .533]` |
/// | `shadow_bias`     | Depth bias published to shaders               | `0.005`              |
/// | `shadow_strength` | Shadow darkening factor published to shaders  | `0.5`                |
/// | `clip_space`      | Clip-space convention of the target backend   | `ClipSpace::WGPU`    |
/// | `caster_layers`   | Layers rendered into the depth maps           | `SHADOW_CASTER`      |
/// | `initial_origin`  | First-frame light origin (`None`: main camera)| `None`               |
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeShadowSettings {
    /// Width and height of every cascade depth texture, in texels.
    pub resolution: u32,

    /// Requested depth texture format.
    ///
    /// Falls back to [`FALLBACK_DEPTH_FORMAT`] when the backend cannot render
    /// to it.
    pub depth_format: wgpu::TextureFormat,

    /// Relative depth span of each cascade; must be positive and sum to `1.0`.
    pub split_spans: [f32; CASCADE_COUNT],

    /// Depth bias applied when comparing against the shadow map.
    pub shadow_bias: f32,

    /// How much a fully shadowed fragment is darkened, in `[0, 1]`.
    pub shadow_strength: f32,

    /// Clip-space convention of the backend rendering the depth maps.
    pub clip_space: ClipSpace,

    /// Culling filter for the depth passes.
    pub caster_layers: LayerMask,

    /// Where light cameras are placed before their first fit.
    ///
    /// `None` uses the main camera position of the first active frame.
    pub initial_origin: Option<Vec3>,
}

impl Default for CascadeShadowSettings {
    fn default() -> Self {
        Self {
            resolution: 1024,
            depth_format: wgpu::TextureFormat::Depth24Plus,
            split_spans: DEFAULT_SPLIT_SPANS,
            shadow_bias: 0.005,
            shadow_strength: 0.5,
            clip_space: ClipSpace::default(),
            caster_layers: LayerMask::SHADOW_CASTER,
            initial_origin: None,
        }
    }
}

impl CascadeShadowSettings {
    /// Checks the settings for values the shadow system cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(ShadowError::InvalidResolution(self.resolution));
        }

        for (cascade, &value) in self.split_spans.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ShadowError::InvalidSplitSpan { cascade, value });
            }
        }
        let sum: f32 = self.split_spans.iter().sum();
        if (sum - 1.0).abs() > SPAN_SUM_TOLERANCE {
            return Err(ShadowError::SplitSpansNotNormalized(sum));
        }

        if !self.shadow_bias.is_finite() {
            return Err(ShadowError::InvalidParameter {
                name: "shadow_bias",
                value: self.shadow_bias,
            });
        }
        if !(0.0..=1.0).contains(&self.shadow_strength) {
            return Err(ShadowError::InvalidParameter {
                name: "shadow_strength",
                value: self.shadow_strength,
            });
        }

        if let Some(origin) = self.initial_origin
            && !origin.is_finite()
        {
            return Err(ShadowError::InvalidParameter {
                name: "initial_origin",
                value: origin.x + origin.y + origin.z,
            });
        }

        Ok(())
    }
}
