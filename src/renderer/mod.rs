//! GPU side of the shadow system
//!
//! [`WgpuShadowBackend`] renders cascade depth maps with wgpu.

pub mod shadow_depth;

pub use shadow_depth::{CasterId, CasterIndices, ShadowCaster, ShadowTexture, WgpuShadowBackend};
