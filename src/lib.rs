#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Cascaded shadow maps for a directional light.
//!
//! - [`scene`]: camera, light and layer inputs
//! - [`shadow`]: split scheme, light-space fitting, shadow matrices and the
//!   per-light cascade state machine
//! - [`renderer`]: wgpu backend rendering the cascade depth maps

pub mod errors;
pub mod renderer;
pub mod scene;
pub mod shadow;

pub use errors::ShadowError;
pub use renderer::WgpuShadowBackend;
pub use scene::{CameraState, DirectionalLight, LayerMask, LightPose, Projection, ViewportRect};
pub use shadow::{
    CascadeShadowMap, CascadeShadowSettings, CascadeShadowSystem, ClipSpace, GlobalSink, ShaderGlobals,
    ShadowBackend,
};

pub use glam;
pub use wgpu;
