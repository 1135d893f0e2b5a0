//! Cascaded Shadow Maps
//!
//! The main camera's view depth is split into [`CASCADE_COUNT`] consecutive
//! ranges. Each range gets its own orthographic light camera, fitted every
//! frame around that slice of the camera frustum, and its own depth map.
//!
//! # Pipeline
//!
//! ```text
//! splits ──► frustum ──► bounds ──► parameterize ──► matrix
//!   │           │           │             │             │
//!   │    slice corners  light-local   pose + ortho   world → shadow
//!   │     (world)          AABB        extents         texture
//!   ▼
//! cascade: per-light state machine driving the stages above,
//!          issuing depth renders through a `ShadowBackend`
//!          and publishing results through a `GlobalSink`
//! ```
//!
//! The stage functions are pure and can be used on their own.

pub mod backend;
pub mod bounds;
pub mod cascade;
pub mod clip_space;
pub mod frustum;
pub mod globals;
pub mod matrix;
pub mod parameterize;
pub mod settings;
pub mod splits;
pub mod system;

pub use backend::{DepthRenderRequest, DepthTextureDesc, ShadowBackend, resolve_depth_format};
pub use bounds::{LightSpaceBox, fit_light_space_bounds, to_light_local};
pub use cascade::{Cascade, CascadePhase, CascadeShadowMap};
pub use clip_space::{BIAS_MATRIX, ClipSpace, DepthRange};
pub use frustum::{CornerSpace, FrustumCorners, compute_slice_corners};
pub use globals::{CascadeShadowUniform, GlobalSink, GlobalValue, ShaderGlobals, names};
pub use matrix::{ShadowMatrices, build_shadow_matrices, build_world_to_shadow};
pub use parameterize::{LightCameraParams, MIN_EXTENT, OrthoExtents, parameterize_cascade};
pub use settings::{CascadeShadowSettings, FALLBACK_DEPTH_FORMAT};
pub use splits::{CASCADE_COUNT, CascadeSplits, DEFAULT_SPLIT_SPANS, compute_splits, compute_splits_with};
pub use system::CascadeShadowSystem;
