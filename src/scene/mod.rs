//! Scene-side inputs of the shadow system
//!
//! - [`CameraState`]: main camera pose and projection, with frustum
//!   cross-section queries
//! - [`DirectionalLight`]: the shadow-casting light
//! - [`LightPose`]: light camera pose defining light-local space
//! - [`LayerMask`]: render layers used as culling filters

pub mod camera;
pub mod layers;
pub mod light;

pub use camera::{CameraState, Projection, ViewportRect};
pub use layers::LayerMask;
pub use light::{DirectionalLight, LightPose};
