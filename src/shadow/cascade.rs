//! Per-light cascade orchestration
//!
//! [`CascadeShadowMap`] owns everything one directional light needs across
//! frames: the light camera pose of every cascade, the four depth textures
//! and the last computed cascade outputs.
//!
//! # Lifecycle
//!
//! ```text
//! NoLight ──(first frame with a light)──► Initializing ──► Active
//!    ▲                                                       │
//!    └──────────(light removed / release())──────────────────┘
//! ```
//!
//! Textures are allocated lazily when the first light shows up and released
//! exactly once when it goes away; releasing again is a no-op.
//!
//! # Per-frame flow
//!
//! ```text
//! compute_splits_with()
//!     └── for each cascade (sequentially)
//!           ├── compute_slice_corners()      main camera, world space
//!           ├── fit_light_space_bounds()     against last frame's pose
//!           ├── parameterize_cascade()       new pose + ortho extents
//!           ├── ShadowBackend::render_depth()
//!           └── build_shadow_matrices()
//! ```

use glam::{Mat4, Vec3};

use super::backend::{DepthRenderRequest, DepthTextureDesc, ShadowBackend, resolve_depth_format};
use super::bounds::fit_light_space_bounds;
use super::frustum::{CornerSpace, FrustumCorners, compute_slice_corners};
use super::globals::{CascadeShadowUniform, GlobalSink, names};
use super::matrix::{ShadowMatrices, build_shadow_matrices};
use super::parameterize::{LightCameraParams, OrthoExtents, parameterize_cascade};
use super::settings::CascadeShadowSettings;
use super::splits::{CASCADE_COUNT, CascadeSplits, compute_splits_with};
use crate::errors::Result;
use crate::scene::{CameraState, DirectionalLight, LightPose};

const TEXTURE_LABELS: [&str; CASCADE_COUNT] = [
    "Cascade Shadow Map 0",
    "Cascade Shadow Map 1",
    "Cascade Shadow Map 2",
    "Cascade Shadow Map 3",
];

/// Lifecycle phase of a [`CascadeShadowMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadePhase {
    /// No light; nothing allocated.
    NoLight,
    /// Resources allocated, some cascade not rendered yet.
    Initializing,
    /// Steady state.
    Active,
}

/// Outputs of one cascade for the last completed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cascade {
    pub index: usize,
    /// Main-camera depth range covered by this cascade.
    pub near: f32,
    pub far: f32,
    /// Main-camera frustum slice, world space.
    pub world_corners: FrustumCorners,
    /// Fitted box, light-local space of the pose it was measured against.
    pub light_bounds: FrustumCorners,
    /// Light camera used to render the depth map.
    pub params: LightCameraParams,
    pub matrices: ShadowMatrices,
}

impl Cascade {
    fn unfitted(index: usize, pose: LightPose) -> Self {
        let empty = FrustumCorners {
            near: [pose.position; 4],
            far: [pose.position; 4],
            space: CornerSpace::World,
        };
        Self {
            index,
            near: 0.0,
            far: 0.0,
            world_corners: empty,
            light_bounds: FrustumCorners {
                space: CornerSpace::LightLocal,
                ..empty
            },
            params: LightCameraParams {
                pose,
                extents: OrthoExtents {
                    near: 0.0,
                    far: 1.0,
                    aspect: 1.0,
                    half_size: 1.0,
                },
                clamped: false,
            },
            matrices: ShadowMatrices {
                view: Mat4::IDENTITY,
                projection: Mat4::IDENTITY,
                world_to_shadow: Mat4::IDENTITY,
            },
        }
    }

    #[inline]
    #[must_use]
    pub fn world_to_shadow(&self) -> Mat4 {
        self.matrices.world_to_shadow
    }
}

/// State living as long as the light is active.
struct ActiveLight<T> {
    textures: [T; CASCADE_COUNT],
    texture_format: wgpu::TextureFormat,
    cascades: [Cascade; CASCADE_COUNT],
    splits: CascadeSplits,
    /// Cascades currently reported as degenerate, to warn once per streak.
    degenerate: [bool; CASCADE_COUNT],
    /// Cascades rendered at least once since allocation.
    fitted: [bool; CASCADE_COUNT],
    /// Pose each cascade's next fit is measured against.
    poses: [LightPose; CASCADE_COUNT],
}

/// Cascaded shadow maps of a single directional light.
pub struct CascadeShadowMap<T> {
    settings: CascadeShadowSettings,
    phase: CascadePhase,
    active: Option<ActiveLight<T>>,
}

impl<T> CascadeShadowMap<T> {
    /// Creates the shadow map in the [`CascadePhase::NoLight`] phase.
    pub fn new(settings: CascadeShadowSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::from_validated(settings))
    }

    pub(crate) fn from_validated(settings: CascadeShadowSettings) -> Self {
        Self {
            settings,
            phase: CascadePhase::NoLight,
            active: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &CascadeShadowSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> CascadePhase {
        self.phase
    }

    /// Returns `true` once every cascade has been rendered at least once.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == CascadePhase::Active
    }

    /// Latest outputs of every cascade, once all have been rendered.
    #[must_use]
    pub fn cascades(&self) -> Option<&[Cascade; CASCADE_COUNT]> {
        self.completed().map(|a| &a.cascades)
    }

    /// Depth textures, once allocated.
    #[must_use]
    pub fn textures(&self) -> Option<&[T; CASCADE_COUNT]> {
        self.active.as_ref().map(|a| &a.textures)
    }

    /// Format the depth textures were allocated with.
    #[must_use]
    pub fn texture_format(&self) -> Option<wgpu::TextureFormat> {
        self.active.as_ref().map(|a| a.texture_format)
    }

    /// Split ranges matching [`cascades`](Self::cascades).
    #[must_use]
    pub fn splits(&self) -> Option<&CascadeSplits> {
        self.completed().map(|a| &a.splits)
    }

    /// World-to-shadow matrices of [`cascades`](Self::cascades).
    #[must_use]
    pub fn world_to_shadow(&self) -> Option<[Mat4; CASCADE_COUNT]> {
        self.cascades().map(|c| c.map(|c| c.world_to_shadow()))
    }

    fn completed(&self) -> Option<&ActiveLight<T>> {
        if self.phase == CascadePhase::Active {
            self.active.as_ref()
        } else {
            None
        }
    }

    /// Runs one frame.
    ///
    /// With `light == None` any previously allocated resources are released.
    /// Returns `true` when at least one cascade was recomputed and rendered.
    /// A cascade whose fit is not finite keeps its previous outputs and split
    /// range; the map stays [`CascadePhase::Initializing`] until every
    /// cascade has been rendered once.
    ///
    /// Never fails: invalid camera or light input skips the frame and keeps
    /// the previous outputs.
    pub fn update<B>(
        &mut self,
        backend: &mut B,
        camera: &CameraState,
        light: Option<&DirectionalLight>,
    ) -> bool
    where
        B: ShadowBackend<Texture = T> + ?Sized,
    {
        let Some(light) = light else {
            self.release(backend);
            return false;
        };

        if !camera.is_valid() {
            log::warn!(
                "CascadeShadowMap: invalid main camera (near={}, far={}), skipping frame",
                camera.near,
                camera.far
            );
            return false;
        }
        if !light.rotation.is_finite() {
            log::warn!("CascadeShadowMap: light rotation is not finite, skipping frame");
            return false;
        }

        if self.active.is_none() {
            self.initialize(backend, camera, light);
        }
        let settings = &self.settings;
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        let splits = compute_splits_with(camera.near, camera.far, &settings.split_spans);
        let clip_space = settings.clip_space;
        let mut rendered = 0;

        for (i, (slice_near, slice_far)) in splits.ranges().enumerate() {
            let previous = active.poses[i];

            let world_corners = compute_slice_corners(camera, slice_near, slice_far);
            let light_bounds = fit_light_space_bounds(&world_corners, &previous);
            let params = parameterize_cascade(&light_bounds, light.rotation, &previous);

            let matrices = build_shadow_matrices(&params, &clip_space);
            if !light_bounds.is_finite()
                || !params_are_finite(&params)
                || !matrices_are_finite(&matrices)
            {
                log::warn!("CascadeShadowMap: cascade {i} produced non-finite parameters, keeping last frame");
                // Re-seed: the slice is lost to rounding around a distant pose.
                active.poses[i] = LightPose::new(camera.position, light.rotation);
                continue;
            }

            if params.clamped && !active.degenerate[i] {
                log::warn!("CascadeShadowMap: cascade {i} light-space box is degenerate, clamping extents");
            }
            active.degenerate[i] = params.clamped;

            backend.render_depth(&DepthRenderRequest {
                cascade: i,
                view: matrices.view,
                projection: matrices.projection,
                culling: settings.caster_layers,
                clear_depth: clip_space.clear_depth(),
                depth_compare: clip_space.depth_compare(),
                target: &active.textures[i],
            });

            log::debug!(
                "Cascade {i}: range [{slice_near}, {slice_far}), depth [{}, {}], half_size {}, aspect {}",
                params.extents.near,
                params.extents.far,
                params.extents.half_size,
                params.extents.aspect
            );

            active.cascades[i] = Cascade {
                index: i,
                near: slice_near,
                far: slice_far,
                world_corners,
                light_bounds,
                params,
                matrices,
            };
            active.splits.near[i] = slice_near;
            active.splits.far[i] = slice_far;
            active.fitted[i] = true;
            active.poses[i] = params.pose;
            rendered += 1;
        }

        // Outputs are published only once every cascade has been rendered.
        if active.fitted.iter().all(|&fitted| fitted) {
            self.phase = CascadePhase::Active;
        }
        rendered > 0
    }

    fn initialize<B>(&mut self, backend: &mut B, camera: &CameraState, light: &DirectionalLight)
    where
        B: ShadowBackend<Texture = T> + ?Sized,
    {
        let format = resolve_depth_format(&*backend, self.settings.depth_format);
        let size = self.settings.resolution;
        let textures = TEXTURE_LABELS.map(|label| {
            backend.create_depth_texture(&DepthTextureDesc {
                label,
                size,
                format,
            })
        });

        let origin = self.settings.initial_origin.unwrap_or(camera.position);
        let pose = LightPose::new(origin, light.rotation);
        let cascades = std::array::from_fn(|i| Cascade::unfitted(i, pose));

        log::info!(
            "CascadeShadowMap: allocated {CASCADE_COUNT} depth maps ({size}x{size}, {format:?}), light origin {origin}"
        );

        self.active = Some(ActiveLight {
            textures,
            texture_format: format,
            cascades,
            splits: CascadeSplits {
                near: [0.0; CASCADE_COUNT],
                far: [0.0; CASCADE_COUNT],
            },
            degenerate: [false; CASCADE_COUNT],
            fitted: [false; CASCADE_COUNT],
            poses: [pose; CASCADE_COUNT],
        });
        self.phase = CascadePhase::Initializing;
    }

    /// Releases the depth textures and forgets the light camera poses.
    ///
    /// Returns `false` when there was nothing to release.
    pub fn release<B>(&mut self, backend: &mut B) -> bool
    where
        B: ShadowBackend<Texture = T> + ?Sized,
    {
        self.phase = CascadePhase::NoLight;
        let Some(active) = self.active.take() else {
            return false;
        };
        for texture in active.textures {
            backend.release_depth_texture(texture);
        }
        log::info!("CascadeShadowMap: released {CASCADE_COUNT} depth maps");
        true
    }

    /// Publishes matrices, textures, shading constants and split distances.
    ///
    /// Returns `false` (and publishes nothing) until every cascade has been
    /// rendered.
    pub fn publish<S>(&self, sink: &mut S) -> bool
    where
        S: GlobalSink<T> + ?Sized,
    {
        let Some(active) = self.completed() else {
            return false;
        };

        let matrices = active.cascades.map(|c| c.world_to_shadow());
        sink.set_matrix_array(names::WORLD_TO_SHADOW, &matrices);
        for (name, texture) in names::SHADOW_MAPS.into_iter().zip(&active.textures) {
            sink.set_texture(name, texture);
        }
        sink.set_float(names::SHADOW_BIAS, self.settings.shadow_bias);
        sink.set_float(names::SHADOW_STRENGTH, self.settings.shadow_strength);
        sink.set_vector(names::SPLITS_NEAR, active.splits.near_vec4());
        sink.set_vector(names::SPLITS_FAR, active.splits.far_vec4());
        true
    }

    /// Runs [`update`](Self::update) and, if it rendered, [`publish`](Self::publish).
    pub fn update_and_publish<B, S>(
        &mut self,
        backend: &mut B,
        sink: &mut S,
        camera: &CameraState,
        light: Option<&DirectionalLight>,
    ) -> bool
    where
        B: ShadowBackend<Texture = T> + ?Sized,
        S: GlobalSink<T> + ?Sized,
    {
        self.update(backend, camera, light) && self.publish(sink)
    }

    /// The published values packed as a uniform block.
    #[must_use]
    pub fn uniform(&self) -> Option<CascadeShadowUniform> {
        let active = self.completed()?;
        Some(CascadeShadowUniform {
            world_to_shadow: active.cascades.map(|c| c.world_to_shadow().to_cols_array_2d()),
            splits_near: active.splits.near,
            splits_far: active.splits.far,
            shadow_bias: self.settings.shadow_bias,
            shadow_strength: self.settings.shadow_strength,
            _padding: [0.0; 2],
        })
    }
}

fn params_are_finite(params: &LightCameraParams) -> bool {
    let e = &params.extents;
    params.pose.position.is_finite()
        && params.pose.rotation.is_finite()
        && Vec3::new(e.near, e.far, e.aspect).is_finite()
        && e.half_size.is_finite()
}

fn matrices_are_finite(matrices: &ShadowMatrices) -> bool {
    matrices.view.is_finite()
        && matrices.projection.is_finite()
        && matrices.world_to_shadow.is_finite()
}
