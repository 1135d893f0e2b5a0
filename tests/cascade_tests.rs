//! Cascade Orchestration Tests
//!
//! Tests for:
//! - Lifecycle: NoLight → Initializing → Active → NoLight
//! - Depth texture allocation and release
//! - Depth render requests issued per frame
//! - Shader global publication and uniform packing
//! - Invalid input handling
//! - Multi-light system

use glam::{Mat4, Vec3};

use umbra::scene::{CameraState, DirectionalLight, LayerMask};
use umbra::shadow::*;

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Recording backend
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MockTexture(u32);

#[derive(Debug)]
struct RenderRecord {
    cascade: usize,
    target: MockTexture,
    view_projection: Mat4,
    culling: LayerMask,
    clear_depth: f32,
    depth_compare: wgpu::CompareFunction,
}

struct RecordingBackend {
    supported: Vec<wgpu::TextureFormat>,
    next_id: u32,
    created: Vec<(MockTexture, String, u32, wgpu::TextureFormat)>,
    released: Vec<MockTexture>,
    renders: Vec<RenderRecord>,
}

impl RecordingBackend {
    fn new() -> Self {
        Self::with_formats(vec![
            wgpu::TextureFormat::Depth24Plus,
            wgpu::TextureFormat::Depth32Float,
        ])
    }

    fn with_formats(supported: Vec<wgpu::TextureFormat>) -> Self {
        Self {
            supported,
            next_id: 0,
            created: Vec::new(),
            released: Vec::new(),
            renders: Vec::new(),
        }
    }

    fn live_textures(&self) -> usize {
        self.created.len() - self.released.len()
    }
}

impl ShadowBackend for RecordingBackend {
    type Texture = MockTexture;

    fn supports_depth_format(&self, format: wgpu::TextureFormat) -> bool {
        self.supported.contains(&format)
    }

    fn create_depth_texture(&mut self, desc: &DepthTextureDesc<'_>) -> MockTexture {
        let texture = MockTexture(self.next_id);
        self.next_id += 1;
        self.created
            .push((texture, desc.label.to_string(), desc.size, desc.format));
        texture
    }

    fn release_depth_texture(&mut self, texture: MockTexture) {
        assert!(
            !self.released.contains(&texture),
            "texture {texture:?} released twice"
        );
        self.released.push(texture);
    }

    fn render_depth(&mut self, request: &DepthRenderRequest<'_, MockTexture>) {
        self.renders.push(RenderRecord {
            cascade: request.cascade,
            target: *request.target,
            view_projection: request.view_projection(),
            culling: request.culling,
            clear_depth: request.clear_depth,
            depth_compare: request.depth_compare,
        });
    }
}

fn main_camera() -> CameraState {
    CameraState::new_perspective(60.0, 16.0 / 9.0, 0.3, 1000.0)
}

fn sun() -> DirectionalLight {
    DirectionalLight::from_direction(Vec3::new(0.3, -1.0, 0.2))
}

fn shadow_map() -> CascadeShadowMap<MockTexture> {
    CascadeShadowMap::new(CascadeShadowSettings::default()).unwrap()
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn starts_without_light() {
    let map = shadow_map();
    assert_eq!(map.phase(), CascadePhase::NoLight);
    assert!(!map.is_active());
    assert!(map.cascades().is_none());
    assert!(map.textures().is_none());
    assert!(map.world_to_shadow().is_none());
    assert!(map.uniform().is_none());
}

#[test]
fn first_light_frame_activates() {
    init_logger();
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();

    assert!(map.update(&mut backend, &main_camera(), Some(&sun())));
    assert_eq!(map.phase(), CascadePhase::Active);
    assert_eq!(backend.created.len(), CASCADE_COUNT);
    assert_eq!(backend.renders.len(), CASCADE_COUNT);

    let cascades = map.cascades().unwrap();
    for (i, cascade) in cascades.iter().enumerate() {
        assert_eq!(cascade.index, i);
        assert!(cascade.world_to_shadow().is_finite());
        assert!(cascade.params.extents.half_size > 0.0);
    }
}

#[test]
fn textures_allocated_once() {
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    let camera = main_camera();
    let light = sun();

    for _ in 0..3 {
        assert!(map.update(&mut backend, &camera, Some(&light)));
    }
    assert_eq!(backend.created.len(), CASCADE_COUNT);
    assert_eq!(backend.renders.len(), 3 * CASCADE_COUNT);

    for (i, (_, label, size, format)) in backend.created.iter().enumerate() {
        assert_eq!(label, &format!("Cascade Shadow Map {i}"));
        assert_eq!(*size, 1024);
        assert_eq!(*format, wgpu::TextureFormat::Depth24Plus);
    }
}

#[test]
fn no_light_does_no_work() {
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();

    for _ in 0..3 {
        assert!(!map.update(&mut backend, &main_camera(), None));
    }
    assert!(backend.created.is_empty());
    assert!(backend.renders.is_empty());
    assert!(backend.released.is_empty());
    assert_eq!(map.phase(), CascadePhase::NoLight);

    let mut globals = ShaderGlobals::new();
    assert!(!map.publish(&mut globals));
    assert!(globals.is_empty());
}

#[test]
fn removal_releases_textures_exactly_once() {
    init_logger();
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    let camera = main_camera();

    map.update(&mut backend, &camera, Some(&sun()));
    map.update(&mut backend, &camera, Some(&sun()));

    assert!(!map.update(&mut backend, &camera, None));
    assert_eq!(map.phase(), CascadePhase::NoLight);
    assert_eq!(backend.released.len(), CASCADE_COUNT);
    assert_eq!(backend.live_textures(), 0);

    // Second removal is a no-op.
    map.update(&mut backend, &camera, None);
    assert!(!map.release(&mut backend));
    assert_eq!(backend.released.len(), CASCADE_COUNT);
    assert!(map.textures().is_none());
}

#[test]
fn light_returning_reallocates() {
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    let camera = main_camera();

    map.update(&mut backend, &camera, Some(&sun()));
    map.update(&mut backend, &camera, None);
    assert!(map.update(&mut backend, &camera, Some(&sun())));

    assert_eq!(backend.created.len(), 2 * CASCADE_COUNT);
    assert_eq!(backend.live_textures(), CASCADE_COUNT);
    assert!(map.is_active());
}

// ============================================================================
// Depth render requests
// ============================================================================

#[test]
fn render_requests_target_each_cascade() {
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    map.update(&mut backend, &main_camera(), Some(&sun()));

    let textures = *map.textures().unwrap();
    let cascades = map.cascades().unwrap();
    for (i, record) in backend.renders.iter().enumerate() {
        assert_eq!(record.cascade, i);
        assert_eq!(record.target, textures[i]);
        assert_eq!(record.culling, LayerMask::SHADOW_CASTER);
        assert_eq!(record.clear_depth, 1.0);
        assert_eq!(record.depth_compare, wgpu::CompareFunction::Less);

        let m = &cascades[i].matrices;
        assert!(record.view_projection.abs_diff_eq(m.projection * m.view, EPSILON));
    }
}

#[test]
fn render_requests_follow_clip_space() {
    let settings = CascadeShadowSettings {
        clip_space: ClipSpace::DIRECT3D,
        caster_layers: LayerMask::DEFAULT | LayerMask::SHADOW_CASTER,
        ..Default::default()
    };
    let mut backend = RecordingBackend::new();
    let mut map = CascadeShadowMap::new(settings).unwrap();
    map.update(&mut backend, &main_camera(), Some(&sun()));

    for record in &backend.renders {
        assert_eq!(record.clear_depth, 0.0);
        assert_eq!(record.depth_compare, wgpu::CompareFunction::Greater);
        assert!(record.culling.accepts(LayerMask::DEFAULT));
        assert!(!record.culling.accepts(LayerMask::UI));
    }
}

#[test]
fn unsupported_format_falls_back() {
    init_logger();
    let mut backend = RecordingBackend::with_formats(vec![wgpu::TextureFormat::Depth32Float]);
    let mut map = shadow_map();
    map.update(&mut backend, &main_camera(), Some(&sun()));

    assert_eq!(map.texture_format(), Some(FALLBACK_DEPTH_FORMAT));
    assert!(backend
        .created
        .iter()
        .all(|(_, _, _, format)| *format == FALLBACK_DEPTH_FORMAT));
}

#[test]
fn custom_resolution_is_used() {
    let settings = CascadeShadowSettings {
        resolution: 2048,
        ..Default::default()
    };
    let mut backend = RecordingBackend::new();
    let mut map = CascadeShadowMap::new(settings).unwrap();
    map.update(&mut backend, &main_camera(), Some(&sun()));
    assert!(backend.created.iter().all(|(_, _, size, _)| *size == 2048));
}

// ============================================================================
// Frame behaviour
// ============================================================================

#[test]
fn static_camera_converges() {
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    let camera = main_camera().with_position(Vec3::new(10.0, 5.0, 0.0));
    let light = sun();

    map.update(&mut backend, &camera, Some(&light));
    map.update(&mut backend, &camera, Some(&light));
    let second = map.world_to_shadow().unwrap();
    map.update(&mut backend, &camera, Some(&light));
    let third = map.world_to_shadow().unwrap();

    for i in 0..CASCADE_COUNT {
        assert!(second[i].abs_diff_eq(third[i], 1e-3), "cascade {i} keeps moving");
    }
}

#[test]
fn initial_origin_seeds_first_pose() {
    let origin = Vec3::new(100.0, 50.0, -30.0);
    let settings = CascadeShadowSettings {
        initial_origin: Some(origin),
        ..Default::default()
    };
    let mut backend = RecordingBackend::new();
    let mut map = CascadeShadowMap::new(settings).unwrap();
    let light = sun();
    map.update(&mut backend, &main_camera(), Some(&light));

    // The first new pose is the fitted near-face center mapped through the
    // seeded pose, so it lies on the light ray through that center.
    for cascade in map.cascades().unwrap() {
        let world_center = cascade.params.pose.position;
        let seeded_local = umbra::scene::LightPose::new(origin, light.rotation).to_local(world_center);
        let bounds = &cascade.light_bounds;
        let expected = (bounds.near[0] + bounds.near[2]) * 0.5;
        assert!((seeded_local - expected).abs().max_element() < 1e-2);
    }
}

#[test]
fn splits_are_published_after_frame() {
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    map.update(&mut backend, &main_camera(), Some(&sun()));

    let splits = map.splits().unwrap();
    assert!(approx(splits.near[0], 0.3));
    assert_eq!(splits.far[3], 1000.0);
    for (i, cascade) in map.cascades().unwrap().iter().enumerate() {
        assert_eq!((cascade.near, cascade.far), splits.range(i));
    }
}

#[test]
fn invalid_camera_skips_frame() {
    init_logger();
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    let light = sun();

    map.update(&mut backend, &main_camera(), Some(&light));
    let before = map.world_to_shadow().unwrap();

    let inverted = CameraState::new_perspective(60.0, 1.0, 100.0, 1.0);
    assert!(!map.update(&mut backend, &inverted, Some(&light)));
    let nan = main_camera().with_position(Vec3::NAN);
    assert!(!map.update(&mut backend, &nan, Some(&light)));

    assert_eq!(backend.renders.len(), CASCADE_COUNT);
    assert_eq!(map.phase(), CascadePhase::Active);
    assert_eq!(map.world_to_shadow().unwrap(), before);
}

#[test]
fn invalid_camera_before_first_frame_allocates_nothing() {
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    let broken = CameraState::new_perspective(60.0, 1.0, 0.3, f32::NAN);

    assert!(!map.update(&mut backend, &broken, Some(&sun())));
    assert!(backend.created.is_empty());
    assert_eq!(map.phase(), CascadePhase::NoLight);
}

#[test]
fn light_along_view_axis_stays_finite() {
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    let light = DirectionalLight::from_direction(Vec3::NEG_Z);

    for _ in 0..2 {
        assert!(map.update(&mut backend, &main_camera(), Some(&light)));
    }
    for cascade in map.cascades().unwrap() {
        let aspect = cascade.params.extents.aspect;
        assert!(aspect.is_finite() && aspect > 0.0);
        assert!(cascade.world_to_shadow().is_finite());
    }
}

#[test]
fn overflowing_far_plane_keeps_map_initializing() {
    init_logger();
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    let light = sun();
    // The outermost slice spans more than f32::MAX in light space.
    let huge = CameraState::new_perspective(60.0, 16.0 / 9.0, 0.3, 3e38);
    assert!(huge.is_valid());

    let updated = map.update(&mut backend, &huge, Some(&light));
    assert_eq!(updated, !backend.renders.is_empty());
    assert!(backend.renders.len() < CASCADE_COUNT);
    for record in &backend.renders {
        assert!(record.view_projection.is_finite());
    }

    assert_eq!(map.phase(), CascadePhase::Initializing);
    assert!(map.cascades().is_none());
    assert!(map.splits().is_none());
    assert!(map.uniform().is_none());
    let mut globals = ShaderGlobals::new();
    assert!(!map.publish(&mut globals));
    assert!(globals.is_empty());

    // A sane frame fits the remaining cascades.
    assert!(map.update(&mut backend, &main_camera(), Some(&light)));
    assert!(map.is_active());
    assert!(map.publish(&mut globals));

    // Cascades fitted against the huge frustum recover on the next frame.
    let before = backend.renders.len();
    assert!(map.update(&mut backend, &main_camera(), Some(&light)));
    assert_eq!(backend.renders.len() - before, CASCADE_COUNT);
    let splits = map.splits().unwrap();
    assert_eq!(splits.far[CASCADE_COUNT - 1], 1000.0);
    for (i, cascade) in map.cascades().unwrap().iter().enumerate() {
        assert_eq!((cascade.near, cascade.far), splits.range(i));
        assert!(cascade.world_to_shadow().is_finite());
    }
}

#[test]
fn skipped_cascade_keeps_its_split_range() {
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    let light = sun();

    assert!(map.update(&mut backend, &main_camera(), Some(&light)));
    let last = map.cascades().unwrap()[CASCADE_COUNT - 1];
    let before = backend.renders.len();

    let huge = CameraState::new_perspective(60.0, 16.0 / 9.0, 0.3, 3e38);
    let updated = map.update(&mut backend, &huge, Some(&light));
    assert_eq!(updated, backend.renders.len() > before);
    assert!(backend.renders.len() - before < CASCADE_COUNT);

    assert!(map.is_active());
    let cascades = map.cascades().unwrap();
    let splits = map.splits().unwrap();
    for (i, cascade) in cascades.iter().enumerate() {
        assert_eq!((cascade.near, cascade.far), splits.range(i));
    }
    assert_eq!(splits.far[CASCADE_COUNT - 1], 1000.0);
    assert_eq!(
        cascades[CASCADE_COUNT - 1].world_to_shadow(),
        last.world_to_shadow()
    );
}

// ============================================================================
// Publication
// ============================================================================

#[test]
fn publishes_all_globals() {
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    let mut globals = ShaderGlobals::new();

    assert!(map.update_and_publish(&mut backend, &mut globals, &main_camera(), Some(&sun())));

    let matrices = globals.matrix_array(names::WORLD_TO_SHADOW).unwrap();
    assert_eq!(matrices, map.world_to_shadow().unwrap().as_slice());

    let textures = map.textures().unwrap();
    for (i, name) in names::SHADOW_MAPS.iter().enumerate() {
        assert_eq!(globals.texture(name), Some(&textures[i]));
    }

    assert_eq!(globals.float(names::SHADOW_BIAS), Some(0.005));
    assert_eq!(globals.float(names::SHADOW_STRENGTH), Some(0.5));

    let near = globals.vector(names::SPLITS_NEAR).unwrap();
    let far = globals.vector(names::SPLITS_FAR).unwrap();
    assert!(approx(near.x, 0.3));
    assert!((near.y - 67.3).abs() < 1e-3);
    assert!((far.z - 467.3).abs() < 1e-3);
    assert_eq!(far.w, 1000.0);

    // 1 matrix array + 4 textures + 2 floats + 2 vectors
    assert_eq!(globals.len(), 9);
}

#[test]
fn uniform_mirrors_globals() {
    let mut backend = RecordingBackend::new();
    let mut map = shadow_map();
    map.update(&mut backend, &main_camera(), Some(&sun()));

    let uniform = map.uniform().unwrap();
    let matrices = map.world_to_shadow().unwrap();
    for i in 0..CASCADE_COUNT {
        assert_eq!(Mat4::from_cols_array_2d(&uniform.world_to_shadow[i]), matrices[i]);
    }
    assert_eq!(uniform.splits_far[3], 1000.0);
    assert_eq!(uniform.shadow_bias, 0.005);
    assert_eq!(uniform.shadow_strength, 0.5);
    assert_eq!(bytemuck::bytes_of(&uniform).len(), 4 * 64 + 16 + 16 + 16);
}

// ============================================================================
// Multi-light system
// ============================================================================

#[test]
fn system_tracks_lights() {
    init_logger();
    let mut backend = RecordingBackend::new();
    let mut system = CascadeShadowSystem::new(CascadeShadowSettings::default()).unwrap();
    let camera = main_camera();
    let a = sun();
    let b = DirectionalLight::from_direction(Vec3::new(-0.5, -1.0, 0.0));

    assert_eq!(system.update(&mut backend, &camera, &[(1, a), (2, b)]), 2);
    assert_eq!(system.len(), 2);
    assert_eq!(backend.live_textures(), 2 * CASCADE_COUNT);
    assert_eq!(backend.renders.len(), 2 * CASCADE_COUNT);

    // Light 2 goes away.
    assert_eq!(system.update(&mut backend, &camera, &[(1, a)]), 1);
    assert_eq!(system.len(), 1);
    assert!(system.get(2).is_none());
    assert_eq!(backend.released.len(), CASCADE_COUNT);
    assert_eq!(backend.live_textures(), CASCADE_COUNT);

    let mut globals = ShaderGlobals::new();
    assert!(system.publish(1, &mut globals));
    assert!(!system.publish(2, &mut globals));

    system.shutdown(&mut backend);
    assert!(system.is_empty());
    assert_eq!(backend.live_textures(), 0);

    system.shutdown(&mut backend);
    assert_eq!(backend.released.len(), 2 * CASCADE_COUNT);
}

#[test]
fn system_ignores_repeated_light_id() {
    init_logger();
    let mut backend = RecordingBackend::new();
    let mut system = CascadeShadowSystem::new(CascadeShadowSettings::default()).unwrap();
    let a = sun();
    let b = DirectionalLight::from_direction(Vec3::new(-0.5, -1.0, 0.0));

    assert_eq!(system.update(&mut backend, &main_camera(), &[(1, a), (1, b)]), 1);
    assert_eq!(system.len(), 1);
    assert_eq!(backend.created.len(), CASCADE_COUNT);
    assert_eq!(backend.renders.len(), CASCADE_COUNT);

    // The first entry wins.
    let map = system.get(1).unwrap();
    let rotation = map.cascades().unwrap()[0].params.pose.rotation;
    assert!(rotation.abs_diff_eq(a.rotation, EPSILON));
}

#[test]
fn invalid_settings_are_rejected() {
    let settings = CascadeShadowSettings {
        resolution: 0,
        ..Default::default()
    };
    assert!(CascadeShadowMap::<MockTexture>::new(settings.clone()).is_err());
    assert!(CascadeShadowSystem::<MockTexture>::new(settings).is_err());
}
