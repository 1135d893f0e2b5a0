//! Camera State
//!
//! The read-only camera description the shadow system consumes every frame,
//! together with the frustum cross-section query used to slice the view
//! volume into cascades.
//!
//! Cameras follow the right-handed convention used throughout the crate:
//! local `+X` is right, `+Y` is up and the camera looks down local `-Z`.

use glam::{Affine3A, Mat3, Quat, Vec3};

/// Projection parameters of a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection.
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f32,
        /// Width / height.
        aspect: f32,
    },
    /// Orthographic projection.
    Orthographic {
        /// Half of the view volume height in world units.
        half_height: f32,
        /// Width / height.
        aspect: f32,
    },
}

impl Projection {
    /// Half width and half height of the cross-section at `depth`.
    #[must_use]
    pub fn half_extents_at(&self, depth: f32) -> (f32, f32) {
        match *self {
            Self::Perspective { fov_y, aspect } => {
                let half_h = depth * (fov_y * 0.5).tan();
                (half_h * aspect, half_h)
            }
            Self::Orthographic {
                half_height,
                aspect,
            } => (half_height * aspect, half_height),
        }
    }
}

/// Normalized sub-rectangle of a camera viewport.
///
/// `(0, 0)` is the bottom-left corner and `(1, 1)` the top-right corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    /// The whole viewport.
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };
}

impl Default for ViewportRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Per-frame state of the main camera.
///
/// Owned by the caller and rebuilt or mutated every frame; the shadow system
/// only reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub rotation: Quat,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    pub projection: Projection,
}

impl CameraState {
    /// Creates a perspective camera at the origin looking down `-Z`.
    ///
    /// `fov_y_degrees` is the vertical field of view in degrees.
    #[must_use]
    pub fn new_perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            near,
            far,
            projection: Projection::Perspective {
                fov_y: fov_y_degrees.to_radians(),
                aspect,
            },
        }
    }

    /// Creates an orthographic camera at the origin looking down `-Z`.
    #[must_use]
    pub fn new_orthographic(half_height: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            near,
            far,
            projection: Projection::Orthographic {
                half_height,
                aspect,
            },
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Orients the camera towards `target`.
    ///
    /// Leaves the rotation untouched when the view direction is parallel to
    /// `up` or `target` coincides with the camera position.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let offset = target - self.position;
        if offset.length_squared() < 1e-12 {
            return;
        }
        let forward = offset.normalize();
        if forward.cross(up).length_squared() < 1e-8 {
            return;
        }
        self.rotation = rotation_looking_to(forward, up);
    }

    /// World-space view direction.
    #[inline]
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Camera-to-world transform.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> Affine3A {
        Affine3A::from_rotation_translation(self.rotation, self.position)
    }

    /// Returns `true` when the state can be sliced into cascades.
    ///
    /// Requires finite values, `far > near`, a positive aspect, and for
    /// perspective cameras a positive near plane and a field of view in
    /// `(0, π)`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        if !(self.position.is_finite()
            && self.rotation.is_finite()
            && self.near.is_finite()
            && self.far.is_finite())
        {
            return false;
        }
        if self.far <= self.near {
            return false;
        }
        match self.projection {
            Projection::Perspective { fov_y, aspect } => {
                self.near > 0.0
                    && aspect.is_finite()
                    && aspect > 0.0
                    && fov_y > 0.0
                    && fov_y < std::f32::consts::PI
            }
            Projection::Orthographic {
                half_height,
                aspect,
            } => half_height.is_finite() && half_height > 0.0 && aspect.is_finite() && aspect > 0.0,
        }
    }

    /// The 4 world-space corners of the view-volume cross-section at `depth`.
    ///
    /// Order: bottom-left, bottom-right, top-right, top-left.
    #[must_use]
    pub fn frustum_corners(&self, depth: f32) -> [Vec3; 4] {
        self.frustum_corners_in_rect(ViewportRect::FULL, depth)
    }

    /// Like [`frustum_corners`](Self::frustum_corners), restricted to a
    /// normalized sub-rectangle of the viewport.
    #[must_use]
    pub fn frustum_corners_in_rect(&self, rect: ViewportRect, depth: f32) -> [Vec3; 4] {
        let (half_w, half_h) = self.projection.half_extents_at(depth);

        // Normalized [0, 1] viewport → [-1, 1] cross-section coordinates.
        let left = (rect.x * 2.0 - 1.0) * half_w;
        let right = ((rect.x + rect.width) * 2.0 - 1.0) * half_w;
        let bottom = (rect.y * 2.0 - 1.0) * half_h;
        let top = ((rect.y + rect.height) * 2.0 - 1.0) * half_h;

        let world = self.world_matrix();
        [
            Vec3::new(left, bottom, -depth),
            Vec3::new(right, bottom, -depth),
            Vec3::new(right, top, -depth),
            Vec3::new(left, top, -depth),
        ]
        .map(|p| world.transform_point3(p))
    }
}

/// Rotation whose local `-Z` points along `forward`.
///
/// `forward` must be normalized and not parallel to `up`.
#[must_use]
pub(crate) fn rotation_looking_to(forward: Vec3, up: Vec3) -> Quat {
    let right = forward.cross(up).normalize();
    let new_up = right.cross(forward).normalize();
    Quat::from_mat3(&Mat3::from_cols(right, new_up, -forward))
}
