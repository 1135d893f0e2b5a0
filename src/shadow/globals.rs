//! Shader Globals
//!
//! Cascade outputs are handed to the shading stage by well-known names.
//! Hosts implement [`GlobalSink`] to forward them into their material system;
//! [`ShaderGlobals`] is a plain in-memory implementation.
//!
//! [`CascadeShadowUniform`] packs the same values into a single uniform
//! block for direct upload to a wgpu buffer.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use rustc_hash::FxHashMap;

use super::splits::CASCADE_COUNT;

/// Well-known global names.
pub mod names {
    use super::CASCADE_COUNT;

    /// Array of 4 world-to-shadow matrices.
    pub const WORLD_TO_SHADOW: &str = "u_world_to_shadow";
    /// One depth texture per cascade.
    pub const SHADOW_MAPS: [&str; CASCADE_COUNT] = [
        "t_shadow_map_0",
        "t_shadow_map_1",
        "t_shadow_map_2",
        "t_shadow_map_3",
    ];
    pub const SHADOW_BIAS: &str = "u_shadow_bias";
    pub const SHADOW_STRENGTH: &str = "u_shadow_strength";
    /// Near distance of each cascade, as a vec4.
    pub const SPLITS_NEAR: &str = "u_cascade_splits_near";
    /// Far distance of each cascade, as a vec4.
    pub const SPLITS_FAR: &str = "u_cascade_splits_far";
}

/// Receiver of published shader globals.
pub trait GlobalSink<T> {
    fn set_float(&mut self, name: &'static str, value: f32);
    fn set_vector(&mut self, name: &'static str, value: Vec4);
    fn set_matrix_array(&mut self, name: &'static str, value: &[Mat4]);
    fn set_texture(&mut self, name: &'static str, texture: &T);
}

/// A published global value.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalValue<T> {
    Float(f32),
    Vector(Vec4),
    MatrixArray(Vec<Mat4>),
    Texture(T),
}

/// In-memory global table.
#[derive(Debug, Clone)]
pub struct ShaderGlobals<T> {
    values: FxHashMap<&'static str, GlobalValue<T>>,
}

impl<T> Default for ShaderGlobals<T> {
    fn default() -> Self {
        Self {
            values: FxHashMap::default(),
        }
    }
}

impl<T> ShaderGlobals<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GlobalValue<T>> {
        self.values.get(name)
    }

    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.values.get(name)? {
            GlobalValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn vector(&self, name: &str) -> Option<Vec4> {
        match self.values.get(name)? {
            GlobalValue::Vector(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn matrix_array(&self, name: &str) -> Option<&[Mat4]> {
        match self.values.get(name)? {
            GlobalValue::MatrixArray(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn texture(&self, name: &str) -> Option<&T> {
        match self.values.get(name)? {
            GlobalValue::Texture(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl<T: Clone> GlobalSink<T> for ShaderGlobals<T> {
    fn set_float(&mut self, name: &'static str, value: f32) {
        self.values.insert(name, GlobalValue::Float(value));
    }

    fn set_vector(&mut self, name: &'static str, value: Vec4) {
        self.values.insert(name, GlobalValue::Vector(value));
    }

    fn set_matrix_array(&mut self, name: &'static str, value: &[Mat4]) {
        self.values
            .insert(name, GlobalValue::MatrixArray(value.to_vec()));
    }

    fn set_texture(&mut self, name: &'static str, texture: &T) {
        self.values.insert(name, GlobalValue::Texture(texture.clone()));
    }
}

/// GPU layout of the cascade globals (WGSL `CascadeShadows` block).
///
/// ```wgsl
/// struct CascadeShadows {
///     world_to_shadow: array<mat4x4<f32>, 4>,
///     splits_near: vec4<f32>,
///     splits_far: vec4<f32>,
///     bias: f32,
///     strength: f32,
/// };
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CascadeShadowUniform {
    pub world_to_shadow: [[[f32; 4]; 4]; CASCADE_COUNT],
    pub splits_near: [f32; 4],
    pub splits_far: [f32; 4],
    pub shadow_bias: f32,
    pub shadow_strength: f32,
    pub _padding: [f32; 2],
}
