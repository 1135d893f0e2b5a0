//! Multi-light registry
//!
//! Keeps one [`CascadeShadowMap`] per directional light id. Lights that show
//! up get fresh state, lights that disappear have their depth maps released.

use rustc_hash::{FxHashMap, FxHashSet};

use super::backend::ShadowBackend;
use super::cascade::CascadeShadowMap;
use super::globals::GlobalSink;
use super::settings::CascadeShadowSettings;
use crate::errors::Result;
use crate::scene::{CameraState, DirectionalLight};

/// Cascaded shadow maps for any number of directional lights.
pub struct CascadeShadowSystem<T> {
    settings: CascadeShadowSettings,
    maps: FxHashMap<u64, CascadeShadowMap<T>>,
}

impl<T> CascadeShadowSystem<T> {
    /// Creates an empty system; every light uses `settings`.
    pub fn new(settings: CascadeShadowSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            maps: FxHashMap::default(),
        })
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &CascadeShadowSettings {
        &self.settings
    }

    #[must_use]
    pub fn get(&self, light_id: u64) -> Option<&CascadeShadowMap<T>> {
        self.maps.get(&light_id)
    }

    /// Ids of the lights currently tracked.
    pub fn light_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.maps.keys().copied()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Runs one frame for the given `(id, light)` set.
    ///
    /// Ids are expected to be unique; a repeated id is ignored after its
    /// first occurrence. Returns the number of lights whose cascades were
    /// rendered.
    pub fn update<B>(
        &mut self,
        backend: &mut B,
        camera: &CameraState,
        lights: &[(u64, DirectionalLight)],
    ) -> usize
    where
        B: ShadowBackend<Texture = T> + ?Sized,
    {
        let mut removed = Vec::new();
        for (&id, map) in &mut self.maps {
            if !lights.iter().any(|(light_id, _)| *light_id == id) {
                map.release(backend);
                removed.push(id);
            }
        }
        for id in removed {
            self.maps.remove(&id);
            log::debug!("CascadeShadowSystem: light {id} removed");
        }

        let mut rendered = 0;
        let mut seen = FxHashSet::default();
        for (id, light) in lights {
            if !seen.insert(*id) {
                log::warn!("CascadeShadowSystem: light {id} listed twice, ignoring duplicate");
                continue;
            }
            let map = self.maps.entry(*id).or_insert_with(|| {
                log::debug!("CascadeShadowSystem: light {id} added");
                CascadeShadowMap::from_validated(self.settings.clone())
            });
            if map.update(backend, camera, Some(light)) {
                rendered += 1;
            }
        }
        rendered
    }

    /// Publishes the globals of one light.
    pub fn publish<S>(&self, light_id: u64, sink: &mut S) -> bool
    where
        S: GlobalSink<T> + ?Sized,
    {
        self.maps
            .get(&light_id)
            .is_some_and(|map| map.publish(sink))
    }

    /// Releases every light's resources. Safe to call repeatedly.
    pub fn shutdown<B>(&mut self, backend: &mut B)
    where
        B: ShadowBackend<Texture = T> + ?Sized,
    {
        for (_, mut map) in self.maps.drain() {
            map.release(backend);
        }
    }
}
