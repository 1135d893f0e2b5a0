use bitflags::bitflags;

bitflags! {
    /// Render layers used to filter which objects a view draws.
    ///
    /// Custom layers beyond the named ones can be built with
    /// [`LayerMask::from_bits_retain`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerMask: u32 {
        const DEFAULT = 1 << 0;
        const TRANSPARENT = 1 << 1;
        const UI = 1 << 5;
        /// Objects that cast shadows into cascade depth maps.
        const SHADOW_CASTER = 1 << 8;
    }
}

impl LayerMask {
    /// Returns `true` if an object on `layers` passes this filter.
    #[inline]
    #[must_use]
    pub fn accepts(self, layers: LayerMask) -> bool {
        self.intersects(layers)
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::DEFAULT
    }
}
