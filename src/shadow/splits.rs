//! Cascade Split Scheme
//!
//! Partitions the main camera's `[near, far]` range into [`CASCADE_COUNT`]
//! contiguous sub-ranges, denser close to the camera.
//!
//! Split boundaries are fractions of the far distance offset by the near
//! distance: with the default spans the cumulative fractions are
//! `{0, 0.067, 0.2, 0.467, 1.0}`, and cascade `i` covers
//! `[near + far·cum[i], near + far·cum[i+1])`. The last cascade always ends
//! exactly at `far`.

use glam::Vec4;

/// Number of cascades per directional light.
pub const CASCADE_COUNT: usize = 4;

/// Relative depth span of each cascade.
pub const DEFAULT_SPLIT_SPANS: [f32; CASCADE_COUNT] = [0.067, 0.133, 0.267, 0.533];

/// Near/far distances of every cascade, in view-space depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeSplits {
    pub near: [f32; CASCADE_COUNT],
    pub far: [f32; CASCADE_COUNT],
}

impl CascadeSplits {
    /// `(near, far)` of cascade `index`.
    #[inline]
    #[must_use]
    pub fn range(&self, index: usize) -> (f32, f32) {
        (self.near[index], self.far[index])
    }

    /// Iterates `(near, far)` pairs in cascade order.
    pub fn ranges(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.near.iter().copied().zip(self.far.iter().copied())
    }

    /// Near distances packed for shader cascade selection.
    #[inline]
    #[must_use]
    pub fn near_vec4(&self) -> Vec4 {
        Vec4::from_array(self.near)
    }

    /// Far distances packed for shader cascade selection.
    #[inline]
    #[must_use]
    pub fn far_vec4(&self) -> Vec4 {
        Vec4::from_array(self.far)
    }
}

/// Computes the cascade ranges with [`DEFAULT_SPLIT_SPANS`].
#[must_use]
pub fn compute_splits(main_near: f32, main_far: f32) -> CascadeSplits {
    compute_splits_with(main_near, main_far, &DEFAULT_SPLIT_SPANS)
}

/// Computes the cascade ranges for custom relative spans.
///
/// `spans` are expected to be positive and to sum to `1.0` (see
/// [`CascadeShadowSettings::validate`](super::CascadeShadowSettings::validate)).
///
/// When the far-relative boundaries would not be strictly increasing
/// (`main_near` large relative to `main_far`, or `main_far <= 0`), the spans
/// are applied to `main_far - main_near` instead, keeping the ranges
/// contiguous and increasing.
#[must_use]
pub fn compute_splits_with(
    main_near: f32,
    main_far: f32,
    spans: &[f32; CASCADE_COUNT],
) -> CascadeSplits {
    let mut boundaries = [0.0f32; CASCADE_COUNT + 1];
    boundaries[0] = main_near;
    boundaries[CASCADE_COUNT] = main_far;

    let mut offset = 0.0;
    for i in 1..CASCADE_COUNT {
        offset += main_far * spans[i - 1];
        boundaries[i] = offset + main_near;
    }

    // Far-relative boundaries overrun `main_far` for a large near plane and
    // run backwards for a non-positive far plane.
    if !is_increasing(&boundaries) {
        log::debug!(
            "Far-relative cascade splits are not increasing (near={main_near}, far={main_far}), using range-relative spans"
        );
        let range = main_far - main_near;
        let mut cumulative = 0.0;
        for i in 1..CASCADE_COUNT {
            cumulative += spans[i - 1];
            boundaries[i] = main_near + range * cumulative;
        }
    }

    let mut splits = CascadeSplits {
        near: [0.0; CASCADE_COUNT],
        far: [0.0; CASCADE_COUNT],
    };
    for i in 0..CASCADE_COUNT {
        splits.near[i] = boundaries[i];
        splits.far[i] = boundaries[i + 1];
    }
    splits
}

fn is_increasing(boundaries: &[f32]) -> bool {
    boundaries.windows(2).all(|w| w[1] > w[0])
}
