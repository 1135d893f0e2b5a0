//! Error Types
//!
//! This module defines the error types used by the shadow system.
//!
//! # Overview
//!
//! [`ShadowError`] covers the failure modes of construction-time APIs:
//! - Invalid [`CascadeShadowSettings`](crate::shadow::CascadeShadowSettings)
//! - GPU backend setup failures
//!
//! The per-frame update never returns an error. Degenerate input there is
//! clamped or skipped and reported through the `log` facade instead.
//!
//! # Usage
//!
//! ```rust,ignore
//! use umbra::errors::Result;
//! use umbra::shadow::CascadeShadowSettings;
//!
//! fn configure() -> Result<()> {
//!     CascadeShadowSettings::default().validate()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the shadow system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShadowError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Shadow map resolution must be non-zero.
    #[error("Invalid shadow map resolution: {0}")]
    InvalidResolution(u32),

    /// A cascade split span is zero, negative or not finite.
    #[error("Invalid split span for cascade {cascade}: {value}")]
    InvalidSplitSpan {
        /// Cascade index of the offending span
        cascade: usize,
        /// The rejected value
        value: f32,
    },

    /// The split spans do not add up to the whole depth range.
    #[error("Split spans must sum to 1.0, got {0}")]
    SplitSpansNotNormalized(f32),

    /// A scalar shading parameter is out of its accepted range.
    #[error("Invalid shading parameter `{name}`: {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// The rejected value
        value: f32,
    },

    // ========================================================================
    // GPU Errors
    // ========================================================================
    /// The adapter supports none of the depth formats the backend can use.
    #[error("No renderable depth format available: {0}")]
    NoDepthFormat(String),
}

/// Alias for `Result<T, ShadowError>`.
pub type Result<T> = std::result::Result<T, ShadowError>;
