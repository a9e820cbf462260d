// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value interpolation for Cadence.
//!
//! This crate provides the building blocks transitions are made of:
//! - Easing curves (`Ease`, custom `EaseCalculator`s)
//! - Type-erased property values
//! - Interpolator strategies and linear blending
//! - Built-in geometric and color value types
//! - Brush interpolation with crossfading
//!
//! ## Architecture
//!
//! Interpolation is type driven:
//! - Each value type maps to one `Interpolator` in an `InterpolatorRegistry`
//! - An interpolator realizes every frame value up front from `(start, end, steps)`
//! - Easing is applied later, when a frame index is picked from progress

pub mod brush;
pub mod ease;
pub mod error;
pub mod interpolator;
pub mod registry;
pub mod types;
pub mod value;

pub use brush::{Brush, BrushInterpolator, Crossfade, Gradient, GradientStop, ImageFill};
pub use ease::{Ease, EaseCalculator, EaseFn};
pub use error::{InterpError, Result};
pub use interpolator::{
    frame_progress, lerp, linear_frames, sample_frames, FnInterpolator, Interpolator, Lerp,
    LinearInterpolator,
};
pub use registry::InterpolatorRegistry;
pub use types::{Color, CornerRadius, Point, Size, Thickness, Transform2D};
pub use value::Value;
