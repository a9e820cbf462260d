// SPDX-License-Identifier: MIT OR Apache-2.0
//! Brushes and brush interpolation.
//!
//! Two solid brushes blend channel by channel. Any other pairing cannot be
//! blended into a valid in-between brush (a gradient half-way to an image has
//! no meaning), so those frames become a [`Brush::Crossfade`]: the start layer
//! fades out while the end layer fades in, in two half-phases that cross at the
//! midpoint.

use crate::error::Result;
use crate::interpolator::{expect_value, frame_progress, lerp, Interpolator, Lerp};
use crate::types::{Color, Point};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A color stop inside a gradient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient in `[0, 1]`
    pub offset: f64,
    /// Color at this position
    pub color: Color,
}

impl GradientStop {
    /// Create a stop
    pub const fn new(offset: f64, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Gradient fill shared by linear and radial gradients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    /// Color stops ordered by offset
    pub stops: Vec<GradientStop>,
    /// Start point (linear) or center (radial), in relative coordinates
    pub origin: Point,
    /// End point (linear) or radius point (radial), in relative coordinates
    pub extent: Point,
    /// Layer opacity
    pub opacity: f64,
}

impl Gradient {
    /// Two-stop gradient running left to right
    pub fn two_stop(from: Color, to: Color) -> Self {
        Self {
            stops: vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
            origin: Point::new(0.0, 0.5),
            extent: Point::new(1.0, 0.5),
            opacity: 1.0,
        }
    }
}

/// Image/pattern fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFill {
    /// Image source identifier
    pub source: String,
    /// Layer opacity
    pub opacity: f64,
}

/// Two stacked layers captured mid-way through a non-solid brush transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crossfade {
    /// Outgoing layer
    pub from: Brush,
    /// Incoming layer
    pub to: Brush,
}

/// Paint used to fill an area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Brush {
    /// Single color
    Solid(Color),
    /// Linear gradient
    LinearGradient(Gradient),
    /// Radial gradient
    RadialGradient(Gradient),
    /// Image or tiled pattern
    Image(ImageFill),
    /// In-between frame of a non-solid transition
    Crossfade(Box<Crossfade>),
}

impl Brush {
    /// Solid brush
    pub fn solid(color: Color) -> Self {
        Self::Solid(color)
    }

    /// Image brush at full opacity
    pub fn image(source: impl Into<String>) -> Self {
        Self::Image(ImageFill { source: source.into(), opacity: 1.0 })
    }

    /// Effective opacity of the brush
    pub fn opacity(&self) -> f64 {
        match self {
            Self::Solid(color) => color.opacity(),
            Self::LinearGradient(g) | Self::RadialGradient(g) => g.opacity,
            Self::Image(image) => image.opacity,
            Self::Crossfade(fade) => fade.from.opacity().max(fade.to.opacity()),
        }
    }

    /// Same brush with its opacity replaced
    pub fn with_opacity(&self, opacity: f64) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        match self {
            Self::Solid(color) => Self::Solid(color.with_opacity(opacity)),
            Self::LinearGradient(g) => Self::LinearGradient(Gradient { opacity, ..g.clone() }),
            Self::RadialGradient(g) => Self::RadialGradient(Gradient { opacity, ..g.clone() }),
            Self::Image(image) => Self::Image(ImageFill { opacity, ..image.clone() }),
            Self::Crossfade(fade) => {
                let current = self.opacity();
                let scale = if current > 0.0 { opacity / current } else { 0.0 };
                Self::Crossfade(Box::new(Crossfade {
                    from: fade.from.with_opacity(fade.from.opacity() * scale),
                    to: fade.to.with_opacity(fade.to.opacity() * scale),
                }))
            }
        }
    }

    /// Whether this is a solid color brush
    pub fn is_solid(&self) -> bool {
        matches!(self, Self::Solid(_))
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::Solid(Color::TRANSPARENT)
    }
}

/// Layer opacities of a crossfade at progress `t`.
///
/// Returns `(start_factor, end_opacity)`: the factor multiplies the start
/// layer's own opacity, the end opacity is absolute. Phase one runs the start
/// from 1 to 0.5 and the end from 0 to 0.5; phase two runs the start from 0.5
/// to 0 and the end from 0.5 to its target opacity.
pub fn crossfade_weights(t: f64, end_opacity: f64) -> (f64, f64) {
    let t = t.clamp(0.0, 1.0);
    if t <= 0.5 {
        let u = t / 0.5;
        (lerp(1.0, 0.5, u), lerp(0.0, 0.5, u))
    } else {
        let u = (t - 0.5) / 0.5;
        (lerp(0.5, 0.0, u), lerp(0.5, end_opacity, u))
    }
}

/// Crossfade frame between two brushes at progress `t`
pub fn crossfade(start: &Brush, end: &Brush, t: f64) -> Brush {
    let (start_factor, end_opacity) = crossfade_weights(t, end.opacity());
    Brush::Crossfade(Box::new(Crossfade {
        from: start.with_opacity(start.opacity() * start_factor),
        to: end.with_opacity(end_opacity),
    }))
}

/// Interpolator for [`Brush`] values
#[derive(Debug, Clone, Copy, Default)]
pub struct BrushInterpolator;

impl BrushInterpolator {
    /// Realize typed brush frames
    pub fn frames(start: &Brush, end: &Brush, steps: usize) -> Vec<Brush> {
        if steps <= 1 {
            return vec![end.clone()];
        }
        (0..steps)
            .map(|i| {
                if i == 0 {
                    return start.clone();
                }
                if i == steps - 1 {
                    return end.clone();
                }
                let t = frame_progress(i, steps);
                match (start, end) {
                    (Brush::Solid(a), Brush::Solid(b)) => Brush::Solid(a.lerp(b, t)),
                    _ => crossfade(start, end, t),
                }
            })
            .collect()
    }
}

impl Interpolator for BrushInterpolator {
    fn interpolate(&self, start: &Value, end: &Value, steps: usize) -> Result<Vec<Value>> {
        let from = expect_value::<Brush>(start)?;
        let to = expect_value::<Brush>(end)?;
        Ok(Self::frames(from, to, steps).into_iter().map(Value::new).collect())
    }
}
