// SPDX-License-Identifier: MIT OR Apache-2.0
//! Composite value types that interpolate component by component.

use crate::interpolator::{lerp, Lerp};
use serde::{Deserialize, Serialize};

/// 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 2D size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Size {
    /// Create a size
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Inset/margin quad
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Thickness {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Right edge
    pub right: f64,
    /// Bottom edge
    pub bottom: f64,
}

impl Thickness {
    /// Create a thickness from four edges
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    /// Same inset on every edge
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }
}

/// Per-corner radii
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CornerRadius {
    /// Top-left corner
    pub top_left: f64,
    /// Top-right corner
    pub top_right: f64,
    /// Bottom-right corner
    pub bottom_right: f64,
    /// Bottom-left corner
    pub bottom_left: f64,
}

impl CornerRadius {
    /// Create radii clockwise from the top-left corner
    pub const fn new(top_left: f64, top_right: f64, bottom_right: f64, bottom_left: f64) -> Self {
        Self { top_left, top_right, bottom_right, bottom_left }
    }

    /// Same radius on every corner
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }
}

/// Decomposed 2D transform.
///
/// Components blend independently, so a half-way rotation really is half the
/// angle instead of a skewed matrix average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    /// Horizontal translation
    pub translate_x: f64,
    /// Vertical translation
    pub translate_y: f64,
    /// Horizontal scale
    pub scale_x: f64,
    /// Vertical scale
    pub scale_y: f64,
    /// Rotation in degrees
    pub rotation: f64,
    /// Horizontal skew in degrees
    pub skew_x: f64,
    /// Vertical skew in degrees
    pub skew_y: f64,
}

impl Transform2D {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        rotation: 0.0,
        skew_x: 0.0,
        skew_y: 0.0,
    };

    /// Pure translation
    pub fn translation(x: f64, y: f64) -> Self {
        Self { translate_x: x, translate_y: y, ..Self::IDENTITY }
    }

    /// Uniform scale
    pub fn scale(factor: f64) -> Self {
        Self { scale_x: factor, scale_y: factor, ..Self::IDENTITY }
    }

    /// Pure rotation in degrees
    pub fn rotation(degrees: f64) -> Self {
        Self { rotation: degrees, ..Self::IDENTITY }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
}

impl Color {
    /// Fully transparent black
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque black
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque red
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Opaque green
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    /// Opaque blue
    pub const BLUE: Self = Self::rgb(0, 0, 255);

    /// Create a color with alpha
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Alpha as a factor in `[0, 1]`
    pub fn opacity(&self) -> f64 {
        f64::from(self.a) / 255.0
    }

    /// Same color with alpha replaced by `opacity` (clamped to `[0, 1]`)
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self { a: channel(opacity.clamp(0.0, 1.0) * 255.0), ..self }
    }
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    channel(lerp(f64::from(a), f64::from(b), t))
}

impl Lerp for Point {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Self::new(lerp(self.x, to.x, t), lerp(self.y, to.y, t))
    }
}

impl Lerp for Size {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Self::new(lerp(self.width, to.width, t), lerp(self.height, to.height, t))
    }
}

impl Lerp for Thickness {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Self::new(
            lerp(self.left, to.left, t),
            lerp(self.top, to.top, t),
            lerp(self.right, to.right, t),
            lerp(self.bottom, to.bottom, t),
        )
    }
}

impl Lerp for CornerRadius {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Self::new(
            lerp(self.top_left, to.top_left, t),
            lerp(self.top_right, to.top_right, t),
            lerp(self.bottom_right, to.bottom_right, t),
            lerp(self.bottom_left, to.bottom_left, t),
        )
    }
}

impl Lerp for Transform2D {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Self {
            translate_x: lerp(self.translate_x, to.translate_x, t),
            translate_y: lerp(self.translate_y, to.translate_y, t),
            scale_x: lerp(self.scale_x, to.scale_x, t),
            scale_y: lerp(self.scale_y, to.scale_y, t),
            rotation: lerp(self.rotation, to.rotation, t),
            skew_x: lerp(self.skew_x, to.skew_x, t),
            skew_y: lerp(self.skew_y, to.skew_y, t),
        }
    }
}

impl Lerp for Color {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Self::rgba(
            lerp_channel(self.r, to.r, t),
            lerp_channel(self.g, to.g, t),
            lerp_channel(self.b, to.b, t),
            lerp_channel(self.a, to.a, t),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolator::linear_frames;

    #[test]
    fn test_thickness_blends_each_edge() {
        let from = Thickness::uniform(0.0);
        let to = Thickness::new(20.0, 40.0, 60.0, 80.0);
        let mid = from.lerp(&to, 0.5);
        assert_eq!(mid, Thickness::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_corner_radius_blends_each_corner() {
        let frames = linear_frames(&CornerRadius::uniform(0.0), &CornerRadius::new(4.0, 8.0, 12.0, 16.0), 5);
        assert_eq!(frames[2], CornerRadius::new(2.0, 4.0, 6.0, 8.0));
        assert_eq!(frames[4], CornerRadius::new(4.0, 8.0, 12.0, 16.0));
    }

    #[test]
    fn test_transform_components_are_independent() {
        let from = Transform2D::IDENTITY;
        let to = Transform2D {
            translate_x: 100.0,
            translate_y: 200.0,
            scale_x: 2.0,
            scale_y: 3.0,
            rotation: 90.0,
            skew_x: 10.0,
            skew_y: -10.0,
        };
        let mid = from.lerp(&to, 0.5);
        assert_eq!(mid.translate_x, 50.0);
        assert_eq!(mid.translate_y, 100.0);
        assert_eq!(mid.scale_x, 1.5);
        assert_eq!(mid.scale_y, 2.0);
        assert_eq!(mid.rotation, 45.0);
        assert_eq!(mid.skew_x, 5.0);
        assert_eq!(mid.skew_y, -5.0);
    }

    #[test]
    fn test_color_midpoint_is_component_wise() {
        let mid = Color::RED.lerp(&Color::BLUE, 0.5);
        assert_eq!(mid, Color::rgba(128, 0, 128, 255));
    }

    #[test]
    fn test_color_opacity_round_trips() {
        let half = Color::WHITE.with_opacity(0.5);
        assert_eq!(half.a, 128);
        assert_eq!(Color::WHITE.with_opacity(2.0).a, 255);
        assert!((Color::BLACK.opacity() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_point_and_size_blend() {
        assert_eq!(Point::new(0.0, 10.0).lerp(&Point::new(10.0, 0.0), 0.25), Point::new(2.5, 7.5));
        assert_eq!(Size::new(10.0, 10.0).lerp(&Size::new(20.0, 30.0), 0.5), Size::new(15.0, 20.0));
    }
}
