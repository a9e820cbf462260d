// SPDX-License-Identifier: MIT OR Apache-2.0
//! A headless stand-in for a UI panel.

use cadence_interp::{Brush, Color, CornerRadius, Point, Thickness, Transform2D};
use cadence_transition::Property;
use parking_lot::Mutex;
use std::fmt::Write as _;
use std::sync::Arc;

/// Panel with the usual animatable visual properties
pub struct Panel {
    name: String,
    opacity: Mutex<f64>,
    offset: Mutex<Point>,
    padding: Mutex<Thickness>,
    corners: Mutex<CornerRadius>,
    transform: Mutex<Transform2D>,
    background: Mutex<Brush>,
}

impl Panel {
    /// Create a hidden panel
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            opacity: Mutex::new(0.0),
            offset: Mutex::new(Point::new(0.0, 24.0)),
            padding: Mutex::new(Thickness::uniform(4.0)),
            corners: Mutex::new(CornerRadius::uniform(0.0)),
            transform: Mutex::new(Transform2D::IDENTITY),
            background: Mutex::new(Brush::solid(Color::WHITE)),
        })
    }

    /// Panel name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line summary of the current visual state
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let offset = *self.offset.lock();
        let transform = *self.transform.lock();
        let _ = write!(
            out,
            "{}: opacity {:.2}, offset ({:.1}, {:.1}), padding {:.1}, radius {:.1}, scale {:.2}, rotation {:.1}",
            self.name,
            *self.opacity.lock(),
            offset.x,
            offset.y,
            self.padding.lock().left,
            self.corners.lock().top_left,
            transform.scale_x,
            transform.rotation,
        );
        match &*self.background.lock() {
            Brush::Solid(c) => {
                let _ = write!(out, ", background #{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a);
            }
            Brush::Crossfade(_) => out.push_str(", background crossfading"),
            other => {
                let _ = write!(out, ", background {:?} layer", other.opacity());
            }
        }
        out
    }
}

/// Overall opacity
pub const OPACITY: Property<Panel, f64> =
    Property::new("opacity", |p| *p.opacity.lock(), |p, v| *p.opacity.lock() = v);

/// Offset from the layout position
pub const OFFSET: Property<Panel, Point> =
    Property::new("offset", |p| *p.offset.lock(), |p, v| *p.offset.lock() = v);

/// Inner padding
pub const PADDING: Property<Panel, Thickness> =
    Property::new("padding", |p| *p.padding.lock(), |p, v| *p.padding.lock() = v);

/// Corner radii
pub const CORNERS: Property<Panel, CornerRadius> =
    Property::new("corners", |p| *p.corners.lock(), |p, v| *p.corners.lock() = v);

/// Render transform
pub const TRANSFORM: Property<Panel, Transform2D> =
    Property::new("transform", |p| *p.transform.lock(), |p, v| *p.transform.lock() = v);

/// Background fill
pub const BACKGROUND: Property<Panel, Brush> =
    Property::new("background", |p| p.background.lock().clone(), |p, v| *p.background.lock() = v);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_round_trip() {
        let panel = Panel::new("toast");
        OPACITY.set(&panel, 0.5);
        OFFSET.set(&panel, Point::new(3.0, 4.0));
        BACKGROUND.set(&panel, Brush::solid(Color::RED));

        assert_eq!(OPACITY.get(&panel), 0.5);
        assert_eq!(OFFSET.get(&panel), Point::new(3.0, 4.0));
        assert_eq!(panel.name(), "toast");
        assert!(panel.describe().contains("background #ff0000ff"));
    }
}
