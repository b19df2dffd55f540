//! Drawing surface consumed by machines.
//!
//! The crate never rasterises anything itself: it issues calls against a [`Graphics`]
//! implementation supplied by the host. Images are opaque path tokens.

use glam::DVec2;
use serde::{Deserialize, Serialize};

pub mod polygon;
pub mod recording;

pub use polygon::{Outline, Polygon};
pub use recording::{DrawCall, RecordingGraphics};

/// RGBA colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Stroke settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pen {
    pub color: Color,
    pub width: f64,
}

impl Pen {
    pub fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

impl Default for Pen {
    fn default() -> Self {
        Self::new(Color::BLACK, 1.0)
    }
}

/// A 2D graphics context with a transform stack.
pub trait Graphics {
    fn push_state(&mut self);
    fn pop_state(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn scale(&mut self, sx: f64, sy: f64);
    /// Rotation in radians.
    fn rotate(&mut self, radians: f64);
    fn set_pen(&mut self, pen: Pen);
    fn stroke_line(&mut self, from: DVec2, to: DVec2);
    fn fill_polygon(&mut self, points: &[DVec2], color: Color);
    fn stroke_polygon(&mut self, points: &[DVec2]);
    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Color);
    /// Draws `image` into the rectangle at `origin` with `size`. Returns false when the
    /// image could not be loaded, in which case nothing was drawn.
    fn draw_image(&mut self, image: &str, origin: DVec2, size: DVec2) -> bool;
}
