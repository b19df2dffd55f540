use std::collections::BTreeSet;

use glam::DVec2;

use super::{Color, Graphics, Pen};

/// One call issued against a [`RecordingGraphics`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    PushState,
    PopState,
    Translate(DVec2),
    Scale(DVec2),
    Rotate(f64),
    SetPen(Pen),
    StrokeLine(DVec2, DVec2),
    FillPolygon(Vec<DVec2>, Color),
    StrokePolygon(Vec<DVec2>),
    FillCircle(DVec2, f64, Color),
    DrawImage {
        image: String,
        origin: DVec2,
        size: DVec2,
    },
}

/// Headless [`Graphics`] backend that records every call in order.
///
/// Images listed with [`mark_missing`](Self::mark_missing) fail to load.
#[derive(Debug, Default, Clone)]
pub struct RecordingGraphics {
    calls: Vec<DrawCall>,
    missing_images: BTreeSet<String>,
    depth: usize,
}

impl RecordingGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_missing(&mut self, image: impl Into<String>) {
        self.missing_images.insert(image.into());
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    /// Current transform stack depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Names of every image that was drawn successfully, in call order.
    pub fn images(&self) -> impl Iterator<Item = &str> + '_ {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::DrawImage { image, .. } => Some(image.as_str()),
            _ => None,
        })
    }

    /// Index of the first successful draw of `image`.
    pub fn position_of_image(&self, image: &str) -> Option<usize> {
        self.calls.iter().position(
            |call| matches!(call, DrawCall::DrawImage { image: drawn, .. } if drawn == image),
        )
    }
}

impl Graphics for RecordingGraphics {
    fn push_state(&mut self) {
        self.depth += 1;
        self.calls.push(DrawCall::PushState);
    }

    fn pop_state(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.calls.push(DrawCall::PopState);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.calls.push(DrawCall::Translate(DVec2::new(x, y)));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.calls.push(DrawCall::Scale(DVec2::new(sx, sy)));
    }

    fn rotate(&mut self, radians: f64) {
        self.calls.push(DrawCall::Rotate(radians));
    }

    fn set_pen(&mut self, pen: Pen) {
        self.calls.push(DrawCall::SetPen(pen));
    }

    fn stroke_line(&mut self, from: DVec2, to: DVec2) {
        self.calls.push(DrawCall::StrokeLine(from, to));
    }

    fn fill_polygon(&mut self, points: &[DVec2], color: Color) {
        self.calls.push(DrawCall::FillPolygon(points.to_vec(), color));
    }

    fn stroke_polygon(&mut self, points: &[DVec2]) {
        self.calls.push(DrawCall::StrokePolygon(points.to_vec()));
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Color) {
        self.calls.push(DrawCall::FillCircle(center, radius, color));
    }

    fn draw_image(&mut self, image: &str, origin: DVec2, size: DVec2) -> bool {
        if self.missing_images.contains(image) {
            return false;
        }
        self.calls.push(DrawCall::DrawImage {
            image: image.to_string(),
            origin,
            size,
        });
        true
    }
}
