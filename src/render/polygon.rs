use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{Color, Graphics, Pen};

/// Segments used to approximate a circle when it has to be outlined.
const CIRCLE_SEGMENTS: usize = 24;

/// Geometry of a visual polygon, in centimetres about its local origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outline {
    Points(Vec<DVec2>),
    Circle(f64),
}

impl Default for Outline {
    fn default() -> Self {
        Outline::Points(Vec::new())
    }
}

/// Visual outline with an optional image and fill colour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    outline: Outline,
    image: Option<String>,
    color: Option<Color>,
}

impl Polygon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn is_circle(&self) -> bool {
        matches!(self.outline, Outline::Circle(_))
    }

    pub fn radius(&self) -> Option<f64> {
        match self.outline {
            Outline::Circle(radius) => Some(radius),
            Outline::Points(_) => None,
        }
    }

    pub fn points(&self) -> &[DVec2] {
        match &self.outline {
            Outline::Points(points) => points,
            Outline::Circle(_) => &[],
        }
    }

    /// Rectangle with its lower-left corner at `(x, y)`.
    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.outline = Outline::Points(vec![
            DVec2::new(x, y),
            DVec2::new(x + width, y),
            DVec2::new(x + width, y + height),
            DVec2::new(x, y + height),
        ]);
    }

    /// Rectangle centred horizontally on the origin with its bottom edge on it.
    pub fn bottom_centered_rectangle(&mut self, width: f64, height: f64) {
        self.rectangle(-width / 2.0, 0.0, width, height);
    }

    pub fn centered_square(&mut self, size: f64) {
        self.rectangle(-size / 2.0, -size / 2.0, size, size);
    }

    pub fn circle(&mut self, radius: f64) {
        self.outline = Outline::Circle(radius);
    }

    /// Appends a vertex. A circle outline is replaced by a point list.
    pub fn add_point(&mut self, x: f64, y: f64) {
        match &mut self.outline {
            Outline::Points(points) => points.push(DVec2::new(x, y)),
            Outline::Circle(_) => self.outline = Outline::Points(vec![DVec2::new(x, y)]),
        }
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn set_image(&mut self, image: impl Into<String>) {
        self.image = Some(image.into());
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = Some(color);
    }

    /// Lower-left and upper-right corners of the outline.
    pub fn bounding_box(&self) -> (DVec2, DVec2) {
        match &self.outline {
            Outline::Circle(radius) => (DVec2::splat(-radius), DVec2::splat(*radius)),
            Outline::Points(points) => {
                let Some(first) = points.first() else {
                    return (DVec2::ZERO, DVec2::ZERO);
                };
                points
                    .iter()
                    .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)))
            }
        }
    }

    /// Points used when the outline itself has to be stroked.
    pub fn outline_points(&self) -> Vec<DVec2> {
        match &self.outline {
            Outline::Points(points) => points.clone(),
            Outline::Circle(radius) => (0..CIRCLE_SEGMENTS)
                .map(|i| {
                    let a = i as f64 / CIRCLE_SEGMENTS as f64 * std::f64::consts::TAU;
                    DVec2::new(radius * a.cos(), radius * a.sin())
                })
                .collect(),
        }
    }

    /// Draws the polygon at `position` rotated by `rotation` turns.
    ///
    /// An image that cannot be loaded is replaced by a grey outline.
    pub fn draw(&self, gfx: &mut dyn Graphics, position: DVec2, rotation: f64) {
        gfx.push_state();
        gfx.translate(position.x, position.y);
        gfx.rotate(rotation * std::f64::consts::TAU);

        let mut drawn = false;
        if let Some(image) = &self.image {
            let (min, max) = self.bounding_box();
            // images are stored top-down, the machine surface is y-up
            gfx.push_state();
            gfx.scale(1.0, -1.0);
            drawn = gfx.draw_image(image, DVec2::new(min.x, -max.y), max - min);
            gfx.pop_state();
            if !drawn {
                gfx.set_pen(Pen::new(Color::GRAY, 1.0));
                gfx.stroke_polygon(&self.outline_points());
                drawn = true;
            }
        }

        if !drawn {
            match (&self.outline, self.color) {
                (Outline::Circle(radius), Some(color)) => gfx.fill_circle(DVec2::ZERO, *radius, color),
                (Outline::Points(points), Some(color)) => gfx.fill_polygon(points, color),
                (_, None) => {
                    gfx.set_pen(Pen::default());
                    gfx.stroke_polygon(&self.outline_points());
                }
            }
        }

        gfx.pop_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCall, RecordingGraphics};

    #[test]
    fn bottom_centered_rectangle_sits_on_origin() {
        let mut polygon = Polygon::new();
        polygon.bottom_centered_rectangle(75.0, 50.0);
        let (min, max) = polygon.bounding_box();
        assert_eq!(min, DVec2::new(-37.5, 0.0));
        assert_eq!(max, DVec2::new(37.5, 50.0));
    }

    #[test]
    fn missing_image_falls_back_to_outline() {
        let mut polygon = Polygon::new();
        polygon.centered_square(20.0);
        polygon.set_image("images/pulley.png");

        let mut gfx = RecordingGraphics::new();
        gfx.mark_missing("images/pulley.png");
        polygon.draw(&mut gfx, DVec2::new(5.0, 5.0), 0.0);

        assert!(gfx
            .calls()
            .iter()
            .any(|call| matches!(call, DrawCall::StrokePolygon(points) if points.len() == 4)));
        assert_eq!(gfx.depth(), 0);
    }
}
