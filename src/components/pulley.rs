//! Pulleys and the belts between them.

use std::f64::consts::FRAC_PI_2;

use glam::DVec2;

use crate::{
    components::ComponentId,
    config::BELT_INSET_CM,
    error::{MachineError, Result},
    render::{Color, Graphics, Pen, Polygon},
    rotation::{RotationSource, Signal},
    utils::math::frac,
};

const BELT_WIDTH: f64 = 2.0;

/// A belt from one pulley to a pulley it drives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Belt {
    pub driven: ComponentId,
    /// Driver radius over driven radius.
    pub ratio: f64,
}

/// A wheel that is both a rotation sink and a rotation source.
///
/// Belts scale the signal by the radius ratio. Sinks on its own source turn with it
/// one to one.
#[derive(Debug, Clone)]
pub struct Pulley {
    radius: f64,
    position: DVec2,
    angle: f64,
    speed: f64,
    face: Polygon,
    belts: Vec<Belt>,
    pub(crate) source: RotationSource,
}

impl Pulley {
    pub fn new(radius: f64) -> Result<Self> {
        if !(radius > 0.0) {
            return Err(MachineError::InvalidRadius(radius));
        }
        let mut face = Polygon::new();
        face.centered_square(radius * 2.0);
        Ok(Self {
            radius,
            position: DVec2::ZERO,
            angle: 0.0,
            speed: 0.0,
            face,
            belts: Vec::new(),
            source: RotationSource::new(),
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.position = DVec2::new(x, y);
    }

    pub fn set_image(&mut self, image: impl Into<String>) {
        self.face.set_image(image);
    }

    /// Angle in turns.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Speed in turns per second.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn belts(&self) -> &[Belt] {
        &self.belts
    }

    pub fn rotation_source(&self) -> &RotationSource {
        &self.source
    }

    pub(crate) fn drives(&self, pulley: ComponentId) -> bool {
        self.belts.iter().any(|belt| belt.driven == pulley)
    }

    pub(crate) fn add_belt(&mut self, driven: ComponentId, driven_radius: f64) {
        self.belts.push(Belt {
            driven,
            ratio: self.radius / driven_radius,
        });
    }

    /// Records the incoming state and returns what each belt forwards.
    pub(crate) fn receive(&mut self, signal: Signal) -> Vec<(ComponentId, Signal)> {
        self.angle = signal.angle();
        if let Some(speed) = signal.speed() {
            self.speed = speed;
        }
        self.belts
            .iter()
            .map(|belt| {
                let angle = frac(self.angle * belt.ratio);
                let forwarded = match signal {
                    Signal::Angle(_) => Signal::Angle(angle),
                    Signal::Rotate { .. } => Signal::Rotate {
                        angle,
                        speed: self.speed * belt.ratio,
                    },
                };
                (belt.driven, forwarded)
            })
            .collect()
    }

    pub(crate) fn reset_state(&mut self) {
        self.angle = 0.0;
        self.speed = 0.0;
        self.source.reset_state();
    }

    pub fn draw(&self, gfx: &mut dyn Graphics) {
        self.face.draw(gfx, self.position, self.angle);
    }

    /// Strokes the belt to each driven pulley, given as `(position, radius)`.
    pub fn draw_belts(&self, gfx: &mut dyn Graphics, driven: &[(DVec2, f64)]) {
        if driven.is_empty() {
            return;
        }
        gfx.set_pen(Pen::new(Color::BLACK, BELT_WIDTH));
        for &(position, radius) in driven {
            if let Some(lines) = belt_lines(self.position, self.radius, position, radius) {
                for (from, to) in lines {
                    gfx.stroke_line(from, to);
                }
            }
        }
    }
}

/// The two outer tangent lines of a belt between pulleys at `p1` and `p2`.
///
/// The belt runs [`BELT_INSET_CM`] inside each rim. Returns `None` when the pulleys
/// share a centre.
pub fn belt_lines(p1: DVec2, r1: f64, p2: DVec2, r2: f64) -> Option<[(DVec2, DVec2); 2]> {
    let r1 = r1 - BELT_INSET_CM;
    let r2 = r2 - BELT_INSET_CM;
    let delta = p2 - p1;
    let distance = delta.length();
    if distance < 0.001 {
        return None;
    }

    let theta = delta.y.atan2(delta.x);
    let phi = ((r2 - r1) / distance).clamp(-1.0, 1.0).asin();

    let line = |angle: f64| {
        let dir = DVec2::new(angle.cos(), angle.sin());
        (p1 + dir * r1, p2 + dir * r2)
    };
    Some([
        line(theta + phi + FRAC_PI_2),
        line(theta - phi - FRAC_PI_2),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn belt_ratio_scales_speed_and_wraps_angle() {
        let mut a = Pulley::new(10.0).expect("radius");
        a.add_belt(ComponentId(1), 20.0);
        let forwarded = a.receive(Signal::Rotate {
            angle: 0.9,
            speed: 1.0,
        });
        assert_eq!(forwarded.len(), 1);
        let (driven, signal) = forwarded[0];
        assert_eq!(driven, ComponentId(1));
        assert_relative_eq!(signal.angle(), 0.45, epsilon = 1e-12);
        assert_eq!(signal.speed(), Some(0.5));

        let mut small = Pulley::new(10.0).expect("radius");
        small.add_belt(ComponentId(2), 5.0);
        let (_, signal) = small.receive(Signal::Angle(0.75))[0];
        assert_relative_eq!(signal.angle(), 0.5, epsilon = 1e-12);
        assert_eq!(signal.speed(), None);
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        assert!(matches!(Pulley::new(0.0), Err(MachineError::InvalidRadius(_))));
        assert!(Pulley::new(-3.0).is_err());
    }

    #[test]
    fn equal_pulleys_get_parallel_belts() {
        let lines = belt_lines(DVec2::ZERO, 10.0, DVec2::new(100.0, 0.0), 10.0).expect("apart");
        let (top_from, top_to) = lines[0];
        let (bottom_from, bottom_to) = lines[1];
        assert_relative_eq!(top_from.y, 7.0, epsilon = 1e-9);
        assert_relative_eq!(top_to.y, 7.0, epsilon = 1e-9);
        assert_relative_eq!(bottom_from.y, -7.0, epsilon = 1e-9);
        assert_relative_eq!(bottom_to.x, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn coincident_pulleys_have_no_belt() {
        assert!(belt_lines(DVec2::ONE, 10.0, DVec2::ONE, 25.0).is_none());
    }
}
