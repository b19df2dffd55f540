//! Unit conversions between the design surface and the physics engine.
//!
//! The design surface works in centimetres and turns (f64). The engine works
//! in metres and radians (f32).

use glam::{DVec2, Vec2};
use std::f64::consts::TAU;

use crate::config::MTOCM;

/// Fractional part in `[0, 1)`, also for negative inputs.
pub fn frac(value: f64) -> f64 {
    let f = value.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}

pub fn turns_to_radians(turns: f64) -> f32 {
    (turns * TAU) as f32
}

pub fn radians_to_turns(radians: f32) -> f64 {
    radians as f64 / TAU
}

pub fn cm_to_m(cm: DVec2) -> Vec2 {
    (cm / MTOCM).as_vec2()
}

pub fn m_to_cm(m: Vec2) -> DVec2 {
    m.as_dvec2() * MTOCM
}

/// Converts a design-surface speed (cm/s) into engine units (m/s).
pub fn cm_per_s_to_m_per_s(speed: f64) -> f32 {
    (speed / MTOCM) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn frac_stays_in_unit_interval() {
        assert_relative_eq!(frac(2.25), 0.25);
        assert_relative_eq!(frac(-0.25), 0.75);
        assert_eq!(frac(3.0), 0.0);
        assert!(frac(-1e-18) < 1.0);
    }

    #[test]
    fn unit_round_trip() {
        let cm = DVec2::new(-95.0, 220.0);
        let back = m_to_cm(cm_to_m(cm));
        assert_relative_eq!(back.x, cm.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, cm.y, epsilon = 1e-4);
        assert_relative_eq!(radians_to_turns(turns_to_radians(0.25)), 0.25, epsilon = 1e-6);
    }
}
