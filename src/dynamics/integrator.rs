use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{MAX_ROTATION, MAX_TRANSLATION};

use super::solver::SolverBody;

/// Integrator responsible for stepping rigid bodies forward in time.
///
/// Each body is integrated independently, so the parallel and serial paths give
/// identical results.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub gravity: Vec2,
    parallel: bool,
}

impl Integrator {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            parallel: cfg!(feature = "parallel"),
        }
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled && cfg!(feature = "parallel");
    }

    /// Applies gravity and accumulated forces. Only dynamic bodies are affected.
    pub fn integrate_velocity(gravity: Vec2, body: &mut SolverBody, dt: f32) {
        if !body.is_dynamic {
            return;
        }
        body.linear_velocity +=
            dt * (body.gravity_scale * gravity + body.inverse_mass * body.force);
        body.angular_velocity += dt * body.inverse_inertia * body.torque;
        body.force = Vec2::ZERO;
        body.torque = 0.0;
    }

    /// Moves the centre of mass, clamping the per-step translation and rotation.
    pub fn integrate_position(body: &mut SolverBody, dt: f32) {
        if body.is_static {
            return;
        }

        let translation = dt * body.linear_velocity;
        if translation.length_squared() > MAX_TRANSLATION * MAX_TRANSLATION {
            body.linear_velocity *= MAX_TRANSLATION / translation.length();
        }

        let rotation = dt * body.angular_velocity;
        if rotation * rotation > MAX_ROTATION * MAX_ROTATION {
            body.angular_velocity *= MAX_ROTATION / rotation.abs();
        }

        body.center += dt * body.linear_velocity;
        body.angle += dt * body.angular_velocity;
    }

    pub fn integrate_velocities(&self, bodies: &mut [SolverBody], dt: f32) {
        let gravity = self.gravity;
        #[cfg(feature = "parallel")]
        if self.parallel {
            bodies
                .par_iter_mut()
                .for_each(|body| Self::integrate_velocity(gravity, body, dt));
            return;
        }
        for body in bodies.iter_mut() {
            Self::integrate_velocity(gravity, body, dt);
        }
    }

    pub fn integrate_positions(&self, bodies: &mut [SolverBody], dt: f32) {
        #[cfg(feature = "parallel")]
        if self.parallel {
            bodies
                .par_iter_mut()
                .for_each(|body| Self::integrate_position(body, dt));
            return;
        }
        for body in bodies.iter_mut() {
            Self::integrate_position(body, dt);
        }
    }
}
