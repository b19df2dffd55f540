//! Conveyor belt that carries resting bodies sideways.

use glam::{DVec2, Vec2};

use crate::{
    collision::contact::Contact,
    config::{DEFAULT_SPEED_MULTIPLIER, MTOCM},
    error::{MachineError, Result},
    physics_shape::PhysicsShape,
    render::Graphics,
    rotation::Signal,
    utils::allocator::BodyId,
    world::PhysicsWorld,
};

/// A static belt surface that carries whatever rests on it.
///
/// Positive driving speed moves objects toward +x.
#[derive(Debug, Clone)]
pub struct Conveyor {
    body: PhysicsShape,
    speed: f64,
    speed_multiplier: f64,
}

impl Default for Conveyor {
    fn default() -> Self {
        Self::new()
    }
}

impl Conveyor {
    pub fn new() -> Self {
        Self {
            body: PhysicsShape::new(),
            speed: 0.0,
            speed_multiplier: DEFAULT_SPEED_MULTIPLIER,
        }
    }

    /// Bottom-centred belt of `width` by `height` cm.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.body.bottom_centered_rectangle(width, height);
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.body.set_initial_position(DVec2::new(x, y));
    }

    pub fn position(&self) -> DVec2 {
        self.body.initial_position()
    }

    pub fn set_image(&mut self, image: impl Into<String>) {
        self.body.set_image(image);
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f64) {
        self.speed_multiplier = multiplier;
    }

    /// Belt surface speed in m/s, positive toward +x.
    pub fn surface_speed(&self) -> f32 {
        (self.speed * self.speed_multiplier / MTOCM) as f32
    }

    /// Value assigned to every contact's tangent speed in pre-solve.
    pub fn tangent_speed(&self) -> f32 {
        -self.surface_speed()
    }

    pub fn physics_shape(&self) -> &PhysicsShape {
        &self.body
    }

    pub(crate) fn physics_shape_mut(&mut self) -> &mut PhysicsShape {
        &mut self.body
    }

    pub fn body(&self) -> Option<BodyId> {
        self.body.body()
    }

    pub(crate) fn receive(&mut self, signal: Signal) {
        if let Some(speed) = signal.speed() {
            self.speed = speed;
        }
    }

    /// Sets the x velocity of every dynamic body on the belt, keeping its y velocity.
    pub(crate) fn update(&mut self, world: &mut PhysicsWorld) -> Result<()> {
        let Some(id) = self.body() else {
            return Ok(());
        };
        if !world.contains(id) {
            return Err(MachineError::StaleBody(id));
        }
        if self.speed == 0.0 {
            return Ok(());
        }

        let vx = self.surface_speed();
        for other in world.touching_dynamic_bodies(id) {
            if let Some(body) = world.body_mut(other) {
                let vy = body.velocity.linear.y;
                body.set_linear_velocity(Vec2::new(vx, vy));
            }
        }
        Ok(())
    }

    pub(crate) fn pre_solve(&self, contact: &mut Contact) {
        contact.set_tangent_speed(self.tangent_speed());
    }

    pub(crate) fn reset_state(&mut self) {
        self.speed = 0.0;
    }

    pub fn draw(&self, gfx: &mut dyn Graphics, world: &PhysicsWorld) {
        self.body.draw(gfx, world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn surface_and_tangent_speeds_have_opposite_signs() {
        let mut conveyor = Conveyor::new();
        conveyor.receive(Signal::Rotate { angle: 0.3, speed: 0.25 });
        assert_relative_eq!(conveyor.surface_speed(), 0.125);
        assert_relative_eq!(conveyor.tangent_speed(), -0.125);

        conveyor.receive(Signal::Angle(0.9));
        assert_eq!(conveyor.speed(), 0.25);
    }
}
