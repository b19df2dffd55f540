//! Kinematic platform that lifts whatever rests on it.

use glam::{DVec2, Vec2};

use crate::{
    collision::contact::Contact,
    config::{DEFAULT_SPEED_MULTIPLIER, MTOCM},
    core::{
        rigidbody::RigidBody,
        types::{BodyType, Material},
    },
    error::{MachineError, Result},
    physics_shape::PhysicsShape,
    render::Graphics,
    rotation::Signal,
    utils::allocator::{Arena, BodyId},
    world::PhysicsWorld,
};

/// A kinematic platform that moves vertically with its driving speed.
///
/// Positive speed moves it up. Dynamic bodies touching it take on its vertical velocity.
#[derive(Debug, Clone)]
pub struct Elevator {
    body: PhysicsShape,
    speed: f64,
    speed_multiplier: f64,
}

impl Default for Elevator {
    fn default() -> Self {
        Self::new()
    }
}

impl Elevator {
    pub fn new() -> Self {
        let mut body = PhysicsShape::new();
        body.set_body_type(BodyType::Kinematic);
        body.set_material(Material::new(1.0, 0.5, 0.0));
        Self {
            body,
            speed: 0.0,
            speed_multiplier: DEFAULT_SPEED_MULTIPLIER,
        }
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.body.bottom_centered_rectangle(width, height);
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.body.set_initial_position(DVec2::new(x, y));
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

    /// Vertical platform speed in m/s.
    pub fn vertical_speed(&self) -> f32 {
        (self.speed * self.speed_multiplier / MTOCM) as f32
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

    fn push_platform(&mut self, world: &mut PhysicsWorld) -> Result<()> {
        self.body.set_gravity_scale(world, 0.0)?;
        self.body
            .set_linear_velocity(world, DVec2::new(0.0, self.speed * self.speed_multiplier))
    }

    pub(crate) fn receive(&mut self, signal: Signal, world: &mut PhysicsWorld) -> Result<()> {
        let Some(speed) = signal.speed() else {
            return Ok(());
        };
        self.speed = speed;
        self.push_platform(world)
    }

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

        self.push_platform(world)?;
        let vy = self.vertical_speed();
        for rider in world.touching_dynamic_bodies(id) {
            if let Some(body) = world.body_mut(rider) {
                let vx = body.velocity.linear.x;
                body.set_linear_velocity(Vec2::new(vx, vy));
            }
        }
        Ok(())
    }

    pub(crate) fn pre_solve(&self, contact: &Contact, bodies: &mut Arena<RigidBody>) {
        if self.speed == 0.0 {
            return;
        }
        let Some(rider) = self.body().and_then(|id| contact.other(id)) else {
            return;
        };
        if let Some(body) = bodies.get_mut(rider).filter(|body| body.is_dynamic()) {
            let vx = body.velocity.linear.x;
            body.set_linear_velocity(Vec2::new(vx, self.vertical_speed()));
        }
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
    fn rotate_moves_installed_platform_immediately() {
        let mut world = PhysicsWorld::default();
        let mut elevator = Elevator::new();
        elevator.set_size(50.0, 15.0);
        let id = elevator
            .physics_shape_mut()
            .install(&mut world)
            .expect("install");

        elevator
            .receive(Signal::Rotate { angle: 0.0, speed: 0.5 }, &mut world)
            .expect("live body");
        let body = world.body(id).expect("body");
        assert_relative_eq!(body.velocity.linear.y, 0.25);
        assert_eq!(body.gravity_scale, 0.0);
    }

    #[test]
    fn rotate_before_install_only_records_speed() {
        let mut world = PhysicsWorld::default();
        let mut elevator = Elevator::new();
        elevator
            .receive(Signal::Rotate { angle: 0.0, speed: -1.0 }, &mut world)
            .expect("nothing installed");
        assert_eq!(elevator.speed(), -1.0);
        assert_relative_eq!(elevator.vertical_speed(), -0.5);
    }
}
