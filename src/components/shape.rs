//! Passive shapes: static scenery, dynamic props and rotation-driven kinematic parts.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{
    core::types::BodyType,
    error::Result,
    physics_shape::PhysicsShape,
    render::{Color, Graphics},
    rotation::Signal,
    world::PhysicsWorld,
};

/// How a shape responds to rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Never moves. Rotation is ignored.
    #[default]
    Static,
    /// Falls and collides; driven through its angular velocity.
    Dynamic,
    /// Moves only as commanded; turns clockwise for positive speed.
    Kinematic,
}

impl ShapeKind {
    pub fn body_type(self) -> BodyType {
        match self {
            ShapeKind::Static => BodyType::Static,
            ShapeKind::Dynamic => BodyType::Dynamic,
            ShapeKind::Kinematic => BodyType::Kinematic,
        }
    }

    fn apply_angle(self, shape: &mut PhysicsShape, world: &mut PhysicsWorld, angle: f64) -> Result<()> {
        match self {
            ShapeKind::Static => Ok(()),
            ShapeKind::Dynamic | ShapeKind::Kinematic => shape.set_rotation(world, angle),
        }
    }

    fn apply_speed(self, shape: &mut PhysicsShape, world: &mut PhysicsWorld, speed: f64) -> Result<()> {
        match self {
            ShapeKind::Static => Ok(()),
            ShapeKind::Dynamic => shape.set_angular_velocity(world, speed),
            ShapeKind::Kinematic => shape.set_angular_velocity(world, -speed),
        }
    }
}

/// A plain body in the scene: balls, floors, ramps, dominoes, spoons.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    polygon: PhysicsShape,
    kind: ShapeKind,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: ShapeKind) {
        self.kind = kind;
        self.polygon.set_body_type(kind.body_type());
    }

    pub fn set_dynamic(&mut self) {
        self.set_kind(ShapeKind::Dynamic);
    }

    pub fn set_kinematic(&mut self) {
        self.set_kind(ShapeKind::Kinematic);
    }

    pub fn physics_shape(&self) -> &PhysicsShape {
        &self.polygon
    }

    pub fn physics_shape_mut(&mut self) -> &mut PhysicsShape {
        &mut self.polygon
    }

    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.polygon.rectangle(x, y, width, height);
    }

    pub fn bottom_centered_rectangle(&mut self, width: f64, height: f64) {
        self.polygon.bottom_centered_rectangle(width, height);
    }

    pub fn circle(&mut self, radius: f64) {
        self.polygon.circle(radius);
    }

    pub fn add_point(&mut self, x: f64, y: f64) {
        self.polygon.add_point(x, y);
    }

    pub fn set_image(&mut self, image: impl Into<String>) {
        self.polygon.set_image(image);
    }

    pub fn set_color(&mut self, color: Color) {
        self.polygon.set_color(color);
    }

    pub fn set_initial_position(&mut self, x: f64, y: f64) {
        self.polygon.set_initial_position(DVec2::new(x, y));
    }

    /// Initial rotation in turns.
    pub fn set_initial_rotation(&mut self, rotation: f64) {
        self.polygon.set_initial_rotation(rotation);
    }

    pub fn set_physics(&mut self, density: f32, friction: f32, restitution: f32) {
        self.polygon.set_physics(density, friction, restitution);
    }

    pub(crate) fn receive(&mut self, signal: Signal, world: &mut PhysicsWorld) -> Result<()> {
        match signal {
            Signal::Angle(angle) => self.kind.apply_angle(&mut self.polygon, world, angle),
            Signal::Rotate { speed, .. } => self.kind.apply_speed(&mut self.polygon, world, speed),
        }
    }

    pub fn draw(&self, gfx: &mut dyn Graphics, world: &PhysicsWorld) {
        self.polygon.draw(gfx, world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::TAU;

    fn installed(kind: ShapeKind, world: &mut PhysicsWorld) -> Shape {
        let mut shape = Shape::new();
        shape.rectangle(-10.0, -40.0, 20.0, 80.0);
        shape.set_kind(kind);
        shape.physics_shape_mut().install(world).expect("install");
        shape
    }

    #[test]
    fn kinematic_shape_turns_clockwise_for_positive_speed() {
        let mut world = PhysicsWorld::default();
        let mut shape = installed(ShapeKind::Kinematic, &mut world);
        shape
            .receive(Signal::Rotate { angle: 0.1, speed: 0.5 }, &mut world)
            .expect("live body");
        let body = world
            .body(shape.physics_shape().body().expect("installed"))
            .expect("body");
        assert_relative_eq!(body.velocity.angular, -0.5 * TAU, epsilon = 1e-6);
    }

    #[test]
    fn dynamic_shape_is_driven_by_angular_velocity() {
        let mut world = PhysicsWorld::default();
        let mut shape = installed(ShapeKind::Dynamic, &mut world);
        shape
            .receive(Signal::Rotate { angle: 0.1, speed: 0.5 }, &mut world)
            .expect("live body");
        let body = world
            .body(shape.physics_shape().body().expect("installed"))
            .expect("body");
        assert_relative_eq!(body.velocity.angular, 0.5 * TAU, epsilon = 1e-6);
    }

    #[test]
    fn static_shape_ignores_rotation() {
        let mut world = PhysicsWorld::default();
        let mut shape = installed(ShapeKind::Static, &mut world);
        shape.receive(Signal::Angle(0.25), &mut world).expect("no-op");
        assert_eq!(shape.physics_shape().rotation(&world), 0.0);
    }
}
