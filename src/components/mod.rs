//! The parts a machine is built from.
//!
//! Components live in a per-machine list and refer to each other by [`ComponentId`].

use serde::{Deserialize, Serialize};

use crate::{
    collision::contact::Contact,
    core::rigidbody::RigidBody,
    error::Result,
    physics_shape::PhysicsShape,
    render::Graphics,
    rotation::{RotationSource, Signal},
    router::ListenerHandle,
    utils::allocator::{Arena, BodyId},
    world::PhysicsWorld,
};

pub mod conveyor;
pub mod elevator;
pub mod motor;
pub mod pulley;
pub mod shape;

pub use conveyor::Conveyor;
pub use elevator::Elevator;
pub use motor::{Motor, MotorConfig, MotorState};
pub use pulley::{belt_lines, Belt, Pulley};
pub use shape::{Shape, ShapeKind};

/// Index of a component in its machine, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub usize);

impl ComponentId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum ComponentKind {
    Shape(Shape),
    Motor(Motor),
    Pulley(Pulley),
    Conveyor(Conveyor),
    Elevator(Elevator),
}

/// A component plus the link back to whatever drives it.
#[derive(Debug, Clone)]
pub struct Component {
    kind: ComponentKind,
    driver: Option<ComponentId>,
}

macro_rules! component_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Component {
                fn from(inner: $variant) -> Self {
                    Component::new(ComponentKind::$variant(inner))
                }
            }
        )*
    };
}

component_from!(Shape, Motor, Pulley, Conveyor, Elevator);

impl Component {
    pub fn new(kind: ComponentKind) -> Self {
        Self { kind, driver: None }
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ComponentKind {
        &mut self.kind
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            ComponentKind::Shape(_) => "shape",
            ComponentKind::Motor(_) => "motor",
            ComponentKind::Pulley(_) => "pulley",
            ComponentKind::Conveyor(_) => "conveyor",
            ComponentKind::Elevator(_) => "elevator",
        }
    }

    /// The source or pulley this component receives rotation from.
    pub fn driver(&self) -> Option<ComponentId> {
        self.driver
    }

    pub(crate) fn set_driver(&mut self, driver: ComponentId) {
        self.driver = Some(driver);
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match &self.kind {
            ComponentKind::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_motor(&self) -> Option<&Motor> {
        match &self.kind {
            ComponentKind::Motor(motor) => Some(motor),
            _ => None,
        }
    }

    pub fn as_pulley(&self) -> Option<&Pulley> {
        match &self.kind {
            ComponentKind::Pulley(pulley) => Some(pulley),
            _ => None,
        }
    }

    pub(crate) fn as_pulley_mut(&mut self) -> Option<&mut Pulley> {
        match &mut self.kind {
            ComponentKind::Pulley(pulley) => Some(pulley),
            _ => None,
        }
    }

    pub fn as_conveyor(&self) -> Option<&Conveyor> {
        match &self.kind {
            ComponentKind::Conveyor(conveyor) => Some(conveyor),
            _ => None,
        }
    }

    pub fn as_elevator(&self) -> Option<&Elevator> {
        match &self.kind {
            ComponentKind::Elevator(elevator) => Some(elevator),
            _ => None,
        }
    }

    pub fn physics_shape(&self) -> Option<&PhysicsShape> {
        match &self.kind {
            ComponentKind::Shape(shape) => Some(shape.physics_shape()),
            ComponentKind::Motor(motor) => Some(motor.physics_shape()),
            ComponentKind::Conveyor(conveyor) => Some(conveyor.physics_shape()),
            ComponentKind::Elevator(elevator) => Some(elevator.physics_shape()),
            ComponentKind::Pulley(_) => None,
        }
    }

    fn physics_shape_mut(&mut self) -> Option<&mut PhysicsShape> {
        match &mut self.kind {
            ComponentKind::Shape(shape) => Some(shape.physics_shape_mut()),
            ComponentKind::Motor(motor) => Some(motor.physics_shape_mut()),
            ComponentKind::Conveyor(conveyor) => Some(conveyor.physics_shape_mut()),
            ComponentKind::Elevator(elevator) => Some(elevator.physics_shape_mut()),
            ComponentKind::Pulley(_) => None,
        }
    }

    pub fn body(&self) -> Option<BodyId> {
        self.physics_shape().and_then(PhysicsShape::body)
    }

    pub fn rotation_source(&self) -> Option<&RotationSource> {
        match &self.kind {
            ComponentKind::Motor(motor) => Some(&motor.source),
            ComponentKind::Pulley(pulley) => Some(&pulley.source),
            _ => None,
        }
    }

    pub(crate) fn rotation_source_mut(&mut self) -> Option<&mut RotationSource> {
        match &mut self.kind {
            ComponentKind::Motor(motor) => Some(&mut motor.source),
            ComponentKind::Pulley(pulley) => Some(&mut pulley.source),
            _ => None,
        }
    }

    /// Whether rotation can be delivered to this component.
    pub fn is_sink(&self) -> bool {
        !matches!(self.kind, ComponentKind::Motor(_))
    }

    pub fn is_static_shape(&self) -> bool {
        matches!(&self.kind, ComponentKind::Shape(shape) if shape.kind() == ShapeKind::Static)
    }

    /// Components this one pushes rotation to: source sinks, then belts.
    pub(crate) fn downstream(&self) -> Vec<ComponentId> {
        let mut next: Vec<ComponentId> = self
            .rotation_source()
            .map(|source| source.sinks().to_vec())
            .unwrap_or_default();
        if let Some(pulley) = self.as_pulley() {
            next.extend(pulley.belts().iter().map(|belt| belt.driven));
        }
        next
    }

    /// Creates this component's body in `world`, if it has one.
    pub(crate) fn install(&mut self, world: &mut PhysicsWorld) -> Result<Option<BodyId>> {
        match self.physics_shape_mut() {
            Some(shape) => shape.install(world).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn clear_body(&mut self) {
        if let Some(shape) = self.physics_shape_mut() {
            shape.clear_body();
        }
    }

    /// How the contact router should treat this component's body.
    pub(crate) fn listener_handle(&self, id: ComponentId) -> Option<ListenerHandle> {
        match self.kind {
            ComponentKind::Motor(_) => Some(ListenerHandle::Motor(id)),
            ComponentKind::Conveyor(_) => Some(ListenerHandle::Conveyor(id)),
            ComponentKind::Elevator(_) => Some(ListenerHandle::Elevator(id)),
            ComponentKind::Shape(_) | ComponentKind::Pulley(_) => None,
        }
    }

    /// Puts run-time state back to how it was configured.
    pub(crate) fn reset_state(&mut self) {
        match &mut self.kind {
            ComponentKind::Shape(_) => {}
            ComponentKind::Motor(motor) => motor.reset_state(),
            ComponentKind::Pulley(pulley) => pulley.reset_state(),
            ComponentKind::Conveyor(conveyor) => conveyor.reset_state(),
            ComponentKind::Elevator(elevator) => elevator.reset_state(),
        }
    }

    /// Per-tick update. Returns a signal when this component publishes rotation.
    pub(crate) fn update(&mut self, time: f64, world: &mut PhysicsWorld) -> Result<Option<Signal>> {
        match &mut self.kind {
            ComponentKind::Motor(motor) => Ok(motor.update(time)),
            ComponentKind::Conveyor(conveyor) => conveyor.update(world).map(|_| None),
            ComponentKind::Elevator(elevator) => elevator.update(world).map(|_| None),
            ComponentKind::Shape(_) | ComponentKind::Pulley(_) => Ok(None),
        }
    }

    /// Delivers `signal` to a non-pulley sink.
    pub(crate) fn receive(&mut self, signal: Signal, world: &mut PhysicsWorld) -> Result<()> {
        match &mut self.kind {
            ComponentKind::Shape(shape) => shape.receive(signal, world),
            ComponentKind::Conveyor(conveyor) => {
                conveyor.receive(signal);
                Ok(())
            }
            ComponentKind::Elevator(elevator) => elevator.receive(signal, world),
            ComponentKind::Motor(_) | ComponentKind::Pulley(_) => Ok(()),
        }
    }

    pub(crate) fn begin_contact(&mut self, contact: &Contact) {
        if let ComponentKind::Motor(motor) = &mut self.kind {
            motor.begin_contact(contact);
        }
    }

    pub(crate) fn pre_solve(&mut self, contact: &mut Contact, bodies: &mut Arena<RigidBody>) {
        match &self.kind {
            ComponentKind::Conveyor(conveyor) => conveyor.pre_solve(contact),
            ComponentKind::Elevator(elevator) => elevator.pre_solve(contact, bodies),
            _ => {}
        }
    }

    pub fn draw(&self, gfx: &mut dyn Graphics, world: &PhysicsWorld) {
        match &self.kind {
            ComponentKind::Shape(shape) => shape.draw(gfx, world),
            ComponentKind::Motor(motor) => motor.draw(gfx, world),
            ComponentKind::Pulley(pulley) => pulley.draw(gfx),
            ComponentKind::Conveyor(conveyor) => conveyor.draw(gfx, world),
            ComponentKind::Elevator(elevator) => elevator.draw(gfx, world),
        }
    }
}
