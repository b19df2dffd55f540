//! Contraption: a deterministic simulator for Rube-Goldberg machines.
//!
//! A machine is a list of components (shapes, motors, pulleys, conveyors, elevators)
//! living in a fixed-step 2D rigid-body world. Motors publish rotation through a graph
//! of pulleys and sinks, contacts are routed back to the components that own the
//! bodies, and the whole thing is driven by an external frame index. Seeking backwards
//! rebuilds the world and replays, so any frame can be reached from any other.

pub mod collision;
pub mod components;
pub mod config;
pub mod core;
pub mod drawable;
pub mod dynamics;
pub mod error;
pub mod factory;
pub mod machine;
pub mod physics_shape;
pub mod render;
pub mod rotation;
pub mod router;
pub mod system;
pub mod utils;
pub mod world;

pub use glam::DVec2;

pub use components::{
    Component, ComponentId, ComponentKind, Conveyor, Elevator, Motor, MotorConfig, MotorState,
    Pulley, Shape, ShapeKind,
};
pub use config::SimulationSettings;
pub use core::{
    collider::{Collider, ColliderShape},
    rigidbody::{BodyDef, RigidBody},
    types::{BodyType, Material},
};
pub use drawable::{DrawableState, MachineDrawable};
pub use error::{MachineError, Result, WiringError};
pub use factory::{EmptyFactory, Machine1Factory, Machine2Factory, MachineFactory};
pub use machine::Machine;
pub use physics_shape::PhysicsShape;
pub use render::{Color, DrawCall, Graphics, Pen, Polygon, RecordingGraphics};
pub use rotation::{RotationSource, Signal, SinkSet};
pub use router::{ContactRouter, ListenerHandle};
pub use system::MachineSystem;
pub use utils::allocator::BodyId;
pub use world::PhysicsWorld;
