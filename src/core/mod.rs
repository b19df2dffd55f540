//! Core types describing rigid bodies, colliders and shared data.

pub mod types;
pub mod rigidbody;
pub mod collider;

pub use types::{BodyType, MassProperties, Material, Transform, Velocity};
pub use rigidbody::{BodyDef, RigidBody};
pub use collider::{Collider, ColliderShape};
