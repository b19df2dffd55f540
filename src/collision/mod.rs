//! Collision detection modules: broad-phase, narrow-phase, contact manifolds and clipping.

pub mod shapes;
pub mod broadphase;
pub mod narrowphase;
pub mod contact;
pub mod clipping;

pub use broadphase::{BroadPhase, SpatialGrid};
pub use contact::{
    Contact, ContactEdge, ContactFeature, ContactImpulse, ContactListener, Manifold,
    ManifoldPoint, ManifoldType, WorldManifold,
};
pub use narrowphase::NarrowPhase;
pub use shapes::{Aabb, ConvexPolygon};
