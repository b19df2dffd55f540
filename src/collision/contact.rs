use glam::Vec2;

use crate::{
    core::{rigidbody::RigidBody, types::Transform},
    utils::allocator::{Arena, BodyId},
};

/// Whether a contact feature is a vertex or a face of its polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeatureType {
    #[default]
    Vertex,
    Face,
}

/// The features that intersect to form a contact point. Used to match points between
/// steps for warm starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContactFeature {
    pub index_a: u8,
    pub index_b: u8,
    pub type_a: FeatureType,
    pub type_b: FeatureType,
}

impl ContactFeature {
    pub fn flipped(self) -> Self {
        Self {
            index_a: self.index_b,
            index_b: self.index_a,
            type_a: self.type_b,
            type_b: self.type_a,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifoldType {
    #[default]
    Circles,
    FaceA,
    FaceB,
}

/// A manifold point in the local frame of the body it belongs to, with the impulses
/// accumulated on it last step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifoldPoint {
    pub local_point: Vec2,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
    pub id: ContactFeature,
}

/// Up to two contact points between two convex shapes, stored in body-local space.
///
/// - `Circles`: `local_point` is the centre of circle A, point local positions are circle B centres.
/// - `FaceA`: `local_point`/`local_normal` describe the reference face on A, points are on B.
/// - `FaceB`: the reverse.
#[derive(Debug, Clone, Default)]
pub struct Manifold {
    pub points: Vec<ManifoldPoint>,
    pub local_normal: Vec2,
    pub local_point: Vec2,
    pub kind: ManifoldType,
}

impl Manifold {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

/// A manifold resolved into world space.
#[derive(Debug, Clone, Default)]
pub struct WorldManifold {
    /// Points from A to B.
    pub normal: Vec2,
    pub points: Vec<Vec2>,
    /// Negative when overlapping.
    pub separations: Vec<f32>,
}

impl WorldManifold {
    pub fn new(
        manifold: &Manifold,
        xf_a: &Transform,
        radius_a: f32,
        xf_b: &Transform,
        radius_b: f32,
    ) -> Self {
        let mut world = WorldManifold::default();
        if manifold.points.is_empty() {
            return world;
        }

        match manifold.kind {
            ManifoldType::Circles => {
                let point_a = xf_a.apply(manifold.local_point);
                let point_b = xf_b.apply(manifold.points[0].local_point);
                let mut normal = Vec2::X;
                if point_a.distance_squared(point_b) > f32::EPSILON * f32::EPSILON {
                    normal = (point_b - point_a).normalize();
                }
                let c_a = point_a + radius_a * normal;
                let c_b = point_b - radius_b * normal;
                world.normal = normal;
                world.points.push(0.5 * (c_a + c_b));
                world.separations.push((c_b - c_a).dot(normal));
            }
            ManifoldType::FaceA => {
                let normal = xf_a.rotate(manifold.local_normal);
                let plane_point = xf_a.apply(manifold.local_point);
                for mp in &manifold.points {
                    let clip_point = xf_b.apply(mp.local_point);
                    let c_a = clip_point
                        + (radius_a - (clip_point - plane_point).dot(normal)) * normal;
                    let c_b = clip_point - radius_b * normal;
                    world.points.push(0.5 * (c_a + c_b));
                    world.separations.push((c_b - c_a).dot(normal));
                }
                world.normal = normal;
            }
            ManifoldType::FaceB => {
                let normal = xf_b.rotate(manifold.local_normal);
                let plane_point = xf_b.apply(manifold.local_point);
                for mp in &manifold.points {
                    let clip_point = xf_a.apply(mp.local_point);
                    let c_b = clip_point
                        + (radius_b - (clip_point - plane_point).dot(normal)) * normal;
                    let c_a = clip_point - radius_a * normal;
                    world.points.push(0.5 * (c_a + c_b));
                    world.separations.push((c_a - c_b).dot(normal));
                }
                world.normal = -normal;
            }
        }

        world
    }
}

/// Impulses applied by the solver on each manifold point, reported to `post_solve`.
#[derive(Debug, Clone, Default)]
pub struct ContactImpulse {
    pub normal_impulses: Vec<f32>,
    pub tangent_impulses: Vec<f32>,
}

/// Persistent contact between two bodies whose fattened bounds overlap.
#[derive(Debug, Clone)]
pub struct Contact {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub manifold: Manifold,
    pub friction: f32,
    pub restitution: f32,
    tangent_speed: f32,
    touching: bool,
    enabled: bool,
}

impl Contact {
    pub(crate) fn new(body_a: BodyId, body_b: BodyId, friction: f32, restitution: f32) -> Self {
        Self {
            body_a,
            body_b,
            manifold: Manifold::default(),
            friction,
            restitution,
            tangent_speed: 0.0,
            touching: false,
            enabled: true,
        }
    }

    pub fn is_touching(&self) -> bool {
        self.touching
    }

    pub(crate) fn set_touching(&mut self, touching: bool) {
        self.touching = touching;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disables the contact for the current step. Re-enabled on the next update.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Surface speed along the contact tangent (m/s). Positive moves a body resting on
    /// top of body A toward −x, i.e. clockwise is negative.
    pub fn set_tangent_speed(&mut self, speed: f32) {
        self.tangent_speed = speed;
    }

    pub fn tangent_speed(&self) -> f32 {
        self.tangent_speed
    }

    pub(crate) fn reset_per_step_state(&mut self) {
        self.tangent_speed = 0.0;
        self.enabled = true;
    }

    pub fn involves(&self, body: BodyId) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// The body on the other side of this contact from `body`.
    pub fn other(&self, body: BodyId) -> Option<BodyId> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }

    pub fn world_manifold(&self, bodies: &Arena<RigidBody>) -> Option<WorldManifold> {
        let a = bodies.get(self.body_a)?;
        let b = bodies.get(self.body_b)?;
        Some(WorldManifold::new(
            &self.manifold,
            &a.transform,
            shape_radius(a),
            &b.transform,
            shape_radius(b),
        ))
    }
}

pub(crate) fn shape_radius(body: &RigidBody) -> f32 {
    use crate::core::collider::ColliderShape;
    match &body.collider.shape {
        ColliderShape::Circle { radius, .. } => *radius,
        ColliderShape::Polygon(polygon) => polygon.radius(),
    }
}

/// One entry of a body's contact list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEdge {
    pub other: BodyId,
    pub touching: bool,
}

/// Receives contact events from a [`PhysicsWorld`](crate::world::PhysicsWorld) step.
///
/// All callbacks run synchronously inside `step`. `pre_solve` may change the contact
/// (tangent speed, enabled) and the velocities of bodies.
pub trait ContactListener {
    fn begin_contact(&mut self, _contact: &Contact) {}

    fn end_contact(&mut self, _contact: &Contact) {}

    fn pre_solve(
        &mut self,
        _contact: &mut Contact,
        _old_manifold: &Manifold,
        _bodies: &mut Arena<RigidBody>,
    ) {
    }

    fn post_solve(&mut self, _contact: &Contact, _impulse: &ContactImpulse) {}
}

/// Listener that ignores every event.
impl ContactListener for () {}
