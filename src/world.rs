use std::collections::BTreeMap;

use glam::Vec2;
use log::trace;

use crate::{
    collision::contact::{shape_radius, Contact, ContactEdge, ContactListener},
    config::{SimulationSettings, DEFAULT_GRAVITY},
    core::{
        collider::Collider,
        rigidbody::{BodyDef, RigidBody},
        types::BodyType,
    },
    dynamics::{
        integrator::Integrator,
        solver::{positions_converged, ContactSolver, SolverBody, SolverContact, SolverStepMetrics},
    },
    utils::{
        allocator::{Arena, BodyId},
        logging::ScopedTimer,
    },
};

pub mod contact_manager;

pub use contact_manager::ContactManager;

/// Central simulation container: owns bodies and contacts and steps them.
///
/// Every iteration order inside a step is a function of body ids alone, so two worlds
/// built by the same sequence of calls evolve identically.
pub struct PhysicsWorld {
    bodies: Arena<RigidBody>,
    contact_manager: ContactManager,
    integrator: Integrator,
    inv_dt0: f32,
    step_count: u64,
    last_metrics: SolverStepMetrics,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(Vec2::from_array(DEFAULT_GRAVITY))
    }
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            bodies: Arena::new(),
            contact_manager: ContactManager::new(),
            integrator: Integrator::new(gravity),
            inv_dt0: 0.0,
            step_count: 0,
            last_metrics: SolverStepMetrics::default(),
        }
    }

    pub fn with_settings(settings: &SimulationSettings) -> Self {
        Self::new(Vec2::from_array(settings.gravity))
    }

    pub fn gravity(&self) -> Vec2 {
        self.integrator.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.integrator.gravity = gravity;
    }

    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.integrator.set_parallel(enabled);
    }

    pub fn create_body(&mut self, def: &BodyDef, collider: Collider) -> BodyId {
        let id = self.bodies.insert(RigidBody::new(def, collider));
        trace!("created {:?} body {:?}", def.body_type, id);
        id
    }

    /// Removes a body and silently drops its contacts.
    pub fn destroy_body(&mut self, id: BodyId) -> Option<RigidBody> {
        let body = self.bodies.remove(id)?;
        self.contact_manager.remove_body(id);
        Some(body)
    }

    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &RigidBody)> + '_ {
        self.bodies.iter()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains(id)
    }

    pub fn contacts(&self) -> impl Iterator<Item = &Contact> + '_ {
        self.contact_manager.contacts()
    }

    pub fn contact_count(&self) -> usize {
        self.contact_manager.len()
    }

    pub fn contact_between(&self, a: BodyId, b: BodyId) -> Option<&Contact> {
        self.contact_manager.contact_between(a, b)
    }

    /// The contact list of `id`: every body whose fattened bounds overlap it, with
    /// whether the shapes actually touch.
    pub fn contact_edges(&self, id: BodyId) -> Vec<ContactEdge> {
        self.contact_manager.contact_edges(id)
    }

    /// Dynamic bodies currently touching `id`.
    pub fn touching_dynamic_bodies(&self, id: BodyId) -> Vec<BodyId> {
        self.contact_edges(id)
            .into_iter()
            .filter(|edge| edge.touching)
            .filter(|edge| {
                self.bodies
                    .get(edge.other)
                    .map(|body| body.body_type == BodyType::Dynamic)
                    .unwrap_or(false)
            })
            .map(|edge| edge.other)
            .collect()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn last_metrics(&self) -> &SolverStepMetrics {
        &self.last_metrics
    }

    /// Advances the world by `dt` seconds.
    ///
    /// Contact callbacks fire on `listener` before the solver runs (`begin_contact`,
    /// `end_contact`, `pre_solve`) and after it (`post_solve`).
    pub fn step(
        &mut self,
        dt: f32,
        velocity_iterations: u32,
        position_iterations: u32,
        listener: &mut dyn ContactListener,
    ) {
        if dt <= 0.0 {
            return;
        }
        let _step_timer = ScopedTimer::new("world::step");

        {
            let _timer = ScopedTimer::new("contacts::update");
            self.contact_manager.update_contacts(&mut self.bodies, listener);
        }

        let ids: Vec<BodyId> = self.bodies.ids().collect();
        let index: BTreeMap<BodyId, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let mut solver_bodies: Vec<SolverBody> = ids
            .iter()
            .filter_map(|id| self.bodies.get(*id))
            .map(|body| SolverBody {
                center: body.center,
                angle: body.transform.angle,
                linear_velocity: body.velocity.linear,
                angular_velocity: body.velocity.angular,
                inverse_mass: body.inverse_mass,
                inverse_inertia: body.inverse_inertia,
                local_center: body.local_center(),
                gravity_scale: body.gravity_scale,
                force: body.force,
                torque: body.torque,
                is_dynamic: body.is_dynamic(),
                is_static: body.is_static(),
            })
            .collect();

        {
            let _timer = ScopedTimer::new("integrator::velocities");
            self.integrator.integrate_velocities(&mut solver_bodies, dt);
        }

        let dt_ratio = self.inv_dt0 * dt;
        let bodies = &self.bodies;
        let entries: Vec<SolverContact<'_>> = self
            .contact_manager
            .contacts_mut()
            .filter(|contact| contact.is_touching() && contact.is_enabled())
            .filter_map(|contact| {
                let index_a = *index.get(&contact.body_a)?;
                let index_b = *index.get(&contact.body_b)?;
                let radius_a = shape_radius(bodies.get(contact.body_a)?);
                let radius_b = shape_radius(bodies.get(contact.body_b)?);
                Some(SolverContact {
                    contact,
                    index_a,
                    index_b,
                    radius_a,
                    radius_b,
                })
            })
            .collect();

        let mut metrics = SolverStepMetrics::default();
        {
            let _timer = ScopedTimer::new("solver");
            let mut solver = ContactSolver::new(entries, &solver_bodies, dt_ratio);
            solver.warm_start(&mut solver_bodies);
            for _ in 0..velocity_iterations {
                solver.solve_velocity_constraints(&mut solver_bodies);
            }
            solver.store_impulses();

            self.integrator.integrate_positions(&mut solver_bodies, dt);

            metrics.min_separation = 0.0;
            for _ in 0..position_iterations {
                let min_separation = solver.solve_position_constraints(&mut solver_bodies);
                metrics.min_separation = min_separation;
                if positions_converged(min_separation) {
                    break;
                }
            }

            for (contact, impulse) in solver.report() {
                listener.post_solve(contact, &impulse);
                metrics.record(&impulse);
            }
        }

        for (id, state) in ids.iter().zip(&solver_bodies) {
            if let Some(body) = self.bodies.get_mut(*id) {
                body.center = state.center;
                body.transform.angle = state.angle;
                body.velocity.linear = state.linear_velocity;
                body.velocity.angular = state.angular_velocity;
                body.force = Vec2::ZERO;
                body.torque = 0.0;
                body.synchronize_transform();
            }
        }

        self.inv_dt0 = 1.0 / dt;
        self.step_count += 1;
        self.last_metrics = metrics;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::ConvexPolygon;
    use crate::core::types::Material;
    use approx::assert_relative_eq;

    fn ground(world: &mut PhysicsWorld) -> BodyId {
        let polygon = ConvexPolygon::rectangle(5.0, 0.5, 0.01).expect("ground");
        world.create_body(
            &BodyDef {
                position: Vec2::new(0.0, -0.5),
                ..BodyDef::default()
            },
            Collider::builder().polygon(polygon).build(),
        )
    }

    #[test]
    fn ball_comes_to_rest_on_ground() {
        let mut world = PhysicsWorld::default();
        let floor = ground(&mut world);
        let ball = world.create_body(
            &BodyDef {
                body_type: BodyType::Dynamic,
                position: Vec2::new(0.0, 1.0),
                ..BodyDef::default()
            },
            Collider::builder()
                .circle(0.2)
                .material(Material::new(1.0, 0.5, 0.0))
                .build(),
        );

        for _ in 0..120 {
            world.step(1.0 / 30.0, 6, 2, &mut ());
        }

        let body = world.body(ball).expect("ball");
        assert_relative_eq!(body.position().y, 0.2, epsilon = 0.02);
        assert!(body.velocity.linear.length() < 0.05);
        assert!(world
            .contact_edges(floor)
            .iter()
            .any(|edge| edge.other == ball && edge.touching));
    }

    #[test]
    fn static_bodies_do_not_pair() {
        let mut world = PhysicsWorld::default();
        ground(&mut world);
        ground(&mut world);
        world.step(1.0 / 30.0, 6, 2, &mut ());
        assert_eq!(world.contact_count(), 0);
    }

    #[test]
    fn destroyed_body_handle_goes_stale() {
        let mut world = PhysicsWorld::default();
        let id = ground(&mut world);
        assert!(world.destroy_body(id).is_some());
        assert!(world.body(id).is_none());
        assert!(world.destroy_body(id).is_none());
    }
}
