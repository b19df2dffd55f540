use glam::{Mat2, Vec2};

use crate::{
    collision::contact::{Contact, ContactImpulse, ManifoldType, WorldManifold},
    config::{BAUMGARTE, LINEAR_SLOP, MAX_LINEAR_CORRECTION, VELOCITY_THRESHOLD},
    core::types::Transform,
};

/// Per-body state the solver works on: centre of mass pose and velocity.
#[derive(Debug, Clone, Copy)]
pub struct SolverBody {
    pub center: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub inverse_mass: f32,
    pub inverse_inertia: f32,
    pub local_center: Vec2,
    pub gravity_scale: f32,
    pub force: Vec2,
    pub torque: f32,
    pub is_dynamic: bool,
    pub is_static: bool,
}

impl SolverBody {
    /// Transform of the body origin for the current centre pose.
    pub fn transform(&self) -> Transform {
        let rotation = Mat2::from_angle(self.angle);
        Transform::new(self.center - rotation * self.local_center, self.angle)
    }
}

#[derive(Debug, Default, Clone)]
pub struct SolverStepMetrics {
    pub contacts_solved: usize,
    pub points_solved: usize,
    pub normal_impulse_sum: f32,
    pub tangent_impulse_sum: f32,
    pub min_separation: f32,
}

impl SolverStepMetrics {
    pub fn record(&mut self, impulse: &ContactImpulse) {
        self.contacts_solved += 1;
        self.points_solved += impulse.normal_impulses.len();
        self.normal_impulse_sum += impulse.normal_impulses.iter().map(|i| i.abs()).sum::<f32>();
        self.tangent_impulse_sum += impulse.tangent_impulses.iter().map(|i| i.abs()).sum::<f32>();
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct VelocityConstraintPoint {
    r_a: Vec2,
    r_b: Vec2,
    normal_impulse: f32,
    tangent_impulse: f32,
    normal_mass: f32,
    tangent_mass: f32,
    velocity_bias: f32,
}

#[derive(Debug, Clone)]
struct VelocityConstraint {
    points: Vec<VelocityConstraintPoint>,
    normal: Vec2,
    index_a: usize,
    index_b: usize,
    friction: f32,
    restitution: f32,
    tangent_speed: f32,
    contact_index: usize,
}

#[derive(Debug, Clone)]
struct PositionConstraint {
    local_points: Vec<Vec2>,
    local_normal: Vec2,
    local_point: Vec2,
    kind: ManifoldType,
    index_a: usize,
    index_b: usize,
    radius_a: f32,
    radius_b: f32,
}

/// A contact handed to the solver: the contact plus the solver indices of its bodies and
/// the skin radii of their shapes.
pub struct SolverContact<'a> {
    pub contact: &'a mut Contact,
    pub index_a: usize,
    pub index_b: usize,
    pub radius_a: f32,
    pub radius_b: f32,
}

/// Sequential-impulse contact solver.
///
/// Friction is solved before the non-penetration constraint since non-penetration
/// matters more. The tangent direction is the normal rotated a quarter turn
/// counter-clockwise.
pub struct ContactSolver<'a> {
    contacts: Vec<SolverContact<'a>>,
    velocity_constraints: Vec<VelocityConstraint>,
    position_constraints: Vec<PositionConstraint>,
}

fn tangent_of(normal: Vec2) -> Vec2 {
    normal.perp()
}

impl<'a> ContactSolver<'a> {
    /// Builds constraints and scales the cached impulses by `dt_ratio` for warm starting.
    pub fn new(contacts: Vec<SolverContact<'a>>, bodies: &[SolverBody], dt_ratio: f32) -> Self {
        let mut velocity_constraints = Vec::with_capacity(contacts.len());
        let mut position_constraints = Vec::with_capacity(contacts.len());

        for (contact_index, entry) in contacts.iter().enumerate() {
            let contact = &entry.contact;
            let manifold = &contact.manifold;

            let points = manifold
                .points
                .iter()
                .map(|mp| VelocityConstraintPoint {
                    normal_impulse: dt_ratio * mp.normal_impulse,
                    tangent_impulse: dt_ratio * mp.tangent_impulse,
                    ..VelocityConstraintPoint::default()
                })
                .collect();

            velocity_constraints.push(VelocityConstraint {
                points,
                normal: Vec2::ZERO,
                index_a: entry.index_a,
                index_b: entry.index_b,
                friction: contact.friction,
                restitution: contact.restitution,
                tangent_speed: contact.tangent_speed(),
                contact_index,
            });

            position_constraints.push(PositionConstraint {
                local_points: manifold.points.iter().map(|mp| mp.local_point).collect(),
                local_normal: manifold.local_normal,
                local_point: manifold.local_point,
                kind: manifold.kind,
                index_a: entry.index_a,
                index_b: entry.index_b,
                radius_a: entry.radius_a,
                radius_b: entry.radius_b,
            });
        }

        let mut solver = Self {
            contacts,
            velocity_constraints,
            position_constraints,
        };
        solver.initialize_velocity_constraints(bodies);
        solver
    }

    fn initialize_velocity_constraints(&mut self, bodies: &[SolverBody]) {
        for (vc, pc) in self
            .velocity_constraints
            .iter_mut()
            .zip(&self.position_constraints)
        {
            let body_a = &bodies[vc.index_a];
            let body_b = &bodies[vc.index_b];
            let manifold = &self.contacts[vc.contact_index].contact.manifold;

            let world = WorldManifold::new(
                manifold,
                &body_a.transform(),
                pc.radius_a,
                &body_b.transform(),
                pc.radius_b,
            );
            vc.normal = world.normal;
            let tangent = tangent_of(vc.normal);

            let (m_a, i_a) = (body_a.inverse_mass, body_a.inverse_inertia);
            let (m_b, i_b) = (body_b.inverse_mass, body_b.inverse_inertia);

            for (vcp, point) in vc.points.iter_mut().zip(&world.points) {
                vcp.r_a = *point - body_a.center;
                vcp.r_b = *point - body_b.center;

                let rn_a = vcp.r_a.perp_dot(vc.normal);
                let rn_b = vcp.r_b.perp_dot(vc.normal);
                let k_normal = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;
                vcp.normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

                let rt_a = vcp.r_a.perp_dot(tangent);
                let rt_b = vcp.r_b.perp_dot(tangent);
                let k_tangent = m_a + m_b + i_a * rt_a * rt_a + i_b * rt_b * rt_b;
                vcp.tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

                let dv = body_b.linear_velocity + body_b.angular_velocity * vcp.r_b.perp()
                    - body_a.linear_velocity
                    - body_a.angular_velocity * vcp.r_a.perp();
                let v_rel = vc.normal.dot(dv);
                vcp.velocity_bias = if v_rel < -VELOCITY_THRESHOLD {
                    -vc.restitution * v_rel
                } else {
                    0.0
                };
            }
        }
    }

    pub fn warm_start(&self, bodies: &mut [SolverBody]) {
        for vc in &self.velocity_constraints {
            let tangent = tangent_of(vc.normal);
            for vcp in &vc.points {
                let p = vcp.normal_impulse * vc.normal + vcp.tangent_impulse * tangent;
                apply_impulse(bodies, vc.index_a, vc.index_b, vcp.r_a, vcp.r_b, p);
            }
        }
    }

    pub fn solve_velocity_constraints(&mut self, bodies: &mut [SolverBody]) {
        for vc in &mut self.velocity_constraints {
            let tangent = tangent_of(vc.normal);

            for vcp in &mut vc.points {
                let dv = relative_velocity(bodies, vc.index_a, vc.index_b, vcp.r_a, vcp.r_b);
                let vt = dv.dot(tangent) - vc.tangent_speed;
                let lambda = vcp.tangent_mass * -vt;

                let max_friction = vc.friction * vcp.normal_impulse;
                let new_impulse = (vcp.tangent_impulse + lambda).clamp(-max_friction, max_friction);
                let lambda = new_impulse - vcp.tangent_impulse;
                vcp.tangent_impulse = new_impulse;

                apply_impulse(bodies, vc.index_a, vc.index_b, vcp.r_a, vcp.r_b, lambda * tangent);
            }

            for vcp in &mut vc.points {
                let dv = relative_velocity(bodies, vc.index_a, vc.index_b, vcp.r_a, vcp.r_b);
                let vn = dv.dot(vc.normal);
                let lambda = -vcp.normal_mass * (vn - vcp.velocity_bias);

                let new_impulse = (vcp.normal_impulse + lambda).max(0.0);
                let lambda = new_impulse - vcp.normal_impulse;
                vcp.normal_impulse = new_impulse;

                apply_impulse(bodies, vc.index_a, vc.index_b, vcp.r_a, vcp.r_b, lambda * vc.normal);
            }
        }
    }

    /// Writes accumulated impulses back into the contact manifolds for next step.
    pub fn store_impulses(&mut self) {
        for vc in &self.velocity_constraints {
            let manifold = &mut self.contacts[vc.contact_index].contact.manifold;
            for (mp, vcp) in manifold.points.iter_mut().zip(&vc.points) {
                mp.normal_impulse = vcp.normal_impulse;
                mp.tangent_impulse = vcp.tangent_impulse;
            }
        }
    }

    /// One Baumgarte pass over all contacts. Returns the smallest separation seen.
    pub fn solve_position_constraints(&self, bodies: &mut [SolverBody]) -> f32 {
        let mut min_separation: f32 = 0.0;

        for pc in &self.position_constraints {
            let (m_a, i_a) = (bodies[pc.index_a].inverse_mass, bodies[pc.index_a].inverse_inertia);
            let (m_b, i_b) = (bodies[pc.index_b].inverse_mass, bodies[pc.index_b].inverse_inertia);

            for j in 0..pc.local_points.len() {
                let xf_a = bodies[pc.index_a].transform();
                let xf_b = bodies[pc.index_b].transform();
                let (normal, point, separation) = position_manifold(pc, &xf_a, &xf_b, j);

                let r_a = point - bodies[pc.index_a].center;
                let r_b = point - bodies[pc.index_b].center;
                min_separation = min_separation.min(separation);

                let c = (BAUMGARTE * (separation + LINEAR_SLOP)).clamp(-MAX_LINEAR_CORRECTION, 0.0);
                let rn_a = r_a.perp_dot(normal);
                let rn_b = r_b.perp_dot(normal);
                let k = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;
                let impulse = if k > 0.0 { -c / k } else { 0.0 };
                let p = impulse * normal;

                let body_a = &mut bodies[pc.index_a];
                body_a.center -= m_a * p;
                body_a.angle -= i_a * r_a.perp_dot(p);
                let body_b = &mut bodies[pc.index_b];
                body_b.center += m_b * p;
                body_b.angle += i_b * r_b.perp_dot(p);
            }
        }

        min_separation
    }

    /// Impulses per contact, paired with the contact they belong to, for `post_solve`.
    pub fn report(&self) -> impl Iterator<Item = (&Contact, ContactImpulse)> + '_ {
        self.velocity_constraints.iter().map(move |vc| {
            let impulse = ContactImpulse {
                normal_impulses: vc.points.iter().map(|p| p.normal_impulse).collect(),
                tangent_impulses: vc.points.iter().map(|p| p.tangent_impulse).collect(),
            };
            (&*self.contacts[vc.contact_index].contact, impulse)
        })
    }
}

/// True when a position pass left every contact within three slops of touching.
pub fn positions_converged(min_separation: f32) -> bool {
    min_separation >= -3.0 * LINEAR_SLOP
}

fn relative_velocity(bodies: &[SolverBody], a: usize, b: usize, r_a: Vec2, r_b: Vec2) -> Vec2 {
    let body_a = &bodies[a];
    let body_b = &bodies[b];
    body_b.linear_velocity + body_b.angular_velocity * r_b.perp()
        - body_a.linear_velocity
        - body_a.angular_velocity * r_a.perp()
}

fn apply_impulse(bodies: &mut [SolverBody], a: usize, b: usize, r_a: Vec2, r_b: Vec2, p: Vec2) {
    let body_a = &mut bodies[a];
    body_a.linear_velocity -= body_a.inverse_mass * p;
    body_a.angular_velocity -= body_a.inverse_inertia * r_a.perp_dot(p);
    let body_b = &mut bodies[b];
    body_b.linear_velocity += body_b.inverse_mass * p;
    body_b.angular_velocity += body_b.inverse_inertia * r_b.perp_dot(p);
}

/// Normal, point and separation of manifold point `index` at the current poses.
fn position_manifold(
    pc: &PositionConstraint,
    xf_a: &Transform,
    xf_b: &Transform,
    index: usize,
) -> (Vec2, Vec2, f32) {
    match pc.kind {
        ManifoldType::Circles => {
            let point_a = xf_a.apply(pc.local_point);
            let point_b = xf_b.apply(pc.local_points[0]);
            let normal = (point_b - point_a).normalize_or(Vec2::X);
            let separation = (point_b - point_a).dot(normal) - pc.radius_a - pc.radius_b;
            (normal, 0.5 * (point_a + point_b), separation)
        }
        ManifoldType::FaceA => {
            let normal = xf_a.rotate(pc.local_normal);
            let plane_point = xf_a.apply(pc.local_point);
            let clip_point = xf_b.apply(pc.local_points[index]);
            let separation = (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b;
            (normal, clip_point, separation)
        }
        ManifoldType::FaceB => {
            let normal = xf_b.rotate(pc.local_normal);
            let plane_point = xf_b.apply(pc.local_point);
            let clip_point = xf_a.apply(pc.local_points[index]);
            let separation = (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b;
            (-normal, clip_point, separation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::contact::{Manifold, ManifoldPoint};
    use crate::utils::allocator::Arena;
    use approx::assert_relative_eq;

    fn body(center: Vec2, inverse_mass: f32, velocity: Vec2) -> SolverBody {
        SolverBody {
            center,
            angle: 0.0,
            linear_velocity: velocity,
            angular_velocity: 0.0,
            inverse_mass,
            inverse_inertia: 0.0,
            local_center: Vec2::ZERO,
            gravity_scale: 1.0,
            force: Vec2::ZERO,
            torque: 0.0,
            is_dynamic: inverse_mass > 0.0,
            is_static: inverse_mass == 0.0,
        }
    }

    fn circle_contact() -> Contact {
        let mut arena: Arena<()> = Arena::new();
        let a = arena.insert(());
        let b = arena.insert(());
        let mut contact = Contact::new(a, b, 0.0, 0.0);
        contact.manifold = Manifold {
            points: vec![ManifoldPoint::default()],
            local_normal: Vec2::ZERO,
            local_point: Vec2::ZERO,
            kind: ManifoldType::Circles,
        };
        contact
    }

    #[test]
    fn normal_impulse_stops_approach() {
        let mut contact = circle_contact();
        let mut bodies = [
            body(Vec2::ZERO, 0.0, Vec2::ZERO),
            body(Vec2::new(0.0, 0.9), 1.0, Vec2::new(0.0, -0.5)),
        ];
        let entries = vec![SolverContact {
            contact: &mut contact,
            index_a: 0,
            index_b: 1,
            radius_a: 0.5,
            radius_b: 0.5,
        }];
        let mut solver = ContactSolver::new(entries, &bodies, 1.0);
        for _ in 0..6 {
            solver.solve_velocity_constraints(&mut bodies);
        }
        assert_relative_eq!(bodies[1].linear_velocity.y, 0.0, epsilon = 1e-6);
        solver.store_impulses();
        assert!(contact.manifold.points[0].normal_impulse > 0.0);
    }

    #[test]
    fn position_pass_pushes_overlap_apart() {
        let mut contact = circle_contact();
        let mut bodies = [
            body(Vec2::ZERO, 0.0, Vec2::ZERO),
            body(Vec2::new(0.0, 0.8), 1.0, Vec2::ZERO),
        ];
        let entries = vec![SolverContact {
            contact: &mut contact,
            index_a: 0,
            index_b: 1,
            radius_a: 0.5,
            radius_b: 0.5,
        }];
        let solver = ContactSolver::new(entries, &bodies, 1.0);
        let before = bodies[1].center.y;
        let min_separation = solver.solve_position_constraints(&mut bodies);
        assert_relative_eq!(min_separation, -0.2, epsilon = 1e-6);
        assert!(bodies[1].center.y > before);
        assert!(!positions_converged(min_separation));
    }
}
