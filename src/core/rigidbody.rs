use super::{
    collider::Collider,
    types::{BodyType, MassProperties, Transform, Velocity},
};
use glam::Vec2;

/// Creation parameters for a [`RigidBody`].
#[derive(Debug, Clone)]
pub struct BodyDef {
    pub body_type: BodyType,
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub gravity_scale: f32,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            body_type: BodyType::Static,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            gravity_scale: 1.0,
        }
    }
}

/// Core rigid body description storing kinematic state and properties.
///
/// `transform` is the pose of the body origin. `center` is the world-space centre of
/// mass, which is what the solver integrates; the two are kept in sync.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub body_type: BodyType,
    pub transform: Transform,
    pub velocity: Velocity,
    pub collider: Collider,
    pub gravity_scale: f32,
    pub mass_properties: MassProperties,
    pub inverse_mass: f32,
    pub inverse_inertia: f32,
    pub(crate) center: Vec2,
    pub(crate) force: Vec2,
    pub(crate) torque: f32,
}

impl RigidBody {
    pub fn new(def: &BodyDef, collider: Collider) -> Self {
        let mut body = Self {
            body_type: def.body_type,
            transform: Transform::new(def.position, def.angle),
            velocity: Velocity::default(),
            collider,
            gravity_scale: def.gravity_scale,
            mass_properties: MassProperties::default(),
            inverse_mass: 0.0,
            inverse_inertia: 0.0,
            center: def.position,
            force: Vec2::ZERO,
            torque: 0.0,
        };
        body.reset_mass_data();
        body.set_velocity(def.linear_velocity, def.angular_velocity);
        body
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    pub fn position(&self) -> Vec2 {
        self.transform.position
    }

    pub fn angle(&self) -> f32 {
        self.transform.angle
    }

    pub fn world_center(&self) -> Vec2 {
        self.center
    }

    pub fn local_center(&self) -> Vec2 {
        self.mass_properties.center
    }

    pub fn set_transform(&mut self, position: Vec2, angle: f32) {
        self.transform = Transform::new(position, angle);
        self.center = self.transform.apply(self.local_center());
    }

    /// Static bodies keep zero velocity.
    pub fn set_velocity(&mut self, linear: Vec2, angular: f32) {
        if self.is_static() {
            return;
        }
        self.velocity.linear = linear;
        self.velocity.angular = angular;
    }

    pub fn set_linear_velocity(&mut self, linear: Vec2) {
        let angular = self.velocity.angular;
        self.set_velocity(linear, angular);
    }

    pub fn set_angular_velocity(&mut self, angular: f32) {
        let linear = self.velocity.linear;
        self.set_velocity(linear, angular);
    }

    pub fn apply_force(&mut self, force: Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.force += force;
    }

    pub fn apply_impulse(&mut self, impulse: Vec2, point: Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.velocity.linear += impulse * self.inverse_mass;
        self.velocity.angular += self.inverse_inertia * (point - self.center).perp_dot(impulse);
    }

    /// Velocity of a world-space point attached to this body.
    pub fn velocity_at(&self, point: Vec2) -> Vec2 {
        let r = point - self.center;
        self.velocity.linear + self.velocity.angular * r.perp()
    }

    /// Recomputes mass from the collider. Only dynamic bodies carry mass; static and
    /// kinematic bodies rotate about their origin.
    pub fn reset_mass_data(&mut self) {
        self.inverse_mass = 0.0;
        self.inverse_inertia = 0.0;
        self.mass_properties = MassProperties {
            mass: 0.0,
            center: Vec2::ZERO,
            inertia: 0.0,
        };

        if self.is_dynamic() {
            let mut props = self.collider.mass_properties();
            if props.mass <= 0.0 {
                props.mass = 1.0;
            }
            self.inverse_mass = 1.0 / props.mass;
            if props.inertia > 0.0 {
                self.inverse_inertia = 1.0 / props.inertia;
            }
            self.mass_properties = props;
        }

        self.center = self.transform.apply(self.local_center());
    }

    pub(crate) fn synchronize_transform(&mut self) {
        let rotated = self.transform.rotate(self.local_center());
        self.transform.position = self.center - rotated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::ConvexPolygon;
    use approx::assert_relative_eq;

    fn offset_triangle() -> Collider {
        let polygon = ConvexPolygon::new(
            &[Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(0.0, 3.0)],
            0.0,
        )
        .expect("triangle");
        Collider::builder().polygon(polygon).build()
    }

    #[test]
    fn dynamic_body_centre_is_polygon_centroid() {
        let def = BodyDef {
            body_type: BodyType::Dynamic,
            position: Vec2::new(1.0, 1.0),
            ..BodyDef::default()
        };
        let body = RigidBody::new(&def, offset_triangle());
        assert_relative_eq!(body.local_center().x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(body.world_center().y, 2.0, epsilon = 1e-5);
        assert!(body.inverse_mass > 0.0);
    }

    #[test]
    fn kinematic_body_rotates_about_origin() {
        let def = BodyDef {
            body_type: BodyType::Kinematic,
            ..BodyDef::default()
        };
        let mut body = RigidBody::new(&def, offset_triangle());
        body.set_transform(Vec2::new(2.0, 0.0), 1.0);
        assert_eq!(body.world_center(), Vec2::new(2.0, 0.0));
        assert_eq!(body.inverse_mass, 0.0);
    }

    #[test]
    fn static_body_ignores_velocity() {
        let mut body = RigidBody::new(&BodyDef::default(), offset_triangle());
        body.set_velocity(Vec2::X, 1.0);
        assert_eq!(body.velocity, Velocity::default());
    }
}
