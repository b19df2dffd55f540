//! Adapter between a design-surface outline (centimetres, turns) and an engine body
//! (metres, radians).

use glam::{DVec2, Vec2};
use log::trace;

use crate::{
    collision::shapes::{convex_hull, ConvexPolygon},
    config::{CIRCLE_INSET_M, MAX_POLYGON_VERTICES, MTOCM, POLYGON_INSET_CM, POLYGON_RADIUS},
    core::{
        collider::Collider,
        rigidbody::{BodyDef, RigidBody},
        types::{BodyType, Material},
    },
    error::{MachineError, Result},
    render::{Color, Graphics, Outline, Polygon},
    utils::{
        allocator::BodyId,
        math::{cm_per_s_to_m_per_s, cm_to_m, m_to_cm, radians_to_turns, turns_to_radians},
    },
    world::PhysicsWorld,
};

/// A visual polygon that can be installed into a [`PhysicsWorld`] as one body.
///
/// Before installation the pose setters only change the initial pose. Afterwards they
/// act on the live body and switch its gravity off.
#[derive(Debug, Clone, Default)]
pub struct PhysicsShape {
    polygon: Polygon,
    initial_position: DVec2,
    initial_rotation: f64,
    body_type: BodyType,
    material: Material,
    body: Option<BodyId>,
}

impl PhysicsShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.polygon.rectangle(x, y, width, height);
    }

    pub fn bottom_centered_rectangle(&mut self, width: f64, height: f64) {
        self.polygon.bottom_centered_rectangle(width, height);
    }

    pub fn centered_square(&mut self, size: f64) {
        self.polygon.centered_square(size);
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

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Takes effect at the next install.
    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.body_type = body_type;
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn set_physics(&mut self, density: f32, friction: f32, restitution: f32) {
        self.material = Material::new(density, friction, restitution);
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn initial_position(&self) -> DVec2 {
        self.initial_position
    }

    pub fn set_initial_position(&mut self, position: DVec2) {
        self.initial_position = position;
    }

    /// Initial rotation in turns.
    pub fn initial_rotation(&self) -> f64 {
        self.initial_rotation
    }

    pub fn set_initial_rotation(&mut self, rotation: f64) {
        self.initial_rotation = rotation;
    }

    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    pub fn is_installed(&self) -> bool {
        self.body.is_some()
    }

    /// Forgets the installed body. The world that owned it is about to be discarded.
    pub fn clear_body(&mut self) {
        self.body = None;
    }

    /// Collider geometry in body-local metres, with the install-time inset applied.
    pub fn collider(&self) -> Result<Collider> {
        let builder = Collider::builder().material(self.material);
        let builder = match self.polygon.outline() {
            Outline::Circle(radius) => {
                let radius_m = (*radius / MTOCM) as f32 - CIRCLE_INSET_M;
                if !(radius_m > 0.0) {
                    return Err(MachineError::InvalidRadius(*radius));
                }
                builder.circle(radius_m)
            }
            Outline::Points(points) => builder.polygon(Self::inset_polygon(points)?),
        };
        Ok(builder.build())
    }

    /// Shrinks the outline by [`POLYGON_INSET_CM`] on every side about its bounding box
    /// centre, then converts it to metres.
    fn inset_polygon(points: &[DVec2]) -> Result<ConvexPolygon> {
        let (min, max) = points.iter().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(min, max), p| (min.min(*p), max.max(*p)),
        );
        let center = (min + max) / 2.0;
        let half = (max - min) / 2.0;
        if points.len() < 3 || half.x <= POLYGON_INSET_CM || half.y <= POLYGON_INSET_CM {
            return Err(MachineError::DegenerateShape(format!(
                "{} points spanning {:.2} x {:.2} cm",
                points.len(),
                2.0 * half.x.max(0.0),
                2.0 * half.y.max(0.0)
            )));
        }

        let scale = (half - DVec2::splat(POLYGON_INSET_CM)) / half;
        let local: Vec<Vec2> = points
            .iter()
            .map(|p| cm_to_m(center + (*p - center) * scale))
            .collect();
        let hull = convex_hull(&local).ok_or_else(|| {
            MachineError::DegenerateShape(format!("no convex hull for {} points", points.len()))
        })?;
        if hull.len() > MAX_POLYGON_VERTICES {
            return Err(MachineError::DegenerateShape(format!(
                "convex hull has {} vertices, at most {MAX_POLYGON_VERTICES} are supported",
                hull.len()
            )));
        }
        ConvexPolygon::new(&hull, POLYGON_RADIUS).ok_or_else(|| {
            MachineError::DegenerateShape(format!("no convex hull for {} points", points.len()))
        })
    }

    /// Creates the body at the initial pose and remembers its handle.
    pub fn install(&mut self, world: &mut PhysicsWorld) -> Result<BodyId> {
        let collider = self.collider()?;
        let def = BodyDef {
            body_type: self.body_type,
            position: cm_to_m(self.initial_position),
            angle: turns_to_radians(self.initial_rotation),
            ..BodyDef::default()
        };
        let id = world.create_body(&def, collider);
        trace!("installed {:?} shape at {:?} cm", self.body_type, self.initial_position);
        self.body = Some(id);
        Ok(id)
    }

    fn live_body<'w>(&self, world: &'w mut PhysicsWorld) -> Result<Option<&'w mut RigidBody>> {
        match self.body {
            None => Ok(None),
            Some(id) => world.body_mut(id).map(Some).ok_or(MachineError::StaleBody(id)),
        }
    }

    /// Current position in centimetres. Falls back to the initial pose when the shape is
    /// not installed in `world`.
    pub fn position(&self, world: &PhysicsWorld) -> DVec2 {
        self.body
            .and_then(|id| world.body(id))
            .map(|body| m_to_cm(body.position()))
            .unwrap_or(self.initial_position)
    }

    /// Current rotation in turns.
    pub fn rotation(&self, world: &PhysicsWorld) -> f64 {
        self.body
            .and_then(|id| world.body(id))
            .map(|body| radians_to_turns(body.angle()))
            .unwrap_or(self.initial_rotation)
    }

    pub fn set_position(&mut self, world: &mut PhysicsWorld, position: DVec2) -> Result<()> {
        match self.live_body(world)? {
            Some(body) => {
                let angle = body.angle();
                body.set_transform(cm_to_m(position), angle);
                body.gravity_scale = 0.0;
            }
            None => self.initial_position = position,
        }
        Ok(())
    }

    /// Sets the rotation in turns.
    pub fn set_rotation(&mut self, world: &mut PhysicsWorld, rotation: f64) -> Result<()> {
        match self.live_body(world)? {
            Some(body) => {
                let position = body.position();
                body.set_transform(position, turns_to_radians(rotation));
                body.gravity_scale = 0.0;
            }
            None => self.initial_rotation = rotation,
        }
        Ok(())
    }

    /// Sets the angular velocity in turns per second. No effect before installation.
    pub fn set_angular_velocity(&mut self, world: &mut PhysicsWorld, speed: f64) -> Result<()> {
        if let Some(body) = self.live_body(world)? {
            body.set_angular_velocity(turns_to_radians(speed));
        }
        Ok(())
    }

    /// Sets the linear velocity in cm/s. No effect before installation.
    pub fn set_linear_velocity(&mut self, world: &mut PhysicsWorld, velocity: DVec2) -> Result<()> {
        if let Some(body) = self.live_body(world)? {
            body.set_linear_velocity(Vec2::new(
                cm_per_s_to_m_per_s(velocity.x),
                cm_per_s_to_m_per_s(velocity.y),
            ));
        }
        Ok(())
    }

    pub fn set_gravity_scale(&mut self, world: &mut PhysicsWorld, scale: f32) -> Result<()> {
        if let Some(body) = self.live_body(world)? {
            body.gravity_scale = scale;
        }
        Ok(())
    }

    pub fn draw(&self, gfx: &mut dyn Graphics, world: &PhysicsWorld) {
        self.polygon.draw(gfx, self.position(world), self.rotation(world));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn polygon_is_inset_about_its_bounding_box() {
        let mut shape = PhysicsShape::new();
        shape.rectangle(-10.0, 0.0, 20.0, 10.0);
        let collider = shape.collider().expect("valid rectangle");
        let crate::core::collider::ColliderShape::Polygon(polygon) = collider.shape else {
            panic!("expected a polygon collider");
        };
        let max_x = polygon.vertices().iter().map(|v| v.x).fold(f32::MIN, f32::max);
        let min_y = polygon.vertices().iter().map(|v| v.y).fold(f32::MAX, f32::min);
        assert_relative_eq!(max_x, 0.0905, epsilon = 1e-5);
        assert_relative_eq!(min_y, 0.0095, epsilon = 1e-5);
    }

    #[test]
    fn thin_polygons_are_rejected() {
        let mut shape = PhysicsShape::new();
        shape.rectangle(0.0, 0.0, 1.5, 20.0);
        assert!(matches!(
            shape.collider(),
            Err(MachineError::DegenerateShape(_))
        ));

        let mut line = PhysicsShape::new();
        line.add_point(0.0, 0.0);
        line.add_point(10.0, 0.0);
        assert!(line.collider().is_err());
    }

    #[test]
    fn outlines_beyond_the_vertex_cap_are_reported_as_such() {
        let mut disc = PhysicsShape::new();
        for i in 0..12 {
            let angle = i as f64 * std::f64::consts::TAU / 12.0;
            disc.add_point(20.0 * angle.cos(), 20.0 * angle.sin());
        }
        match disc.collider() {
            Err(MachineError::DegenerateShape(message)) => {
                assert!(message.contains("12 vertices"), "{message}");
                assert!(!message.contains("no convex hull"), "{message}");
            }
            other => panic!("expected a vertex-cap error, got {other:?}"),
        }

        let mut octagon = PhysicsShape::new();
        for i in 0..8 {
            let angle = i as f64 * std::f64::consts::TAU / 8.0;
            octagon.add_point(20.0 * angle.cos(), 20.0 * angle.sin());
        }
        assert!(octagon.collider().is_ok());
    }

    #[test]
    fn circle_radius_is_shrunk() {
        let mut shape = PhysicsShape::new();
        shape.circle(16.0);
        let collider = shape.collider().expect("valid circle");
        match collider.shape {
            crate::core::collider::ColliderShape::Circle { radius, .. } => {
                assert_relative_eq!(radius, 0.155, epsilon = 1e-6)
            }
            other => panic!("unexpected collider {other:?}"),
        }

        let mut tiny = PhysicsShape::new();
        tiny.circle(0.3);
        assert!(matches!(tiny.collider(), Err(MachineError::InvalidRadius(_))));
    }

    #[test]
    fn pose_setters_before_install_change_initial_pose() {
        let mut world = PhysicsWorld::default();
        let mut shape = PhysicsShape::new();
        shape.centered_square(20.0);
        shape
            .set_position(&mut world, DVec2::new(30.0, 40.0))
            .expect("not installed");
        shape.set_rotation(&mut world, 0.25).expect("not installed");
        assert_eq!(shape.initial_position(), DVec2::new(30.0, 40.0));
        assert_eq!(shape.initial_rotation(), 0.25);
    }

    #[test]
    fn installed_shape_reports_pose_in_design_units() {
        let mut world = PhysicsWorld::default();
        let mut shape = PhysicsShape::new();
        shape.centered_square(20.0);
        shape.set_body_type(BodyType::Dynamic);
        shape.set_initial_position(DVec2::new(-150.0, 250.0));
        shape.set_initial_rotation(0.125);
        let id = shape.install(&mut world).expect("install");

        let position = shape.position(&world);
        assert_relative_eq!(position.x, -150.0, epsilon = 1e-3);
        assert_relative_eq!(position.y, 250.0, epsilon = 1e-3);
        assert_relative_eq!(shape.rotation(&world), 0.125, epsilon = 1e-6);

        shape.set_rotation(&mut world, 0.5).expect("body is live");
        let body = world.body(id).expect("body exists");
        assert_eq!(body.gravity_scale, 0.0);
        assert_relative_eq!(body.angle(), std::f32::consts::PI, epsilon = 1e-6);
    }

    #[test]
    fn stale_body_is_reported() {
        let mut world = PhysicsWorld::default();
        let mut shape = PhysicsShape::new();
        shape.circle(10.0);
        let id = shape.install(&mut world).expect("install");
        world.destroy_body(id);
        assert!(matches!(
            shape.set_angular_velocity(&mut world, 1.0),
            Err(MachineError::StaleBody(stale)) if stale == id
        ));
    }
}
