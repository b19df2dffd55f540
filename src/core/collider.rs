use super::types::{MassProperties, Material, Transform};
use crate::collision::shapes::{circle_mass_properties, Aabb, ConvexPolygon};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Enumeration of supported collider geometries, in body-local metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Circle { center: Vec2, radius: f32 },
    Polygon(ConvexPolygon),
}

impl ColliderShape {
    pub fn circle(radius: f32) -> Self {
        ColliderShape::Circle {
            center: Vec2::ZERO,
            radius,
        }
    }

    pub fn compute_aabb(&self, transform: &Transform) -> Aabb {
        match self {
            ColliderShape::Circle { center, radius } => {
                let p = transform.apply(*center);
                Aabb::new(p - Vec2::splat(*radius), p + Vec2::splat(*radius))
            }
            ColliderShape::Polygon(polygon) => polygon.compute_aabb(transform),
        }
    }

    pub fn mass_properties(&self, density: f32) -> MassProperties {
        match self {
            ColliderShape::Circle { center, radius } => {
                circle_mass_properties(*center, *radius, density)
            }
            ColliderShape::Polygon(polygon) => polygon.mass_properties(density),
        }
    }

    pub fn bounding_radius(&self) -> f32 {
        match self {
            ColliderShape::Circle { center, radius } => center.length() + radius,
            ColliderShape::Polygon(polygon) => {
                polygon
                    .vertices()
                    .iter()
                    .map(|v| v.length())
                    .fold(0.0, f32::max)
                    + polygon.radius()
            }
        }
    }
}

/// Geometry plus surface material attached to a rigid body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: ColliderShape,
    pub material: Material,
}

impl Collider {
    pub fn builder() -> ColliderBuilder {
        ColliderBuilder::new()
    }

    pub fn compute_aabb(&self, transform: &Transform) -> Aabb {
        self.shape.compute_aabb(transform)
    }

    pub fn mass_properties(&self) -> MassProperties {
        self.shape.mass_properties(self.material.density)
    }
}

pub struct ColliderBuilder {
    shape: ColliderShape,
    material: Material,
}

impl Default for ColliderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ColliderBuilder {
    pub fn new() -> Self {
        Self {
            shape: ColliderShape::circle(0.5),
            material: Material::default(),
        }
    }

    pub fn circle(mut self, radius: f32) -> Self {
        self.shape = ColliderShape::circle(radius);
        self
    }

    pub fn polygon(mut self, polygon: ConvexPolygon) -> Self {
        self.shape = ColliderShape::Polygon(polygon);
        self
    }

    pub fn material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn build(self) -> Collider {
        Collider {
            shape: self.shape,
            material: self.material,
        }
    }
}
