use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    config::{LINEAR_SLOP, MAX_POLYGON_VERTICES},
    core::types::{MassProperties, Transform},
};

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn fattened(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        0.5 * (self.min + self.max)
    }

    pub fn extents(&self) -> Vec2 {
        0.5 * (self.max - self.min)
    }
}

/// Convex polygon in body-local coordinates, counter-clockwise, with a skin radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexPolygon {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
    centroid: Vec2,
    radius: f32,
}

impl ConvexPolygon {
    /// Hulls `points` and builds the polygon.
    ///
    /// Returns `None` when the hull has fewer than three vertices (zero area) or more
    /// than [`MAX_POLYGON_VERTICES`].
    pub fn new(points: &[Vec2], radius: f32) -> Option<Self> {
        let vertices = convex_hull(points)?;
        if vertices.len() > MAX_POLYGON_VERTICES {
            return None;
        }

        let count = vertices.len();
        let normals = (0..count)
            .map(|i| {
                let edge = vertices[(i + 1) % count] - vertices[i];
                Vec2::new(edge.y, -edge.x).normalize()
            })
            .collect();
        let centroid = polygon_centroid(&vertices);

        Some(Self {
            vertices,
            normals,
            centroid,
            radius,
        })
    }

    pub fn rectangle(half_width: f32, half_height: f32, radius: f32) -> Option<Self> {
        Self::new(
            &[
                Vec2::new(-half_width, -half_height),
                Vec2::new(half_width, -half_height),
                Vec2::new(half_width, half_height),
                Vec2::new(-half_width, half_height),
            ],
            radius,
        )
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    pub fn centroid(&self) -> Vec2 {
        self.centroid
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn compute_aabb(&self, transform: &Transform) -> Aabb {
        let rotation = transform.rotation();
        let aabb = Aabb::from_points(
            self.vertices
                .iter()
                .map(|v| transform.position + rotation * *v),
        )
        .unwrap_or(Aabb::new(transform.position, transform.position));
        aabb.fattened(self.radius)
    }

    /// Mass data for a solid polygon of the given density. Inertia is about the centroid.
    pub fn mass_properties(&self, density: f32) -> MassProperties {
        let origin = self.vertices[0];
        let count = self.vertices.len();
        let mut area = 0.0;
        let mut center = Vec2::ZERO;
        let mut inertia = 0.0;

        for i in 1..count - 1 {
            let e1 = self.vertices[i] - origin;
            let e2 = self.vertices[i + 1] - origin;
            let d = e1.perp_dot(e2);
            let triangle_area = 0.5 * d;
            area += triangle_area;
            center += triangle_area * (e1 + e2) / 3.0;

            let int_x2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
            let int_y2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;
            inertia += (0.25 / 3.0 * d) * (int_x2 + int_y2);
        }

        let mass = density * area;
        let center = if area > f32::EPSILON { center / area } else { Vec2::ZERO };
        // inertia is about `origin`; shift it to the centroid
        let inertia = density * inertia - mass * center.length_squared();

        MassProperties {
            mass,
            center: center + origin,
            inertia,
        }
    }
}

/// Mass data for a solid circle. Inertia is about the circle centre.
pub fn circle_mass_properties(center: Vec2, radius: f32, density: f32) -> MassProperties {
    let mass = density * std::f32::consts::PI * radius * radius;
    MassProperties {
        mass,
        center,
        inertia: 0.5 * mass * radius * radius,
    }
}

/// Counter-clockwise convex hull (monotone chain). Points closer than half the
/// linear slop are welded, collinear points are dropped.
pub fn convex_hull(points: &[Vec2]) -> Option<Vec<Vec2>> {
    let weld = 0.5 * LINEAR_SLOP;
    let mut unique: Vec<Vec2> = Vec::with_capacity(points.len());
    for p in points {
        if !p.is_finite() {
            return None;
        }
        if unique.iter().all(|q| q.distance_squared(*p) > weld * weld) {
            unique.push(*p);
        }
    }
    if unique.len() < 3 {
        return None;
    }

    unique.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let cross = |o: Vec2, a: Vec2, b: Vec2| (a - o).perp_dot(b - o);
    let mut hull: Vec<Vec2> = Vec::with_capacity(unique.len() * 2);

    for &p in &unique {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in unique.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();

    if hull.len() < 3 {
        return None;
    }
    Some(hull)
}

fn polygon_centroid(vertices: &[Vec2]) -> Vec2 {
    let origin = vertices[0];
    let mut center = Vec2::ZERO;
    let mut area = 0.0;
    for i in 1..vertices.len() - 1 {
        let e1 = vertices[i] - origin;
        let e2 = vertices[i + 1] - origin;
        let a = 0.5 * e1.perp_dot(e2);
        center += a * (e1 + e2) / 3.0;
        area += a;
    }
    origin + center / area
}
