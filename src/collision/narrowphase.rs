use glam::Vec2;

use crate::{
    config::LINEAR_SLOP,
    core::{collider::ColliderShape, types::Transform},
};

use super::{
    clipping::{clip_segment_to_line, ClipVertex},
    contact::{ContactFeature, FeatureType, Manifold, ManifoldPoint, ManifoldType},
    shapes::ConvexPolygon,
};

/// Narrow phase: exact manifolds between pairs of convex shapes.
pub struct NarrowPhase;

impl NarrowPhase {
    /// Rank used to order a pair so that shape A is never "smaller" than shape B.
    /// Polygon/circle pairs always have the polygon as A.
    pub fn shape_rank(shape: &ColliderShape) -> u8 {
        match shape {
            ColliderShape::Circle { .. } => 0,
            ColliderShape::Polygon(_) => 1,
        }
    }

    /// Computes the manifold for an ordered pair. A circle/polygon pair (wrong order)
    /// yields an empty manifold.
    pub fn collide(
        shape_a: &ColliderShape,
        xf_a: &Transform,
        shape_b: &ColliderShape,
        xf_b: &Transform,
    ) -> Manifold {
        match (shape_a, shape_b) {
            (
                ColliderShape::Circle {
                    center: center_a,
                    radius: radius_a,
                },
                ColliderShape::Circle {
                    center: center_b,
                    radius: radius_b,
                },
            ) => collide_circles(*center_a, *radius_a, xf_a, *center_b, *radius_b, xf_b),
            (ColliderShape::Polygon(polygon), ColliderShape::Circle { center, radius }) => {
                collide_polygon_and_circle(polygon, xf_a, *center, *radius, xf_b)
            }
            (ColliderShape::Polygon(polygon_a), ColliderShape::Polygon(polygon_b)) => {
                collide_polygons(polygon_a, xf_a, polygon_b, xf_b)
            }
            (ColliderShape::Circle { .. }, ColliderShape::Polygon(_)) => Manifold::default(),
        }
    }
}

fn collide_circles(
    center_a: Vec2,
    radius_a: f32,
    xf_a: &Transform,
    center_b: Vec2,
    radius_b: f32,
    xf_b: &Transform,
) -> Manifold {
    let p_a = xf_a.apply(center_a);
    let p_b = xf_b.apply(center_b);
    let radius = radius_a + radius_b;
    if p_a.distance_squared(p_b) > radius * radius {
        return Manifold::default();
    }

    Manifold {
        points: vec![ManifoldPoint {
            local_point: center_b,
            ..ManifoldPoint::default()
        }],
        local_normal: Vec2::ZERO,
        local_point: center_a,
        kind: ManifoldType::Circles,
    }
}

fn collide_polygon_and_circle(
    polygon: &ConvexPolygon,
    xf_a: &Transform,
    center: Vec2,
    circle_radius: f32,
    xf_b: &Transform,
) -> Manifold {
    // circle centre in the polygon's frame
    let c_local = xf_a.apply_inverse(xf_b.apply(center));
    let radius = polygon.radius() + circle_radius;
    let vertices = polygon.vertices();
    let normals = polygon.normals();
    let count = vertices.len();

    let mut normal_index = 0;
    let mut separation = f32::MIN;
    for i in 0..count {
        let s = normals[i].dot(c_local - vertices[i]);
        if s > radius {
            return Manifold::default();
        }
        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    let v1 = vertices[normal_index];
    let v2 = vertices[(normal_index + 1) % count];
    let point = ManifoldPoint {
        local_point: center,
        ..ManifoldPoint::default()
    };

    // centre inside the polygon
    if separation < f32::EPSILON {
        return Manifold {
            points: vec![point],
            local_normal: normals[normal_index],
            local_point: 0.5 * (v1 + v2),
            kind: ManifoldType::FaceA,
        };
    }

    let u1 = (c_local - v1).dot(v2 - v1);
    let u2 = (c_local - v2).dot(v1 - v2);
    let (local_normal, local_point) = if u1 <= 0.0 {
        if c_local.distance_squared(v1) > radius * radius {
            return Manifold::default();
        }
        ((c_local - v1).normalize(), v1)
    } else if u2 <= 0.0 {
        if c_local.distance_squared(v2) > radius * radius {
            return Manifold::default();
        }
        ((c_local - v2).normalize(), v2)
    } else {
        let face_center = 0.5 * (v1 + v2);
        if (c_local - face_center).dot(normals[normal_index]) > radius {
            return Manifold::default();
        }
        (normals[normal_index], face_center)
    };

    Manifold {
        points: vec![point],
        local_normal,
        local_point,
        kind: ManifoldType::FaceA,
    }
}

/// Largest separation of `poly2` from the edge normals of `poly1`, with the edge index.
fn find_max_separation(
    poly1: &ConvexPolygon,
    xf1: &Transform,
    poly2: &ConvexPolygon,
    xf2: &Transform,
) -> (usize, f32) {
    let mut best_index = 0;
    let mut max_separation = f32::MIN;

    for (i, (n1, v1)) in poly1.normals().iter().zip(poly1.vertices()).enumerate() {
        let normal = xf1.rotate(*n1);
        let vertex = xf1.apply(*v1);
        let si = poly2
            .vertices()
            .iter()
            .map(|v2| normal.dot(xf2.apply(*v2) - vertex))
            .fold(f32::MAX, f32::min);
        if si > max_separation {
            max_separation = si;
            best_index = i;
        }
    }

    (best_index, max_separation)
}

/// The edge of `poly2` most anti-parallel to reference edge `edge1` of `poly1`, in world space.
fn find_incident_edge(
    poly1: &ConvexPolygon,
    xf1: &Transform,
    edge1: usize,
    poly2: &ConvexPolygon,
    xf2: &Transform,
) -> [ClipVertex; 2] {
    let normal1 = xf2.rotate_inverse(xf1.rotate(poly1.normals()[edge1]));

    let mut index = 0;
    let mut min_dot = f32::MAX;
    for (i, n2) in poly2.normals().iter().enumerate() {
        let dot = normal1.dot(*n2);
        if dot < min_dot {
            min_dot = dot;
            index = i;
        }
    }

    let i1 = index;
    let i2 = (index + 1) % poly2.len();
    let feature = |vertex: usize| ContactFeature {
        index_a: edge1 as u8,
        index_b: vertex as u8,
        type_a: FeatureType::Face,
        type_b: FeatureType::Vertex,
    };

    [
        ClipVertex {
            point: xf2.apply(poly2.vertices()[i1]),
            id: feature(i1),
        },
        ClipVertex {
            point: xf2.apply(poly2.vertices()[i2]),
            id: feature(i2),
        },
    ]
}

/// Separating-axis test followed by clipping of the incident edge against the
/// reference face side planes.
fn collide_polygons(
    poly_a: &ConvexPolygon,
    xf_a: &Transform,
    poly_b: &ConvexPolygon,
    xf_b: &Transform,
) -> Manifold {
    let total_radius = poly_a.radius() + poly_b.radius();

    let (edge_a, separation_a) = find_max_separation(poly_a, xf_a, poly_b, xf_b);
    if separation_a > total_radius {
        return Manifold::default();
    }
    let (edge_b, separation_b) = find_max_separation(poly_b, xf_b, poly_a, xf_a);
    if separation_b > total_radius {
        return Manifold::default();
    }

    let tolerance = 0.1 * LINEAR_SLOP;
    let (poly1, xf1, poly2, xf2, edge1, kind, flip) = if separation_b > separation_a + tolerance {
        (poly_b, xf_b, poly_a, xf_a, edge_b, ManifoldType::FaceB, true)
    } else {
        (poly_a, xf_a, poly_b, xf_b, edge_a, ManifoldType::FaceA, false)
    };

    let incident = find_incident_edge(poly1, xf1, edge1, poly2, xf2);

    let iv1 = edge1;
    let iv2 = (edge1 + 1) % poly1.len();
    let local_v11 = poly1.vertices()[iv1];
    let local_v12 = poly1.vertices()[iv2];

    let local_tangent = (local_v12 - local_v11).normalize();
    let local_normal = Vec2::new(local_tangent.y, -local_tangent.x);
    let plane_point = 0.5 * (local_v11 + local_v12);

    let tangent = xf1.rotate(local_tangent);
    let normal = Vec2::new(tangent.y, -tangent.x);

    let v11 = xf1.apply(local_v11);
    let v12 = xf1.apply(local_v12);

    let front_offset = normal.dot(v11);
    let side_offset1 = -tangent.dot(v11) + total_radius;
    let side_offset2 = tangent.dot(v12) + total_radius;

    let clip1 = clip_segment_to_line(incident, -tangent, side_offset1, iv1 as u8);
    if clip1.len() < 2 {
        return Manifold::default();
    }
    let clip2 = clip_segment_to_line([clip1[0], clip1[1]], tangent, side_offset2, iv2 as u8);
    if clip2.len() < 2 {
        return Manifold::default();
    }

    let points = clip2
        .iter()
        .take(2)
        .filter(|cv| normal.dot(cv.point) - front_offset <= total_radius)
        .map(|cv| ManifoldPoint {
            local_point: xf2.apply_inverse(cv.point),
            id: if flip { cv.id.flipped() } else { cv.id },
            ..ManifoldPoint::default()
        })
        .collect();

    Manifold {
        points,
        local_normal,
        local_point: plane_point,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::contact::WorldManifold;
    use approx::assert_relative_eq;

    fn square(half: f32) -> ColliderShape {
        ColliderShape::Polygon(ConvexPolygon::rectangle(half, half, 0.0).expect("square"))
    }

    #[test]
    fn overlapping_circles_report_one_point() {
        let a = ColliderShape::circle(0.5);
        let b = ColliderShape::circle(0.5);
        let xf_b = Transform::new(Vec2::new(0.8, 0.0), 0.0);
        let manifold = NarrowPhase::collide(&a, &Transform::default(), &b, &xf_b);
        assert_eq!(manifold.point_count(), 1);

        let world = WorldManifold::new(&manifold, &Transform::default(), 0.5, &xf_b, 0.5);
        assert_relative_eq!(world.normal.x, 1.0);
        assert_relative_eq!(world.separations[0], -0.2, epsilon = 1e-6);
    }

    #[test]
    fn separated_circles_have_no_points() {
        let a = ColliderShape::circle(0.5);
        let xf_b = Transform::new(Vec2::new(1.2, 0.0), 0.0);
        let manifold = NarrowPhase::collide(&a, &Transform::default(), &a, &xf_b);
        assert_eq!(manifold.point_count(), 0);
    }

    #[test]
    fn circle_resting_on_box_face() {
        let ground = square(1.0);
        let ball = ColliderShape::circle(0.25);
        let xf_ball = Transform::new(Vec2::new(0.3, 1.2), 0.0);
        let manifold = NarrowPhase::collide(&ground, &Transform::default(), &ball, &xf_ball);
        assert_eq!(manifold.kind, ManifoldType::FaceA);
        assert_relative_eq!(manifold.local_normal.y, 1.0);

        let world = WorldManifold::new(&manifold, &Transform::default(), 0.0, &xf_ball, 0.25);
        assert_relative_eq!(world.separations[0], -0.05, epsilon = 1e-5);
    }

    #[test]
    fn stacked_boxes_give_two_points() {
        let box_shape = square(0.5);
        let xf_b = Transform::new(Vec2::new(0.1, 0.95), 0.0);
        let manifold = NarrowPhase::collide(&box_shape, &Transform::default(), &box_shape, &xf_b);
        assert_eq!(manifold.point_count(), 2);

        let world = WorldManifold::new(&manifold, &Transform::default(), 0.0, &xf_b, 0.0);
        assert_relative_eq!(world.normal.y.abs(), 1.0, epsilon = 1e-6);
        for separation in world.separations {
            assert_relative_eq!(separation, -0.05, epsilon = 1e-5);
        }
    }
}
