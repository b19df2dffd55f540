use glam::Vec2;

use super::contact::{ContactFeature, FeatureType};

/// A point of the incident edge carried through clipping, with the feature it came from.
#[derive(Debug, Clone, Copy)]
pub struct ClipVertex {
    pub point: Vec2,
    pub id: ContactFeature,
}

/// Clips a segment against the half-plane `dot(normal, x) <= offset`.
///
/// Returns the surviving vertices (0, 1 or 2). A vertex created by the clip is tagged
/// with `vertex_index_a` so warm starting can match it next step.
pub fn clip_segment_to_line(
    input: [ClipVertex; 2],
    normal: Vec2,
    offset: f32,
    vertex_index_a: u8,
) -> Vec<ClipVertex> {
    let mut output = Vec::with_capacity(2);

    let distance0 = normal.dot(input[0].point) - offset;
    let distance1 = normal.dot(input[1].point) - offset;

    if distance0 <= 0.0 {
        output.push(input[0]);
    }
    if distance1 <= 0.0 {
        output.push(input[1]);
    }

    if distance0 * distance1 < 0.0 {
        let interp = distance0 / (distance0 - distance1);
        output.push(ClipVertex {
            point: input[0].point + interp * (input[1].point - input[0].point),
            id: ContactFeature {
                index_a: vertex_index_a,
                index_b: input[0].id.index_b,
                type_a: FeatureType::Vertex,
                type_b: FeatureType::Face,
            },
        });
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, index: u8) -> ClipVertex {
        ClipVertex {
            point: Vec2::new(x, y),
            id: ContactFeature {
                index_a: 0,
                index_b: index,
                type_a: FeatureType::Face,
                type_b: FeatureType::Vertex,
            },
        }
    }

    #[test]
    fn segment_crossing_line_is_cut() {
        let clipped = clip_segment_to_line([vertex(-1.0, 0.0, 0), vertex(1.0, 0.0, 1)], Vec2::X, 0.5, 7);
        assert_eq!(clipped.len(), 2);
        assert!((clipped[1].point.x - 0.5).abs() < 1e-6);
        assert_eq!(clipped[1].id.index_a, 7);
        assert_eq!(clipped[1].id.type_a, FeatureType::Vertex);
    }

    #[test]
    fn segment_outside_line_is_dropped() {
        let clipped = clip_segment_to_line([vertex(1.0, 0.0, 0), vertex(2.0, 0.0, 1)], Vec2::X, 0.5, 0);
        assert!(clipped.is_empty());
    }
}
