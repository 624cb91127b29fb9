use std::f32::consts::PI;

use cgmath::{InnerSpace, Vector3};

use super::Geometry;
use crate::model::MeshVertex;

/// Generates a capped (possibly tapered) cylinder along the Y axis
pub fn generate_cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
) -> Geometry {
    let mut vertices: Vec<MeshVertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let half_height = height / 2.0;
    let slope = (radius_bottom - radius_top) / height;

    // Side wall: a top and a bottom vertex per segment edge
    for j in 0..=radial_segments {
        let theta = j as f32 / radial_segments as f32 * 2.0 * PI;
        let (sin, cos) = theta.sin_cos();
        let normal = Vector3::new(sin, slope, cos).normalize();

        vertices.push(MeshVertex {
            position: [radius_top * sin, half_height, radius_top * cos],
            normal: normal.into(),
        });
        vertices.push(MeshVertex {
            position: [radius_bottom * sin, -half_height, radius_bottom * cos],
            normal: normal.into(),
        });
    }
    for j in 0..radial_segments {
        let (top, bottom) = (j * 2, j * 2 + 1);
        let (next_top, next_bottom) = (top + 2, bottom + 2);
        indices.extend_from_slice(&[top, bottom, next_top, next_top, bottom, next_bottom]);
    }

    // Caps
    for (radius, y, sign) in [(radius_top, half_height, 1.0), (radius_bottom, -half_height, -1.0)] {
        if radius <= 0.0 {
            continue;
        }
        let center = vertices.len() as u32;
        vertices.push(MeshVertex {
            position: [0.0, y, 0.0],
            normal: [0.0, sign, 0.0],
        });
        for j in 0..=radial_segments {
            let theta = j as f32 / radial_segments as f32 * 2.0 * PI;
            let (sin, cos) = theta.sin_cos();
            vertices.push(MeshVertex {
                position: [radius * sin, y, radius * cos],
                normal: [0.0, sign, 0.0],
            });
        }
        for j in 0..radial_segments {
            let (a, b) = (center + 1 + j, center + 2 + j);
            if sign > 0.0 {
                indices.extend_from_slice(&[center, a, b]);
            } else {
                indices.extend_from_slice(&[center, b, a]);
            }
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cylinder_radii() {
        let (vertices, _) = generate_cylinder(0.1, 0.05, 1.5, 16);
        for v in vertices.iter().filter(|v| v.normal[1].abs() < 0.5) {
            let [x, y, z] = v.position;
            let r = (x * x + z * z).sqrt();
            let expected = if y > 0.0 { 0.1 } else { 0.05 };
            assert!((r - expected).abs() < 1e-5);
            assert!((y.abs() - 0.75).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cone_has_single_cap() {
        let (_, indices) = generate_cylinder(0.0, 1.0, 2.0, 8);
        // 8 side quads and one bottom fan
        assert_eq!(indices.len(), (8 * 2 + 8) * 3);
    }
}
