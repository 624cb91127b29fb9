use std::f32::consts::PI;

use super::Geometry;
use crate::model::MeshVertex;

/// Generates UV sphere vertices and index data around the Y axis
pub fn generate_sphere(radius: f32, sector_count: u32, stack_count: u32) -> Geometry {
    // Final vertex and index buffer data
    let mut vertices: Vec<MeshVertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    let length_inv = 1.0 / radius;
    let sector_step = 2.0 * PI / sector_count as f32;
    let stack_step = PI / stack_count as f32;

    // Build the vertex buffer data (position, normal), one ring per stack
    // from the north pole down
    for i in 0..=stack_count {
        let stack_angle = PI / 2.0 - i as f32 * stack_step;
        let xz = radius * stack_angle.cos();
        let y = radius * stack_angle.sin();

        for j in 0..=sector_count {
            let sector_angle = j as f32 * sector_step;

            let x = xz * sector_angle.cos();
            let z = -xz * sector_angle.sin();

            vertices.push(MeshVertex {
                position: [x, y, z],
                normal: [x * length_inv, y * length_inv, z * length_inv],
            })
        }
    }

    // `k1` walks the upper ring and `k2` the ring below it.
    //  k1--k1+1
    //  |  / |
    //  | /  |
    //  k2--k2+1
    for i in 0..stack_count {
        let mut k1 = i * (sector_count + 1);
        let mut k2 = k1 + sector_count + 1;

        for _j in 0..sector_count {
            // The first and last stacks collapse to a single triangle each
            if i != 0 {
                indices.extend_from_slice(&[k1, k2, k1 + 1]);
            }
            if i != stack_count - 1 {
                indices.extend_from_slice(&[k1 + 1, k2, k2 + 1]);
            }

            k1 += 1;
            k2 += 1;
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_vertices_on_radius() {
        let (vertices, _) = generate_sphere(5.0, 12, 6);
        assert_eq!(vertices.len(), 13 * 7);
        for v in &vertices {
            let [x, y, z] = v.position;
            assert!(((x * x + y * y + z * z).sqrt() - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_sphere_index_count() {
        // Two triangles per quad minus one per pole quad
        let (_, indices) = generate_sphere(1.0, 12, 6);
        assert_eq!(indices.len(), (12 * 6 * 2 - 2 * 12) * 3);
    }
}
