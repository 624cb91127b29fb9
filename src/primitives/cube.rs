use cgmath::Vector3;

use super::Geometry;
use crate::model::MeshVertex;

/// Face normal with the two in-plane axes, ordered so `u × v = normal`
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

/// Generates an axis aligned box with flat shaded faces (4 vertices each)
pub fn generate_box(width: f32, height: f32, depth: f32) -> Geometry {
    let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
    // Half extent of the box along a unit axis
    let extent = |axis: Vector3<f32>| -> f32 {
        axis.x.abs() * half.x + axis.y.abs() * half.y + axis.z.abs() * half.z
    };

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in FACES {
        let (normal, u, v): (Vector3<f32>, Vector3<f32>, Vector3<f32>) =
            (normal.into(), u.into(), v.into());
        let center = normal * extent(normal);
        let (hu, hv) = (u * extent(u), v * extent(v));

        let base = vertices.len() as u32;
        for corner in [center - hu - hv, center + hu - hv, center + hu + hv, center - hu + hv] {
            vertices.push(MeshVertex {
                position: corner.into(),
                normal: normal.into(),
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}
