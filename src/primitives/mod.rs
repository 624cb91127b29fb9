//! Procedural geometry used by the placeholder meshes.
//!
//! Every generator returns indexed vertex data centred on the origin with
//! counter-clockwise front faces and unit normals.

use crate::model::MeshVertex;

pub mod cube;
pub mod cylinder;
pub mod sphere;

/// Vertex and index buffer data of a primitive
pub type Geometry = (Vec<MeshVertex>, Vec<u32>);

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    fn assert_well_formed((vertices, indices): &Geometry) {
        assert!(!indices.is_empty());
        assert_eq!(indices.len() % 3, 0);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        for v in vertices {
            let n: Vector3<f32> = v.normal.into();
            assert!((n.magnitude() - 1.0).abs() < 1e-4, "normal {:?}", v.normal);
        }
    }

    // Faces must wind counter-clockwise seen from outside, i.e. the geometric
    // normal points away from the centre.
    fn assert_outward((vertices, indices): &Geometry) {
        for tri in indices.chunks_exact(3) {
            let p = |i: u32| -> Vector3<f32> { vertices[i as usize].position.into() };
            let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
            let n = (b - a).cross(c - a);
            if n.magnitude2() < 1e-12 {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid) > 0.0, "inward triangle {:?}", tri);
        }
    }

    #[test]
    fn test_primitives_are_well_formed() {
        assert_well_formed(&sphere::generate_sphere(5.0, 64, 64));
        assert_well_formed(&cube::generate_box(1.5, 1.0, 1.0));
        assert_well_formed(&cylinder::generate_cylinder(0.1, 0.05, 1.5, 16));
    }

    #[test]
    fn test_primitives_face_outward() {
        assert_outward(&sphere::generate_sphere(1.0, 16, 8));
        assert_outward(&cube::generate_box(0.1, 2.0, 1.0));
        assert_outward(&cylinder::generate_cylinder(0.1, 0.05, 1.5, 16));
    }
}
