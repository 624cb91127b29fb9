//! Ray casting against scene meshes, used for click picking.

use cgmath::{InnerSpace, Matrix4, Point3, Transform as _, Vector3};

use crate::scene::{NodeId, NodeKind, PickTag, Scene};

/// A 3D ray with origin and direction
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>, // Normalized
}

impl Ray {
    /// Create a new ray, normalizing the direction
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }
}

/// Ray-triangle intersection using the Möller–Trumbore algorithm.
/// Both faces count. Returns the distance along the ray.
pub fn ray_triangle_intersect(ray: &Ray, v0: Point3<f32>, v1: Point3<f32>, v2: Point3<f32>) -> Option<f32> {
    const EPSILON: f32 = 0.0000001;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    if t > EPSILON {
        Some(t)
    } else {
        None
    }
}

/// A mesh node struck by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub node: NodeId,
    pub tag: Option<PickTag>,
    pub distance: f32,
}

/// Nearest hit of the ray in the node's meshes, triangles taken to world space
fn intersect_node(ray: &Ray, kind: &NodeKind, world: &Matrix4<f32>) -> Option<f32> {
    let NodeKind::Mesh(meshes) = kind else {
        return None;
    };

    meshes
        .iter()
        .flat_map(|mesh| mesh.triangles())
        .filter_map(|[a, b, c]| {
            let to_world = |v: Vector3<f32>| world.transform_point(Point3::new(v.x, v.y, v.z));
            ray_triangle_intersect(ray, to_world(a), to_world(b), to_world(c))
        })
        .min_by(|a, b| a.total_cmp(b))
}

/// Every mesh below `root` (root excluded) hit by the ray, nearest first.
/// Equal distances keep depth first order.
pub fn intersect_descendants(scene: &Scene, root: NodeId, ray: &Ray) -> Vec<Hit> {
    let mut hits: Vec<Hit> = scene
        .descendants(root)
        .into_iter()
        .filter_map(|id| {
            let node = scene.get(id)?;
            let distance = intersect_node(ray, &node.kind, &scene.world_matrix(id))?;
            Some(Hit {
                node: id,
                tag: node.tag,
                distance,
            })
        })
        .collect();

    // Stable sort, ties stay in traversal order
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}
