use rand::Rng;

use crate::{
    model::{PointCloud, PointVertex},
    scene::Subtree,
};

const STAR_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.8];

/// Scatters `count` points uniformly in a cube of side `extent` centred on the origin
pub fn generate_stars(rng: &mut impl Rng, count: usize, extent: f32) -> PointCloud {
    let mut coordinate = || (rng.gen::<f32>() - 0.5) * extent;
    let points = (0..count)
        .map(|_| PointVertex {
            position: [coordinate(), coordinate(), coordinate()],
        })
        .collect();

    PointCloud::new(points, STAR_COLOR)
}

/// The starfield as a single point cloud node
pub fn build_starfield(rng: &mut impl Rng, count: usize, extent: f32) -> Subtree {
    Subtree::points("Starfield", generate_stars(rng, count, extent))
}
