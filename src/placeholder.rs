//! Primitive stand-ins shown until the model files have loaded.

use crate::{
    model::{Material, Mesh},
    primitives::{cube::generate_box, cylinder::generate_cylinder, sphere::generate_sphere},
    scene::{PickTag, Subtree},
};

fn mesh(name: &str, (vertices, indices): crate::primitives::Geometry, material: Material) -> Mesh {
    Mesh::new(name, vertices, indices, material)
}

/// Blue sphere standing in for the Earth model
pub fn build_earth(radius: f32) -> Subtree {
    Subtree::mesh(
        "Earth",
        mesh(
            "earth",
            generate_sphere(radius, 64, 64),
            Material::standard(0x0000ff, 0.3, 0.7),
        ),
    )
}

/// Box body with two solar panels, an antenna and a screen. The four
/// interactive parts carry their [`PickTag`].
pub fn build_satellite() -> Subtree {
    let panel = Material::standard(0x00ff00, 0.8, 0.2);

    Subtree::group("Satellite")
        .with_child(Subtree::mesh(
            "Body",
            mesh(
                "body",
                generate_box(1.5, 1.0, 1.0),
                Material::standard(0x888888, 0.5, 0.5),
            ),
        ))
        .with_child(
            Subtree::mesh("", mesh("solar panel", generate_box(0.1, 2.0, 1.0), panel))
                .with_tag(PickTag::SolarPanel1)
                .with_translation(-0.8, 0.0, 0.0),
        )
        .with_child(
            Subtree::mesh("", mesh("solar panel", generate_box(0.1, 2.0, 1.0), panel))
                .with_tag(PickTag::SolarPanel2)
                .with_translation(0.8, 0.0, 0.0),
        )
        .with_child(
            Subtree::mesh(
                "",
                mesh(
                    "antenna",
                    generate_cylinder(0.1, 0.05, 1.5, 16),
                    Material::standard(0xffff00, 0.6, 0.4),
                ),
            )
            .with_tag(PickTag::Antenna)
            .with_translation(0.0, 0.75, 0.0),
        )
        .with_child(
            Subtree::mesh(
                "",
                mesh(
                    "screen",
                    generate_box(0.8, 0.5, 0.05),
                    Material::standard(0xff00ff, 0.1, 0.9),
                ),
            )
            .with_tag(PickTag::Screen)
            .with_translation(0.0, 0.0, 0.5),
        )
}

/// Group whose Y rotation is the satellite's revolution around the Earth
pub fn build_orbit() -> Subtree {
    Subtree::group("Orbit")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    #[test]
    fn test_satellite_parts_tagged_once() {
        let mut scene = Scene::new();
        let id = scene.attach(scene.root(), build_satellite());
        assert_eq!(scene.descendants(id).len(), 5);
        for tag in PickTag::ALL {
            let tagged = scene.find_tagged(id, tag);
            assert_eq!(tagged.len(), 1, "{:?}", tag);
            assert_eq!(scene.get(tagged[0]).unwrap().name, tag.name());
        }
    }

    #[test]
    fn test_earth_is_untagged_mesh() {
        let earth = build_earth(5.0);
        assert_eq!(earth.len(), 1);
        assert!(earth.tag.is_none());
    }
}
