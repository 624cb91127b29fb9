//! The portfolio scene: starfield, Earth and the orbiting satellite, plus
//! everything that mutates them (orbit scrolling, per frame animation and
//! swapping placeholders for loaded models).

use cgmath::{Point3, Transform as _, Vector3};
use rand::Rng;

use crate::{
    config::SceneConfig,
    placeholder,
    ray::{self, Hit, Ray},
    resources::{AssetEvent, AssetKind},
    scene::{NodeId, PickTag, Scene, Subtree},
    starfield,
};

/// What applying a load completion did to the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The placeholder was swapped for the loaded model
    Replaced,
    /// Loading failed, the current subtree stays
    Kept,
}

pub struct World {
    pub scene: Scene,
    earth: NodeId,
    orbit: NodeId,
    satellite: NodeId,
    config: SceneConfig,
}

impl World {
    /// Builds the starfield and both placeholders
    pub fn new(config: &SceneConfig, rng: &mut impl Rng) -> Self {
        let mut scene = Scene::new();
        let root = scene.root();

        scene.attach(
            root,
            starfield::build_starfield(rng, config.star_count, config.star_extent),
        );
        let earth = scene.attach(root, placeholder::build_earth(config.earth_radius));
        let orbit = scene.attach(root, placeholder::build_orbit());
        let satellite = scene.attach(
            orbit,
            placeholder::build_satellite().with_translation(config.orbit_radius, 0.0, 0.0),
        );

        Self {
            scene,
            earth,
            orbit,
            satellite,
            config: config.clone(),
        }
    }

    pub fn earth(&self) -> NodeId {
        self.earth
    }

    pub fn orbit(&self) -> NodeId {
        self.orbit
    }

    pub fn satellite(&self) -> NodeId {
        self.satellite
    }

    pub fn earth_position(&self) -> Point3<f32> {
        self.scene
            .world_matrix(self.earth)
            .transform_point(Point3::new(0.0, 0.0, 0.0))
    }

    fn angles(&self, id: NodeId) -> Vector3<f32> {
        self.scene
            .get(id)
            .map(|node| node.transform.angles)
            .unwrap_or_else(|| Vector3::new(0.0, 0.0, 0.0))
    }

    fn angles_mut(&mut self, id: NodeId) -> Option<&mut Vector3<f32>> {
        self.scene.get_mut(id).map(|node| &mut node.transform.angles)
    }

    /// Revolution of the satellite around the Earth, in radians
    pub fn orbit_angle(&self) -> f32 {
        self.angles(self.orbit).y
    }

    pub fn earth_angles(&self) -> Vector3<f32> {
        self.angles(self.earth)
    }

    pub fn satellite_angles(&self) -> Vector3<f32> {
        self.angles(self.satellite)
    }

    /// Advances the orbit by a wheel `deltaY` (pixels, positive scrolls down).
    /// The angle is never clamped.
    pub fn scroll(&mut self, delta_y: f32) {
        let sensitivity = self.config.scroll_sensitivity;
        if let Some(angles) = self.angles_mut(self.orbit) {
            angles.y += delta_y * sensitivity;
        }
    }

    /// Per frame animation. `time_ms` is wall clock time in milliseconds.
    pub fn tick(&mut self, time_ms: f64) {
        let earth_spin = self.config.earth_spin;
        if let Some(angles) = self.angles_mut(self.earth) {
            angles.y += earth_spin;
        }

        let satellite_spin = self.config.satellite_spin;
        let wobble = ((time_ms * self.config.wobble_frequency).sin()
            * self.config.wobble_amplitude as f64) as f32;
        if let Some(angles) = self.angles_mut(self.satellite) {
            angles.y += satellite_spin;
            angles.x = wobble;
        }
    }

    /// Swaps in a loaded model, or logs why it couldn't be loaded
    pub fn apply(&mut self, event: AssetEvent) -> LoadOutcome {
        let AssetEvent { kind, result } = event;
        let subtree = match result {
            Ok(subtree) => subtree,
            Err(err) => {
                log::error!("An error occurred while loading the {} model: {}", kind, err);
                return LoadOutcome::Kept;
            }
        };

        match kind {
            AssetKind::Earth => {
                self.scene.remove(self.earth);
                self.earth = self.scene.attach(self.scene.root(), subtree);
            }
            AssetKind::Satellite => self.replace_satellite(subtree),
        }
        log::info!("Loaded the {} model", kind);
        LoadOutcome::Replaced
    }

    fn replace_satellite(&mut self, mut subtree: Subtree) {
        let found = subtree.retag(&self.config.satellite_parts);
        if found < self.config.satellite_parts.len() {
            log::debug!(
                "Satellite model has {} of {} interactive parts",
                found,
                self.config.satellite_parts.len()
            );
        }
        // The loaded root doesn't inherit the placeholder's offset
        subtree.transform.translation = Vector3::new(self.config.orbit_radius, 0.0, 0.0);

        self.scene.remove(self.satellite);
        self.satellite = self.scene.attach(self.orbit, subtree);
    }

    /// Nearest satellite part hit by the ray
    pub fn pick(&self, ray: &Ray) -> Option<Hit> {
        ray::intersect_descendants(&self.scene, self.satellite, ray)
            .into_iter()
            .next()
    }

    /// Nodes of the live satellite carrying `tag`
    pub fn tagged(&self, tag: PickTag) -> Vec<NodeId> {
        self.scene.find_tagged(self.satellite, tag)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        model::{Material, Mesh},
        primitives::cube::generate_box,
        resources::AssetError,
        scene::NodeKind,
    };

    /// Counts error records logged on the calling thread
    mod error_log {
        use std::{cell::Cell, sync::Once};

        thread_local! {
            static ERRORS: Cell<usize> = Cell::new(0);
        }

        struct ErrorCounter;

        impl log::Log for ErrorCounter {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                metadata.level() <= log::Level::Error
            }

            fn log(&self, record: &log::Record) {
                if record.level() == log::Level::Error {
                    ERRORS.with(|errors| errors.set(errors.get() + 1));
                }
            }

            fn flush(&self) {}
        }

        static LOGGER: ErrorCounter = ErrorCounter;
        static INIT: Once = Once::new();

        pub fn errors_logged_by(f: impl FnOnce()) -> usize {
            INIT.call_once(|| {
                let _ = log::set_logger(&LOGGER);
                log::set_max_level(log::LevelFilter::Error);
            });
            let before = ERRORS.with(Cell::get);
            f();
            ERRORS.with(Cell::get) - before
        }
    }

    fn small_config() -> SceneConfig {
        SceneConfig {
            star_count: 100,
            ..Default::default()
        }
    }

    fn world() -> World {
        World::new(&small_config(), &mut StdRng::seed_from_u64(3))
    }

    fn cube(name: &str) -> Subtree {
        let (vertices, indices) = generate_box(1.0, 1.0, 1.0);
        Subtree::mesh(name, Mesh::new(name, vertices, indices, Material::default()))
    }

    fn loaded_satellite(part_names: &[&str]) -> Subtree {
        let mut body = Subtree::group("Satelit");
        for name in part_names {
            body = body.with_child(cube(name));
        }
        Subtree::group("Scene").with_child(body)
    }

    fn root_children(world: &World) -> Vec<NodeId> {
        world
            .scene
            .get(world.scene.root())
            .unwrap()
            .children()
            .to_vec()
    }

    #[test]
    fn test_startup_scene() {
        let world = world();
        // Starfield, Earth and the orbit group
        let children = root_children(&world);
        assert_eq!(children.len(), 3);
        assert!(matches!(
            world.scene.get(children[0]).unwrap().kind,
            NodeKind::Points(_)
        ));
        assert_eq!(children[1], world.earth());
        assert_eq!(children[2], world.orbit());
        assert_eq!(
            world.scene.get(world.orbit()).unwrap().children(),
            &[world.satellite()]
        );
        for tag in PickTag::ALL {
            assert_eq!(world.tagged(tag).len(), 1);
        }
        assert_eq!(world.earth_position(), Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_satellite_sits_on_orbit_radius() {
        let world = world();
        let p = world
            .scene
            .world_matrix(world.satellite())
            .transform_point(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(p, Point3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_scroll_moves_orbit_angle() {
        let mut world = world();
        world.scroll(1000.0);
        assert!((world.orbit_angle() - 1.0).abs() < 1e-6);
        world.scroll(-500.0);
        assert!((world.orbit_angle() - 0.5).abs() < 1e-6);
        // Unbounded
        for _ in 0..10 {
            world.scroll(1000.0);
        }
        assert!((world.orbit_angle() - 10.5).abs() < 1e-4);
    }

    #[test]
    fn test_tick_spins_and_wobbles() {
        let mut world = world();
        world.tick(0.0);
        world.tick(0.0);
        assert!((world.earth_angles().y - 0.002).abs() < 1e-7);
        assert!((world.satellite_angles().y - 0.004).abs() < 1e-7);
        assert_eq!(world.satellite_angles().x, 0.0);

        // The wobble is set from the clock, not accumulated
        let t = std::f64::consts::FRAC_PI_2 / 0.0001;
        world.tick(t);
        world.tick(t);
        assert!((world.satellite_angles().x - 0.05).abs() < 1e-6);
        // Scrolling is the only thing turning the orbit
        assert_eq!(world.orbit_angle(), 0.0);
    }

    #[test]
    fn test_earth_replacement_happens_once() {
        let mut world = world();
        let placeholder = world.earth();
        let before = world.scene.len();

        let outcome = world.apply(AssetEvent {
            kind: AssetKind::Earth,
            result: Ok(Subtree::group("Scene").with_child(cube("Earth"))),
        });
        assert_eq!(outcome, LoadOutcome::Replaced);
        assert!(!world.scene.contains(placeholder));
        assert!(world.scene.contains(world.earth()));
        // One placeholder node out, two loaded nodes in
        assert_eq!(world.scene.len(), before - 1 + 2);

        let children = root_children(&world);
        assert_eq!(children.len(), 3);
        assert_eq!(
            children.iter().filter(|&&id| id == world.earth()).count(),
            1
        );
    }

    #[test]
    fn test_satellite_replacement_retags_parts() {
        let mut world = world();
        world.tick(0.0);
        let placeholder = world.satellite();

        let outcome = world.apply(AssetEvent {
            kind: AssetKind::Satellite,
            result: Ok(loaded_satellite(&["Button", "Antena", "Paneli1", "Paneli2", "Body"])),
        });
        assert_eq!(outcome, LoadOutcome::Replaced);
        assert!(!world.scene.contains(placeholder));
        assert_eq!(
            world.scene.get(world.orbit()).unwrap().children(),
            &[world.satellite()]
        );
        for tag in PickTag::ALL {
            assert_eq!(world.tagged(tag).len(), 1, "{:?}", tag);
        }

        // Offset re-applied and spin starts over on the new root
        let satellite = world.scene.get(world.satellite()).unwrap();
        assert_eq!(satellite.transform.translation, Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(satellite.transform.angles.y, 0.0);
    }

    #[test]
    fn test_missing_part_stays_unreachable() {
        let mut world = world();
        world.apply(AssetEvent {
            kind: AssetKind::Satellite,
            result: Ok(loaded_satellite(&["Button", "Paneli1", "Paneli2"])),
        });
        assert!(world.tagged(PickTag::Antenna).is_empty());
        assert_eq!(world.tagged(PickTag::Screen).len(), 1);
    }

    #[test]
    fn test_failed_load_keeps_placeholder() {
        let mut world = world();
        let placeholder = world.satellite();
        let before = world.scene.len();

        let outcome = world.apply(AssetEvent {
            kind: AssetKind::Satellite,
            result: Err(AssetError::NoScene),
        });
        assert_eq!(outcome, LoadOutcome::Kept);
        assert_eq!(world.satellite(), placeholder);
        assert_eq!(world.scene.len(), before);
        for tag in PickTag::ALL {
            assert_eq!(world.tagged(tag).len(), 1);
        }
    }

    #[test]
    fn test_failed_load_logs_one_error() {
        let mut world = world();
        for kind in [AssetKind::Satellite, AssetKind::Earth] {
            let errors = error_log::errors_logged_by(|| {
                world.apply(AssetEvent {
                    kind,
                    result: Err(AssetError::NoScene),
                });
            });
            assert_eq!(errors, 1, "{}", kind);
        }
    }

    #[test]
    fn test_successful_load_logs_no_error() {
        let mut world = world();
        let errors = error_log::errors_logged_by(|| {
            // Missing parts are not an error either
            world.apply(AssetEvent {
                kind: AssetKind::Satellite,
                result: Ok(loaded_satellite(&["Button"])),
            });
            world.apply(AssetEvent {
                kind: AssetKind::Earth,
                result: Ok(Subtree::group("Scene").with_child(cube("Earth"))),
            });
        });
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_loads_are_independent() {
        let mut world = world();
        world.apply(AssetEvent {
            kind: AssetKind::Satellite,
            result: Ok(loaded_satellite(&["Button"])),
        });
        let earth = world.earth();
        world.apply(AssetEvent {
            kind: AssetKind::Earth,
            result: Err(AssetError::NoScene),
        });
        assert_eq!(world.earth(), earth);
        assert_eq!(world.tagged(PickTag::Screen).len(), 1);
    }
}
