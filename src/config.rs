use cgmath::Point3;

use crate::scene::PickTag;

/// Every tunable constant of the portfolio scene.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub title: String,
    /// Id of the DOM element the canvas is appended to (web only)
    pub mount_id: String,
    pub earth_model_path: String,
    pub satellite_model_path: String,

    // Starfield
    pub star_count: usize,
    /// Side length of the cube the stars are scattered in
    pub star_extent: f32,

    // Placeholders
    pub earth_radius: f32,
    pub orbit_radius: f32,

    // Animation (radians per frame unless noted)
    pub earth_spin: f32,
    pub satellite_spin: f32,
    pub wobble_amplitude: f32,
    /// Multiplied with wall clock milliseconds
    pub wobble_frequency: f64,
    /// Radians of orbit per pixel of wheel `deltaY`
    pub scroll_sensitivity: f32,

    // Camera
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    pub eye: Point3<f32>,

    /// Node names authored in the satellite model, mapped to the part they stand for
    pub satellite_parts: Vec<(String, PickTag)>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            title: "Orbital portfolio".to_string(),
            mount_id: "scene-container".to_string(),
            earth_model_path: "assets/earth-cartoon.glb".to_string(),
            satellite_model_path: "assets/satelajt.glb".to_string(),
            star_count: 10_000,
            star_extent: 2000.0,
            earth_radius: 5.0,
            orbit_radius: 10.0,
            earth_spin: 0.001,
            satellite_spin: 0.002,
            wobble_amplitude: 0.05,
            wobble_frequency: 0.0001,
            scroll_sensitivity: 0.001,
            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            eye: Point3::new(0.0, 15.0, 20.0),
            satellite_parts: vec![
                ("Button".to_string(), PickTag::Screen),
                ("Antena".to_string(), PickTag::Antenna),
                ("Paneli1".to_string(), PickTag::SolarPanel1),
                ("Paneli2".to_string(), PickTag::SolarPanel2),
            ],
        }
    }
}
