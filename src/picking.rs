//! Turns a click into the overlay of the satellite part under the pointer.

use cgmath::Vector2;

use crate::{
    camera::Camera,
    overlay::{Overlay, OverlayManager, Panel},
    world::World,
};

/// Pixel position in the canvas to normalized device coordinates (-1..1, Y up)
pub fn pointer_to_ndc(x: f64, y: f64, width: u32, height: u32) -> Vector2<f32> {
    Vector2::new(
        (x / width as f64 * 2.0 - 1.0) as f32,
        (-(y / height as f64) * 2.0 + 1.0) as f32,
    )
}

/// Overlay belonging to the nearest satellite part under `ndc`.
/// Untagged parts (like the body) and misses give `None`.
pub fn pick_overlay(world: &World, camera: &Camera, ndc: Vector2<f32>) -> Option<Overlay> {
    let hit = world.pick(&camera.ray_through(ndc))?;
    if let Some(node) = world.scene.get(hit.node) {
        log::info!("Clicked: {}", node.name);
    }
    hit.tag.map(Overlay::for_tag)
}

/// Handles a click at pixel `(x, y)` by showing the matching overlay
pub fn dispatch_click<P: Panel>(
    world: &World,
    camera: &Camera,
    overlays: &OverlayManager<P>,
    (x, y): (f64, f64),
    (width, height): (u32, u32),
) -> Option<Overlay> {
    if width == 0 || height == 0 {
        return None;
    }
    let overlay = pick_overlay(world, camera, pointer_to_ndc(x, y, width, height))?;
    overlays.show(overlay.dom_id());
    Some(overlay)
}
