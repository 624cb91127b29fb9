use context::GraphicsContext;
use pass::{
    phong::{PhongConfig, PhongPass},
    Pass,
};
use winit::event_loop::ControlFlow;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

mod camera;
mod config;
mod context;
mod model;
mod overlay;
mod pass;
mod picking;
mod placeholder;
mod primitives;
mod ray;
mod resources;
mod scene;
mod starfield;
mod texture;
mod window;
mod world;

use crate::{
    camera::Camera,
    config::SceneConfig,
    overlay::OverlayManager,
    resources::AssetEvent,
    window::{Window, WindowEvents},
    world::World,
};

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        type Panel = overlay::DomPanel;
    } else {
        type Panel = overlay::MemoryPanel;
    }
}

/// Wall clock time in milliseconds since the Unix epoch
fn now_ms() -> f64 {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            js_sys::Date::now()
        } else {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs_f64() * 1000.0)
                .unwrap_or_default()
        }
    }
}

fn create_overlays() -> OverlayManager<Panel> {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            match web_sys::window().and_then(|win| win.document()) {
                Some(document) => {
                    let overlays = OverlayManager::from_document(&document);
                    overlays.bind_close_controls(&document);
                    overlays
                }
                None => {
                    log::warn!("No document, overlays are disabled");
                    OverlayManager::new()
                }
            }
        } else {
            OverlayManager::in_memory()
        }
    }
}

struct State {
    ctx: GraphicsContext,
    pass: PhongPass,
    // Window size
    size: winit::dpi::PhysicalSize<u32>,
    camera: Camera,
    world: World,
    overlays: OverlayManager<Panel>,
}

impl State {
    // Initialize the state
    async fn new(window: &Window, config: &SceneConfig) -> anyhow::Result<Self> {
        let size = window.window.inner_size();

        // Initialize the graphic context
        let ctx = GraphicsContext::new(&window.window).await?;

        // Starfield and placeholders, drawn until the models arrive
        let world = World::new(config, &mut rand::thread_rng());

        // The camera looks at the Earth
        let camera = Camera::new(
            config,
            world.earth_position(),
            ctx.config.width,
            ctx.config.height,
        );

        // Initialize the pass along with the scene lighting
        let pass = PhongPass::new(
            &PhongConfig::default(),
            &ctx.device,
            &ctx.queue,
            &ctx.config,
            &camera,
        );

        Ok(Self {
            ctx,
            pass,
            size,
            camera,
            world,
            overlays: create_overlays(),
        })
    }

    // Keeps state in sync with window size when changed
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.ctx.resize(new_size.width, new_size.height);
            // Make sure to current window size to depth texture - required for calc
            self.pass.resize(&self.ctx.device, &self.ctx.config);
            self.camera.set_viewport(new_size.width, new_size.height);
        }
    }

    fn click(&mut self, x: f64, y: f64) {
        picking::dispatch_click(
            &self.world,
            &self.camera,
            &self.overlays,
            (x, y),
            (self.size.width, self.size.height),
        );
    }

    fn scroll(&mut self, delta_y: f32) {
        self.world.scroll(delta_y);
    }

    fn load(&mut self, event: AssetEvent) {
        self.world.apply(event);
    }

    fn update(&mut self) {
        self.world.tick(now_ms());
        // Sync local app state with camera
        self.pass.update_camera(&self.ctx.queue, &self.camera);
    }

    // Primary render flow
    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.pass.draw(
            &self.ctx.surface,
            &self.ctx.device,
            &self.ctx.queue,
            &self.world.scene,
        )
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(start))]
pub async fn run() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            // Only fails when a logger is already installed
            let _ = console_log::init_with_level(log::Level::Info);
        } else {
            env_logger::init();
        }
    }

    if let Err(err) = start().await {
        log::error!("Couldn't start the scene: {:#}", err);
    }
}

async fn start() -> anyhow::Result<()> {
    let config = SceneConfig::default();
    let window = Window::new(&config)?;

    // State::new uses async code, so we're going to wait for it to finish
    let mut state = State::new(&window, &config).await?;

    // Placeholders are already in place, the models replace them as they arrive
    resources::request_models(&config, window.proxy());

    window.run(move |event, control_flow| match event {
        WindowEvents::Resized { width, height } => {
            state.resize(winit::dpi::PhysicalSize { width, height });
        }
        WindowEvents::Click { x, y } => state.click(x, y),
        WindowEvents::Wheel { delta_y } => state.scroll(delta_y),
        WindowEvents::Asset(event) => state.load(event),
        WindowEvents::Draw => {
            state.update();
            match state.render() {
                Ok(_) => {}
                // Reconfigure the surface if it's lost or outdated
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    state.resize(state.size)
                }
                // The system is out of memory, we should probably quit
                Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                Err(wgpu::SurfaceError::Timeout) => log::warn!("Surface timeout"),
            }
        }
    })
}
