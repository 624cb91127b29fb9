use winit::{
    event::*,
    event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy},
    window,
};

use crate::{config::SceneConfig, resources::AssetEvent};

/// Events posted to the loop from outside winit
#[derive(Debug)]
pub enum AppEvent {
    Asset(AssetEvent),
}

pub enum WindowEvents {
    Resized {
        width: u32,
        height: u32,
    },
    /// Left button released at a canvas pixel
    Click {
        x: f64,
        y: f64,
    },
    /// Wheel moved, as a DOM `deltaY`
    Wheel {
        delta_y: f32,
    },
    Asset(AssetEvent),
    Draw,
}

/// Wheel movement as the DOM's `deltaY`: positive when scrolling down, in CSS
/// pixels or in lines, whichever unit the device reports.
///
/// winit flips the sign and scales pixel deltas by `scale_factor`, both are undone here.
pub fn wheel_delta_y(delta: &MouseScrollDelta, scale_factor: f64) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y,
        MouseScrollDelta::PixelDelta(position) => {
            -position.to_logical::<f64>(scale_factor).y as f32
        }
    }
}

pub struct Window {
    event_loop: EventLoop<AppEvent>,
    pub window: window::Window,
}

impl Window {
    pub fn new(config: &SceneConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoopBuilder::<AppEvent>::with_user_event().build();
        let window = window::WindowBuilder::new()
            .with_title(&config.title)
            .build(&event_loop)?;

        #[cfg(target_arch = "wasm32")]
        web::mount(&window, &config.mount_id)?;

        Ok(Self { event_loop, window })
    }

    /// Handle for posting [`AppEvent`]s from other tasks
    pub fn proxy(&self) -> EventLoopProxy<AppEvent> {
        self.event_loop.create_proxy()
    }

    pub fn run(
        self,
        mut callback: impl 'static + FnMut(WindowEvents, &mut ControlFlow),
    ) -> ! {
        let Self { event_loop, window } = self;
        // Clicks carry no position in winit, so remember the last one
        let mut cursor = (0.0, 0.0);
        #[cfg(target_arch = "wasm32")]
        let mut browser_size = None;

        event_loop.run(move |event, _, control_flow| {
            match event {
                Event::WindowEvent {
                    ref event,
                    window_id,
                } if window_id == window.id() => {
                    // Handle window events (like resizing, or mouse inputs)
                    // This is stuff from `winit` -- see their docs for more info
                    match event {
                        WindowEvent::CloseRequested
                        | WindowEvent::KeyboardInput {
                            input:
                                KeyboardInput {
                                    state: ElementState::Pressed,
                                    virtual_keycode: Some(VirtualKeyCode::Escape),
                                    ..
                                },
                            ..
                        } => *control_flow = ControlFlow::Exit,
                        WindowEvent::Resized(physical_size) => callback(
                            WindowEvents::Resized {
                                width: physical_size.width,
                                height: physical_size.height,
                            },
                            control_flow,
                        ),
                        WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                            // new_inner_size is &&mut so w have to dereference it twice
                            callback(
                                WindowEvents::Resized {
                                    width: new_inner_size.width,
                                    height: new_inner_size.height,
                                },
                                control_flow,
                            )
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            cursor = (position.x, position.y);
                        }
                        WindowEvent::MouseInput {
                            state: ElementState::Released,
                            button: MouseButton::Left,
                            ..
                        } => callback(
                            WindowEvents::Click {
                                x: cursor.0,
                                y: cursor.1,
                            },
                            control_flow,
                        ),
                        WindowEvent::MouseWheel { delta, .. } => callback(
                            WindowEvents::Wheel {
                                delta_y: wheel_delta_y(delta, window.scale_factor()),
                            },
                            control_flow,
                        ),
                        _ => {}
                    }
                }
                Event::UserEvent(AppEvent::Asset(asset)) => {
                    callback(WindowEvents::Asset(asset), control_flow)
                }
                Event::RedrawRequested(window_id) if window_id == window.id() => {
                    callback(WindowEvents::Draw, control_flow);
                }
                Event::MainEventsCleared => {
                    #[cfg(target_arch = "wasm32")]
                    {
                        if let Some(size) = web::follow_browser_size(&window, &mut browser_size) {
                            callback(
                                WindowEvents::Resized {
                                    width: size.width,
                                    height: size.height,
                                },
                                control_flow,
                            );
                        }
                    }
                    // RedrawRequested will only trigger once, unless we manually
                    // request it.
                    window.request_redraw();
                }
                _ => {}
            }
        })
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use anyhow::anyhow;
    use winit::{
        dpi::{LogicalSize, PhysicalSize},
        platform::web::WindowExtWebSys,
        window::Window,
    };

    /// Appends the canvas to the element with `mount_id`, or the body when there is none
    pub fn mount(window: &Window, mount_id: &str) -> anyhow::Result<()> {
        let document = web_sys::window()
            .and_then(|win| win.document())
            .ok_or_else(|| anyhow!("No document to draw into"))?;
        let parent = match document.get_element_by_id(mount_id) {
            Some(element) => element,
            None => {
                log::warn!("No element with id {}, using the body", mount_id);
                let body = document
                    .body()
                    .ok_or_else(|| anyhow!("Document has no body"))?;
                web_sys::Element::from(body)
            }
        };
        let canvas = web_sys::Element::from(window.canvas());
        parent
            .append_child(&canvas)
            .map_err(|e| anyhow!("Couldn't append canvas to the page: {:?}", e))?;
        Ok(())
    }

    fn browser_size() -> Option<(f64, f64)> {
        let win = web_sys::window()?;
        let width = win.inner_width().ok()?.as_f64()?;
        let height = win.inner_height().ok()?.as_f64()?;
        Some((width, height))
    }

    /// Winit prevents sizing with CSS, so the canvas is resized by hand
    /// whenever the browser window changed. Returns the new physical size.
    pub fn follow_browser_size(
        window: &Window,
        last: &mut Option<(f64, f64)>,
    ) -> Option<PhysicalSize<u32>> {
        let size = browser_size()?;
        if *last == Some(size) {
            return None;
        }
        *last = Some(size);
        window.set_inner_size(LogicalSize::new(size.0, size.1));
        Some(window.inner_size())
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use winit::dpi::{LogicalPosition, PhysicalPosition};

    use super::*;
    use crate::world::World;

    /// What winit hands over for a DOM wheel event in pixel mode
    fn pixel_wheel(delta_y: f64, scale_factor: f64) -> MouseScrollDelta {
        MouseScrollDelta::PixelDelta(LogicalPosition::new(0.0, -delta_y).to_physical(scale_factor))
    }

    #[test]
    fn test_wheel_down_is_positive() {
        // winit reports scrolling down as a negative y
        assert_eq!(wheel_delta_y(&MouseScrollDelta::LineDelta(0.0, -1.0), 1.0), 1.0);
        assert_eq!(
            wheel_delta_y(&MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -53.0)), 1.0),
            53.0
        );
        assert_eq!(wheel_delta_y(&MouseScrollDelta::LineDelta(3.0, 0.5), 1.0), -0.5);
    }

    #[test]
    fn test_pixel_wheel_ignores_device_pixel_ratio() {
        for scale_factor in [1.0, 1.5, 2.0, 3.0] {
            let delta_y = wheel_delta_y(&pixel_wheel(1000.0, scale_factor), scale_factor);
            assert!((delta_y - 1000.0).abs() < 1e-3, "{} at {}", delta_y, scale_factor);
        }
    }

    #[test]
    fn test_line_wheel_passes_line_count() {
        // Line mode deltaY is the number of lines, whatever the scale factor
        assert_eq!(wheel_delta_y(&MouseScrollDelta::LineDelta(0.0, -3.0), 2.0), 3.0);
    }

    #[test]
    fn test_wheel_turns_orbit_by_delta_y() {
        let config = SceneConfig {
            star_count: 10,
            ..Default::default()
        };
        let mut world = World::new(&config, &mut StdRng::seed_from_u64(1));

        world.scroll(wheel_delta_y(&pixel_wheel(1000.0, 2.0), 2.0));
        assert!((world.orbit_angle() - 1.0).abs() < 1e-6);

        world.scroll(wheel_delta_y(&MouseScrollDelta::LineDelta(0.0, -3.0), 2.0));
        assert!((world.orbit_angle() - 1.003).abs() < 1e-6);
    }
}
