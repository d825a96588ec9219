use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Context;
use winit::{
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

// Import from the library crate
use panview::config::ViewerConfig;
use panview::controller::frame_loop::default_target;
use panview::controller::input::{flip_y, material_button_from_key, PrimaryTouch};
use panview::controller::{InputEvent, InputSource, ViewerLoop};
use panview::logging;
use panview::model::SceneObject;
use panview::view::{AxisDisplay, SharedText, TextSink};

const FRAME_TIME: Duration = Duration::from_millis(16);

/// Browser-style key names for the keys the viewer cares about
fn key_name(code: KeyCode) -> Option<&'static str> {
    Some(match code {
        KeyCode::ArrowUp => "ArrowUp",
        KeyCode::ArrowDown => "ArrowDown",
        KeyCode::ArrowLeft => "ArrowLeft",
        KeyCode::ArrowRight => "ArrowRight",
        KeyCode::Space => " ",
        KeyCode::Escape => "Escape",
        KeyCode::Digit1 => "1",
        KeyCode::Digit2 => "2",
        KeyCode::Digit3 => "3",
        KeyCode::Digit4 => "4",
        KeyCode::Digit5 => "5",
        KeyCode::Digit6 => "6",
        KeyCode::Digit7 => "7",
        KeyCode::Digit8 => "8",
        KeyCode::Digit9 => "9",
        KeyCode::KeyW => "w",
        KeyCode::KeyA => "a",
        KeyCode::KeyS => "s",
        KeyCode::KeyD => "d",
        _ => return None,
    })
}

struct App {
    window: Window,
    size: PhysicalSize<u32>,
    viewer: ViewerLoop,
    target: Rc<RefCell<SceneObject>>,

    // HUD lines, shown in the window title
    axes: [SharedText; 3],
    title: String,

    // Input handling
    mouse_as_touch: bool,
    mouse_down: bool,
    cursor: PhysicalPosition<f64>,
    primary_touch: PrimaryTouch<u64>,

    last_frame_time: Instant,
}

impl App {
    fn new(window: Window, config: &ViewerConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let axes = [SharedText::new(), SharedText::new(), SharedText::new()];
        let display = AxisDisplay::with_widgets(
            axes.iter()
                .map(|t| Some(Box::new(t.clone()) as Box<dyn TextSink>))
                .collect(),
        );
        let target = Rc::new(RefCell::new(default_target(config)));
        let viewer = ViewerLoop::new(config, target.clone(), display, size.width, size.height)
            .context("invalid input bindings")?;

        Ok(Self {
            window,
            size,
            viewer,
            target,
            axes,
            title: String::new(),
            mouse_as_touch: config.input_source == InputSource::TouchDrag,
            mouse_down: false,
            cursor: PhysicalPosition::new(0.0, 0.0),
            primary_touch: PrimaryTouch::default(),
            last_frame_time: Instant::now(),
        })
    }

    fn send(&mut self, event: InputEvent) {
        self.viewer.handle_event(&event);
    }

    fn cursor_event(&self, make: fn(f32, f32) -> InputEvent) -> InputEvent {
        make(self.cursor.x as f32, flip_y(self.cursor.y as f32, self.size.height))
    }

    /// Returns true when the event was consumed as input
    fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent { state, physical_key: PhysicalKey::Code(code), repeat, .. },
                ..
            } => {
                let Some(name) = key_name(*code) else {
                    return false;
                };
                match state {
                    ElementState::Pressed if !*repeat => {
                        if let Some(index) = material_button_from_key(name) {
                            self.send(InputEvent::MaterialButton(index));
                        }
                        self.send(InputEvent::KeyDown(name.to_string()));
                    }
                    ElementState::Pressed => {}
                    ElementState::Released => self.send(InputEvent::KeyUp(name.to_string())),
                }
                true
            }
            WindowEvent::Touch(touch) => {
                let x = touch.location.x as f32;
                let y = flip_y(touch.location.y as f32, self.size.height);
                let event = match touch.phase {
                    TouchPhase::Started if self.primary_touch.begin(touch.id) => InputEvent::TouchStart { x, y },
                    TouchPhase::Moved if self.primary_touch.is_primary(touch.id) => InputEvent::TouchMove { x, y },
                    TouchPhase::Ended | TouchPhase::Cancelled if self.primary_touch.release(touch.id) => {
                        InputEvent::TouchEnd { x, y }
                    }
                    _ => return true,
                };
                self.send(event);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = *position;
                if self.mouse_as_touch && self.mouse_down {
                    let event = self.cursor_event(|x, y| InputEvent::TouchMove { x, y });
                    self.send(event);
                }
                true
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } if self.mouse_as_touch => {
                self.mouse_down = *state == ElementState::Pressed;
                let event = if self.mouse_down {
                    self.cursor_event(|x, y| InputEvent::TouchStart { x, y })
                } else {
                    self.cursor_event(|x, y| InputEvent::TouchEnd { x, y })
                };
                self.send(event);
                true
            }
            WindowEvent::Focused(false) => {
                self.mouse_down = false;
                self.send(InputEvent::FocusLost);
                true
            }
            WindowEvent::Occluded(occluded) => {
                self.send(InputEvent::VisibilityChanged { visible: !occluded });
                true
            }
            _ => false,
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.send(InputEvent::Resized { width: new_size.width, height: new_size.height });
        }
    }

    fn update(&mut self, dt: f32) {
        self.viewer.update(dt);
        self.refresh_title();
    }

    fn refresh_title(&mut self) {
        let mut parts: Vec<String> = self.axes.iter().map(SharedText::get).filter(|s| !s.is_empty()).collect();
        if let Some(material) = self.target.borrow().material() {
            parts.push(material.name.clone());
        }
        let title = format!("panview | {}", parts.join(" | "));
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets/viewer.json"));
    let (config, origin) = ViewerConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    logging::init(&config.log_level);
    tracing::info!("{}", origin);

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window_attributes = Window::default_attributes()
        .with_title("panview")
        .with_inner_size(LogicalSize::new(1280, 720));
    #[allow(deprecated)]
    let window = event_loop
        .create_window(window_attributes)
        .context("failed to create window")?;

    let mut app = App::new(window, &config)?;

    #[allow(deprecated)]
    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => {
                            app.resize(*physical_size);
                        }
                        WindowEvent::RedrawRequested => {
                            let now = Instant::now();
                            let dt = (now - app.last_frame_time).as_secs_f32();
                            app.last_frame_time = now;

                            app.update(dt);
                        }
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                // Nothing is drawn, so pace frames instead of spinning
                let next_frame = app.last_frame_time + FRAME_TIME;
                if Instant::now() >= next_frame {
                    app.window.request_redraw();
                }
                elwt.set_control_flow(ControlFlow::WaitUntil(next_frame));
            }
            _ => {}
        }
    })?;

    Ok(())
}
