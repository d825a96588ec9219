use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use super::bindings::{BindingError, InputBindingTable};
use super::camera_controller::CameraOrientationController;
use super::input::{InputEvent, InputState};
use super::material_swapper::MaterialSwapper;
use crate::config::ViewerConfig;
use crate::model::{Camera, MeshRenderer, SceneObject};
use crate::view::AxisDisplay;

/// Per-frame timing handed to `tick`
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameContext {
    pub frame: u64,
    /// Seconds since the previous frame
    pub dt: f32,
    /// Seconds since the loop started
    pub time: f64,
}

/// The object the swap buttons act on, showing the first palette material
pub fn default_target(config: &ViewerConfig) -> SceneObject {
    let material = config.materials.first().cloned().unwrap_or_default();
    SceneObject::new("Model").with_renderer(MeshRenderer::new(material))
}

/// Main viewer state: raw input, action map, camera controller and material swapper
pub struct ViewerLoop {
    pub camera: Rc<RefCell<Camera>>,
    pub controller: Rc<RefCell<CameraOrientationController>>,
    pub bindings: InputBindingTable,
    pub input_state: InputState,
    pub swapper: MaterialSwapper,
    frame: u64,
    time: f64,
}

impl ViewerLoop {
    /// Build everything from config and run the controller's one-time setup
    pub fn new(
        config: &ViewerConfig,
        target: Rc<RefCell<SceneObject>>,
        display: AxisDisplay,
        width: u32,
        height: u32,
    ) -> Result<Self, BindingError> {
        for warning in config.camera.range_warnings() {
            warn!("{}", warning);
        }

        let camera = Rc::new(RefCell::new(
            Camera::new(width, height).with_field_of_view(config.camera.base_fov),
        ));

        let mut controller =
            CameraOrientationController::new(&config.camera, config.input_source, config.hud.enabled)
                .with_display(display);
        controller.attach_camera(camera.clone());
        controller.set_screen_size(width, height);
        let controller = Rc::new(RefCell::new(controller));

        let mut bindings = InputBindingTable::new(&config.bindings)?;
        bindings.set_callbacks(Some(controller.clone()))?;

        controller.borrow_mut().initialize();
        bindings.enable();

        let swapper = MaterialSwapper::new(target).with_palette(config.materials.clone());

        info!(
            "Viewer ready: {:?} input, {} materials, {}x{}",
            config.input_source,
            swapper.palette().len(),
            width,
            height
        );

        Ok(Self {
            camera,
            controller,
            bindings,
            input_state: InputState::new(),
            swapper,
            frame: 0,
            time: 0.0,
        })
    }

    /// Device events are resolved into actions as they arrive, so a press
    /// and release within one frame still fire their callbacks in order.
    pub fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::MaterialButton(index) => self.swapper.press_button(*index),
            InputEvent::Resized { width, height } => {
                debug!("Resized to {}x{}", width, height);
                self.controller.borrow_mut().set_screen_size(*width, *height);
            }
            _ => {
                self.input_state.process_event(event);
                self.bindings.process(&self.input_state, self.time);
            }
        }
    }

    /// Catch up on actions re-enabled since the last event, then refresh the HUD
    pub fn update(&mut self, dt: f32) {
        self.frame += 1;
        self.time += dt as f64;

        self.bindings.process(&self.input_state, self.time);

        let frame = FrameContext { frame: self.frame, dt, time: self.time };
        self.controller.borrow_mut().tick(&frame);
    }

    /// Toggle input handling, like enabling or disabling the viewer component
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.bindings.enable();
        } else {
            self.bindings.disable();
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}
