use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use tracing::{debug, info, trace};

use super::bindings::{ActionPhase, CallbackContext, PlayerActions, TOUCH_POSITION};
use super::frame_loop::FrameContext;
use super::input::InputSource;
use crate::config::CameraSettings;
use crate::model::{Camera, Orientation, Space};
use crate::view::{AxisDisplay, DisplayBuffer};

/// Field of view after applying the startup scale factor
pub fn scaled_fov(base_fov: f32, scale: f32) -> f32 {
    base_fov * scale
}

/// Reduce a touch position to a pan direction: -1 left of / below the screen
/// centre, +1 right of / above it, 0 only exactly on it.
///
/// The centre uses integer halving of the screen size, so an 801 px wide
/// screen has its centre at x = 400.
pub fn touch_direction(position: Vec2, screen_size: (u32, u32)) -> Vec2 {
    let axis = |value: f32, extent: u32| {
        let center = (extent / 2) as f32;
        if value > center {
            1.0
        } else if value < center {
            -1.0
        } else {
            0.0
        }
    };
    Vec2::new(axis(position.x, screen_size.0), axis(position.y, screen_size.1))
}

/// Rotates a camera from pan input and mirrors its orientation to text widgets
pub struct CameraOrientationController {
    camera: Option<Rc<RefCell<Camera>>>,
    input_source: InputSource,
    fov_scale: f32,
    rotation_speed: f32,
    hud_enabled: bool,
    orientation: Orientation,
    display: AxisDisplay,
    buffer: DisplayBuffer,
    screen_size: (u32, u32),
}

impl CameraOrientationController {
    pub fn new(settings: &CameraSettings, input_source: InputSource, hud_enabled: bool) -> Self {
        Self {
            camera: None,
            input_source,
            fov_scale: settings.fov_scale,
            rotation_speed: settings.rotation_speed,
            hud_enabled,
            orientation: Orientation::default(),
            display: AxisDisplay::new(),
            buffer: DisplayBuffer::default(),
            screen_size: (0, 0),
        }
    }

    pub fn attach_camera(&mut self, camera: Rc<RefCell<Camera>>) {
        self.orientation = Orientation::from_rotation(camera.borrow().rotation);
        self.camera = Some(camera);
    }

    pub fn with_display(mut self, display: AxisDisplay) -> Self {
        self.display = display;
        self
    }

    pub fn input_source(&self) -> InputSource {
        self.input_source
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn display_buffer(&self) -> &DisplayBuffer {
        &self.buffer
    }

    pub fn field_of_view(&self) -> Option<f32> {
        self.camera.as_ref().map(|c| c.borrow().field_of_view)
    }

    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.screen_size = (width, height);
        if let Some(camera) = &self.camera {
            camera.borrow_mut().set_aspect(width, height);
        }
    }

    /// Scale the camera's default field of view and reveal the HUD widgets
    pub fn initialize(&mut self) {
        if self.hud_enabled {
            self.display.show_all();
        }

        let Some(camera) = &self.camera else {
            debug!("No camera attached, skipping field of view setup");
            return;
        };
        let mut camera = camera.borrow_mut();
        let base_fov = camera.field_of_view;
        camera.field_of_view = scaled_fov(base_fov, self.fov_scale);
        info!(
            "Camera field of view {} -> {} (scale {})",
            base_fov, camera.field_of_view, self.fov_scale
        );
    }

    /// Yaw by `delta.x * speed` around the world vertical axis, then pitch by
    /// `-delta.y * speed` around the camera's own horizontal axis.
    pub fn on_pan_input(&mut self, delta: Vec2) {
        let Some(camera) = &self.camera else {
            return;
        };
        let speed = self.rotation_speed;
        {
            let mut camera = camera.borrow_mut();
            camera.rotate(0.0, delta.x * speed, 0.0, Space::World);
            camera.rotate(-delta.y * speed, 0.0, 0.0, Space::Local);
        }
        self.orientation.pan(delta, speed);
    }

    pub fn on_touch_input(&mut self, position: Vec2) {
        let direction = touch_direction(position, self.screen_size);
        trace!("Touch at {:?} pans {:?}", position, direction);
        self.on_pan_input(direction);
    }

    /// Refresh the axis strings and push them to the widgets
    pub fn tick(&mut self, frame: &FrameContext) {
        if !self.hud_enabled || self.camera.is_none() {
            return;
        }
        self.buffer = DisplayBuffer::from_orientation(&self.orientation);
        self.display.write(&self.buffer);
        trace!("Frame {} HUD {:?}", frame.frame, self.buffer.lines());
    }
}

impl PlayerActions for CameraOrientationController {
    fn on_pan(&mut self, context: &CallbackContext<'_>) {
        // Skip `started`; the paired `performed` applies the value
        if self.input_source == InputSource::KeyboardAxis && context.phase != ActionPhase::Started {
            self.on_pan_input(context.read_value().as_vec2());
        }
    }

    fn on_touch_press(&mut self, context: &CallbackContext<'_>) {
        if self.input_source == InputSource::TouchDrag && context.phase == ActionPhase::Started {
            let position = context
                .read_action(TOUCH_POSITION)
                .map(|v| v.as_vec2())
                .unwrap_or(Vec2::ZERO);
            self.on_touch_input(position);
        }
    }

    fn on_touch_position(&mut self, _context: &CallbackContext<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::bindings::{ActionMapConfig, InputBindingTable};
    use crate::controller::input::{InputEvent, InputState};
    use crate::view::{SharedText, TextSink};

    fn widget(text: &SharedText) -> Option<Box<dyn TextSink>> {
        Some(Box::new(text.clone()))
    }

    fn settings(fov_scale: f32, rotation_speed: f32) -> CameraSettings {
        CameraSettings { fov_scale, rotation_speed, ..CameraSettings::default() }
    }

    fn controller(source: InputSource, speed: f32) -> (CameraOrientationController, Rc<RefCell<Camera>>) {
        let camera = Rc::new(RefCell::new(Camera::new(800, 600)));
        let mut controller = CameraOrientationController::new(&settings(1.0, speed), source, true);
        controller.attach_camera(camera.clone());
        controller.set_screen_size(800, 600);
        (controller, camera)
    }

    fn frame() -> FrameContext {
        FrameContext { frame: 1, dt: 0.016, time: 0.016 }
    }

    #[test]
    fn fov_is_scaled_once_at_startup() {
        for (scale, expected) in [(0.5, 30.0), (0.0, 0.0), (2.0, 120.0)] {
            let camera = Rc::new(RefCell::new(Camera::new(800, 600).with_field_of_view(60.0)));
            let mut controller = CameraOrientationController::new(&settings(scale, 1.0), InputSource::KeyboardAxis, false);
            controller.attach_camera(camera.clone());
            controller.initialize();
            assert_eq!(camera.borrow().field_of_view, expected);
        }
        assert_eq!(scaled_fov(60.0, 0.5), 30.0);
    }

    #[test]
    fn missing_camera_is_ignored() {
        let text = SharedText::new();
        let mut controller = CameraOrientationController::new(&settings(0.5, 1.0), InputSource::KeyboardAxis, true)
            .with_display(AxisDisplay::with_widgets(vec![widget(&text)]));
        controller.initialize();
        controller.on_pan_input(Vec2::new(1.0, 1.0));
        controller.tick(&frame());

        assert_eq!(controller.orientation(), Orientation::default());
        assert_eq!(controller.field_of_view(), None);
        assert_eq!(text.get(), "");
    }

    #[test]
    fn pan_changes_yaw_and_pitch_by_scaled_delta() {
        let (mut controller, camera) = controller(InputSource::KeyboardAxis, 2.5);
        controller.on_pan_input(Vec2::new(2.0, 0.0));
        controller.on_pan_input(Vec2::new(0.0, 4.0));
        let before = controller.orientation();
        controller.on_pan_input(Vec2::new(1.0, -1.0));
        let after = controller.orientation();

        assert_eq!(after.yaw - before.yaw, 2.5);
        assert_eq!(after.pitch - before.pitch, 2.5);
        assert_eq!(after.roll, 0.0);

        // The camera itself carries the same rotation
        let actual = Orientation::from_rotation(camera.borrow().rotation);
        assert!((actual.yaw - after.yaw).abs() < 1e-3);
        assert!((actual.pitch - after.pitch).abs() < 1e-3);
    }

    #[test]
    fn touch_dead_zone_is_a_single_point() {
        let screen = (800, 600);
        assert_eq!(touch_direction(Vec2::new(400.0, 300.0), screen), Vec2::ZERO);
        assert_eq!(touch_direction(Vec2::new(399.0, 300.0), screen).x, -1.0);
        assert_eq!(touch_direction(Vec2::new(401.0, 300.0), screen).x, 1.0);
        assert_eq!(touch_direction(Vec2::new(400.0, 299.0), screen).y, -1.0);
        assert_eq!(touch_direction(Vec2::new(400.0, 301.0), screen).y, 1.0);
        // Odd sizes round the centre down
        assert_eq!(touch_direction(Vec2::new(400.0, 300.0), (801, 601)), Vec2::ZERO);
    }

    #[test]
    fn touch_input_rotates_towards_the_touched_half() {
        let (mut controller, _camera) = controller(InputSource::TouchDrag, 3.0);
        controller.on_touch_input(Vec2::new(700.0, 100.0));
        let o = controller.orientation();
        assert_eq!(o.yaw, 3.0);
        // Below centre pitches up
        assert_eq!(o.pitch, 3.0);
    }

    #[test]
    fn tick_writes_clamped_axes() {
        let x = SharedText::new();
        let y = SharedText::new();
        let z = SharedText::new();
        let (controller, _camera) = controller(InputSource::KeyboardAxis, 10.0);
        let mut controller =
            controller.with_display(AxisDisplay::with_widgets(vec![widget(&x), widget(&y), widget(&z)]));

        controller.on_pan_input(Vec2::new(-1.0, -0.5));
        controller.tick(&frame());

        assert_eq!(x.get(), "X: 5");
        assert_eq!(y.get(), "Y: 0");
        assert_eq!(z.get(), "Z: 0");
        assert_eq!(controller.display_buffer().lines()[1], "Y: 0");
        assert_eq!(controller.orientation().yaw, -10.0);
    }

    #[test]
    fn hud_disabled_leaves_widgets_alone() {
        let x = SharedText::new();
        let camera = Rc::new(RefCell::new(Camera::new(800, 600)));
        let mut controller = CameraOrientationController::new(&settings(1.0, 1.0), InputSource::KeyboardAxis, false)
            .with_display(AxisDisplay::with_widgets(vec![widget(&x)]));
        controller.attach_camera(camera);
        controller.on_pan_input(Vec2::X);
        controller.tick(&frame());
        assert_eq!(x.get(), "");
    }

    fn wired(source: InputSource) -> (InputBindingTable, Rc<RefCell<CameraOrientationController>>) {
        let (controller, _camera) = controller(source, 1.0);
        let controller = Rc::new(RefCell::new(controller));
        let mut table = InputBindingTable::new(&ActionMapConfig::default()).unwrap();
        table.set_callbacks(Some(controller.clone())).unwrap();
        table.enable();
        (table, controller)
    }

    #[test]
    fn keyboard_source_rotates_once_per_key_change() {
        let (mut table, controller) = wired(InputSource::KeyboardAxis);
        let mut input = InputState::new();

        input.process_event(&InputEvent::KeyDown("ArrowRight".into()));
        for t in 0..5 {
            table.process(&input, t as f64);
        }
        input.process_event(&InputEvent::KeyUp("ArrowRight".into()));
        table.process(&input, 5.0);

        assert_eq!(controller.borrow().orientation().yaw, 1.0);

        // Touch is ignored on the keyboard path
        input.process_event(&InputEvent::TouchStart { x: 10.0, y: 10.0 });
        table.process(&input, 6.0);
        assert_eq!(controller.borrow().orientation().yaw, 1.0);
    }

    #[test]
    fn touch_source_rotates_on_press_only() {
        let (mut table, controller) = wired(InputSource::TouchDrag);
        let mut input = InputState::new();

        input.process_event(&InputEvent::TouchStart { x: 100.0, y: 500.0 });
        table.process(&input, 0.0);
        input.process_event(&InputEvent::TouchMove { x: 700.0, y: 500.0 });
        table.process(&input, 0.1);
        input.process_event(&InputEvent::TouchEnd { x: 700.0, y: 500.0 });
        table.process(&input, 0.2);

        let o = controller.borrow().orientation();
        assert_eq!(o.yaw, -1.0);
        assert_eq!(o.pitch, -1.0);

        // Arrow keys are ignored on the touch path
        input.process_event(&InputEvent::KeyDown("ArrowLeft".into()));
        table.process(&input, 0.3);
        assert_eq!(controller.borrow().orientation().yaw, -1.0);
    }
}
