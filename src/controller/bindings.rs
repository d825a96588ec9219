//! Declarative action map: physical controls resolved into named logical actions.
//!
//! The table is built from an [`ActionMapConfig`], which mirrors the layout of
//! an `.inputactions` JSON asset (camelCase keys, Unity-style control paths), so
//! existing action assets load without conversion.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::input::InputState;

pub const PAN: &str = "Pan";
pub const TOUCH_PRESS: &str = "TouchPress";
pub const TOUCH_POSITION: &str = "TouchPosition";

/// Errors raised while building an action map
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("action '{0}' is declared more than once")]
    DuplicateAction(String),

    #[error("action '{action}' binds unknown control '{path}'")]
    UnknownControl { action: String, path: String },

    #[error("action '{action}' uses unknown composite '{path}'")]
    UnknownComposite { action: String, path: String },

    #[error("action '{action}' has composite part '{part}' that is not up, down, left or right")]
    UnknownPart { action: String, part: String },

    #[error("action '{action}' has composite part '{part}' without a composite before it")]
    OrphanPart { action: String, part: String },

    #[error("action map '{map}' has no action named '{action}'")]
    MissingAction { map: String, action: String },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Continuous value with start/perform/cancel tracking
    Value,
    /// On/off control
    Button,
    /// Every control change is forwarded as `performed`
    PassThrough,
}

/// How a `2DVector` composite combines its four digital parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMode {
    /// Diagonals are scaled to unit length
    #[default]
    DigitalNormalized,
    /// Each axis is -1, 0 or 1 independently
    Digital,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingConfig {
    #[serde(default)]
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub interactions: String,
    #[serde(default)]
    pub groups: String,
    #[serde(default)]
    pub is_composite: bool,
    #[serde(default)]
    pub is_part_of_composite: bool,
}

impl BindingConfig {
    pub fn control(path: &str) -> Self {
        Self {
            name: String::new(),
            path: path.to_string(),
            interactions: String::new(),
            groups: String::new(),
            is_composite: false,
            is_part_of_composite: false,
        }
    }

    pub fn composite(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            is_composite: true,
            ..Self::control(path)
        }
    }

    pub fn part(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            is_part_of_composite: true,
            ..Self::control(path)
        }
    }

    pub fn with_interactions(mut self, interactions: &str) -> Self {
        self.interactions = interactions.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub expected_control_type: String,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequirement {
    pub device_path: String,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default, rename = "isOR")]
    pub is_or: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlScheme {
    pub name: String,
    pub binding_group: String,
    #[serde(default)]
    pub devices: Vec<DeviceRequirement>,
}

impl ControlScheme {
    fn requiring(name: &str, devices: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            binding_group: name.to_string(),
            devices: devices
                .iter()
                .map(|path| DeviceRequirement {
                    device_path: path.to_string(),
                    is_optional: false,
                    is_or: false,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMapConfig {
    pub name: String,
    pub actions: Vec<ActionConfig>,
    #[serde(default)]
    pub control_schemes: Vec<ControlScheme>,
    #[serde(default)]
    pub composite_mode: CompositeMode,
}

impl Default for ActionMapConfig {
    /// The viewer's `Player` map: arrow-key pan plus primary touch press/position
    fn default() -> Self {
        Self {
            name: "Player".to_string(),
            actions: vec![
                ActionConfig {
                    name: PAN.to_string(),
                    kind: ActionKind::Value,
                    expected_control_type: "Vector2".to_string(),
                    bindings: vec![
                        BindingConfig::composite("2D Vector", "2DVector"),
                        BindingConfig::part("up", "<Keyboard>/upArrow"),
                        BindingConfig::part("down", "<Keyboard>/downArrow"),
                        BindingConfig::part("left", "<Keyboard>/leftArrow"),
                        BindingConfig::part("right", "<Keyboard>/rightArrow"),
                    ],
                },
                ActionConfig {
                    name: TOUCH_PRESS.to_string(),
                    kind: ActionKind::PassThrough,
                    expected_control_type: String::new(),
                    bindings: vec![
                        BindingConfig::control("<Touchscreen>/primaryTouch/press").with_interactions("Press"),
                    ],
                },
                ActionConfig {
                    name: TOUCH_POSITION.to_string(),
                    kind: ActionKind::PassThrough,
                    expected_control_type: "Vector2".to_string(),
                    bindings: vec![BindingConfig::control("<Touchscreen>/primaryTouch/position")],
                },
            ],
            control_schemes: vec![
                ControlScheme::requiring("Keyboard&Mouse", &["<Keyboard>", "<Mouse>"]),
                ControlScheme::requiring("Gamepad", &["<Gamepad>"]),
                ControlScheme::requiring("Touch", &["<Touchscreen>"]),
                ControlScheme::requiring("Joystick", &["<Joystick>"]),
                ControlScheme::requiring("XR", &["<XRController>"]),
            ],
            composite_mode: CompositeMode::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved controls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Control {
    Key(String),
    TouchPress,
    TouchPosition,
}

impl Control {
    fn parse(path: &str) -> Option<Self> {
        match path {
            "<Touchscreen>/primaryTouch/press" | "<Touchscreen>/press" => Some(Control::TouchPress),
            "<Touchscreen>/primaryTouch/position" | "<Touchscreen>/position" => Some(Control::TouchPosition),
            _ => path.strip_prefix("<Keyboard>/").and_then(key_name).map(Control::Key),
        }
    }

    fn read(&self, input: &InputState) -> ActionValue {
        match self {
            Control::Key(key) => ActionValue::Button(input.is_key_pressed(key)),
            Control::TouchPress => ActionValue::Button(input.touch.pressed),
            Control::TouchPosition => ActionValue::Vector2(input.touch.position),
        }
    }

    fn is_pressed(&self, input: &InputState) -> bool {
        self.read(input).is_actuated()
    }
}

/// Keyboard control name to the browser key name the input layer records
fn key_name(control: &str) -> Option<String> {
    let name = match control {
        "upArrow" => "ArrowUp",
        "downArrow" => "ArrowDown",
        "leftArrow" => "ArrowLeft",
        "rightArrow" => "ArrowRight",
        "space" => " ",
        "enter" => "Enter",
        "escape" => "Escape",
        "tab" => "Tab",
        "leftShift" | "rightShift" | "shift" => "Shift",
        "leftCtrl" | "rightCtrl" | "ctrl" => "Control",
        single if single.len() == 1 && single.chars().all(|c| c.is_ascii_alphanumeric()) => {
            return Some(single.to_ascii_lowercase());
        }
        _ => return None,
    };
    Some(name.to_string())
}

#[derive(Debug, Clone, Default)]
struct Vector2Composite {
    up: Vec<Control>,
    down: Vec<Control>,
    left: Vec<Control>,
    right: Vec<Control>,
}

impl Vector2Composite {
    fn read(&self, input: &InputState, mode: CompositeMode) -> Vec2 {
        let pressed = |controls: &[Control]| -> f32 {
            if controls.iter().any(|c| c.is_pressed(input)) { 1.0 } else { 0.0 }
        };
        let value = Vec2::new(
            pressed(&self.right[..]) - pressed(&self.left[..]),
            pressed(&self.up[..]) - pressed(&self.down[..]),
        );
        match mode {
            CompositeMode::DigitalNormalized => value.normalize_or_zero(),
            CompositeMode::Digital => value,
        }
    }
}

#[derive(Debug, Clone)]
enum Source {
    Control(Control),
    Vector2(Vector2Composite),
}

impl Source {
    fn read(&self, input: &InputState, mode: CompositeMode) -> ActionValue {
        match self {
            Source::Control(control) => control.read(input),
            Source::Vector2(composite) => ActionValue::Vector2(composite.read(input, mode)),
        }
    }

    fn default_value(&self) -> ActionValue {
        match self {
            Source::Control(Control::TouchPosition) | Source::Vector2(_) => ActionValue::Vector2(Vec2::ZERO),
            Source::Control(_) => ActionValue::Button(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Current value of an action
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionValue {
    Button(bool),
    Vector2(Vec2),
}

impl ActionValue {
    pub fn is_actuated(&self) -> bool {
        match self {
            ActionValue::Button(pressed) => *pressed,
            ActionValue::Vector2(v) => *v != Vec2::ZERO,
        }
    }

    /// Vector reading; buttons read as zero
    pub fn as_vec2(&self) -> Vec2 {
        match self {
            ActionValue::Vector2(v) => *v,
            ActionValue::Button(_) => Vec2::ZERO,
        }
    }

    fn magnitude(&self) -> f32 {
        match self {
            ActionValue::Button(pressed) => if *pressed { 1.0 } else { 0.0 },
            ActionValue::Vector2(v) => v.length(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionPhase {
    Started,
    Performed,
    Canceled,
}

const ALL_PHASES: [ActionPhase; 3] = [ActionPhase::Started, ActionPhase::Performed, ActionPhase::Canceled];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Action {
    name: String,
    kind: ActionKind,
    press_interaction: bool,
    sources: Vec<Source>,
    default: ActionValue,
    value: ActionValue,
}

impl Action {
    fn build(config: &ActionConfig) -> Result<Self, BindingError> {
        let mut sources = Vec::new();
        let mut composite: Option<usize> = None;

        for binding in &config.bindings {
            if binding.is_composite {
                if !matches!(binding.path.as_str(), "2DVector" | "Dpad") {
                    return Err(BindingError::UnknownComposite {
                        action: config.name.clone(),
                        path: binding.path.clone(),
                    });
                }
                sources.push(Source::Vector2(Vector2Composite::default()));
                composite = Some(sources.len() - 1);
                continue;
            }

            let control = Control::parse(&binding.path).ok_or_else(|| BindingError::UnknownControl {
                action: config.name.clone(),
                path: binding.path.clone(),
            })?;

            if binding.is_part_of_composite {
                let Some(Source::Vector2(parts)) = composite.and_then(|i| sources.get_mut(i)) else {
                    return Err(BindingError::OrphanPart {
                        action: config.name.clone(),
                        part: binding.name.clone(),
                    });
                };
                let slot = match binding.name.to_ascii_lowercase().as_str() {
                    "up" => &mut parts.up,
                    "down" => &mut parts.down,
                    "left" => &mut parts.left,
                    "right" => &mut parts.right,
                    _ => {
                        return Err(BindingError::UnknownPart {
                            action: config.name.clone(),
                            part: binding.name.clone(),
                        })
                    }
                };
                slot.push(control);
            } else {
                composite = None;
                sources.push(Source::Control(control));
            }
        }

        let default = sources
            .first()
            .map(Source::default_value)
            .unwrap_or(ActionValue::Button(false));

        Ok(Self {
            name: config.name.clone(),
            kind: config.kind,
            press_interaction: config
                .bindings
                .iter()
                .any(|b| b.interactions.split(',').any(|i| i.trim().starts_with("Press"))),
            sources,
            default,
            value: default,
        })
    }

    /// Strongest reading across all sources; the default when nothing is actuated
    fn evaluate(&self, input: &InputState, mode: CompositeMode) -> ActionValue {
        self.sources
            .iter()
            .map(|s| s.read(input, mode))
            .filter(ActionValue::is_actuated)
            .fold(None, |best: Option<ActionValue>, v| match best {
                Some(b) if b.magnitude() >= v.magnitude() => Some(b),
                _ => Some(v),
            })
            .unwrap_or(self.default)
    }

    /// Store the new value and report which phases it triggers
    fn transition(&mut self, value: ActionValue) -> Vec<ActionPhase> {
        let previous = std::mem::replace(&mut self.value, value);
        if self.kind == ActionKind::PassThrough && !self.press_interaction {
            return if value != previous { vec![ActionPhase::Performed] } else { Vec::new() };
        }

        match (previous.is_actuated(), value.is_actuated()) {
            (false, true) => vec![ActionPhase::Started, ActionPhase::Performed],
            (true, true) if self.kind == ActionKind::Value && value != previous => vec![ActionPhase::Performed],
            (true, false) => vec![ActionPhase::Canceled],
            _ => Vec::new(),
        }
    }
}

/// What a callback sees when an action fires
pub struct CallbackContext<'a> {
    pub action: &'a str,
    pub phase: ActionPhase,
    /// Host time in seconds of the `process` call that fired the event
    pub time: f64,
    value: ActionValue,
    actions: &'a [Action],
}

impl CallbackContext<'_> {
    pub fn read_value(&self) -> ActionValue {
        self.value
    }

    /// Current value of another action in the same map
    pub fn read_action(&self, name: &str) -> Option<ActionValue> {
        self.actions.iter().find(|a| a.name == name).map(|a| a.value)
    }
}

/// Handler wired to all three phases of every `Player` action
pub trait PlayerActions {
    fn on_pan(&mut self, context: &CallbackContext<'_>);
    fn on_touch_press(&mut self, context: &CallbackContext<'_>);
    fn on_touch_position(&mut self, context: &CallbackContext<'_>);
}

#[derive(Debug, Clone, Copy)]
enum HandlerMethod {
    Pan,
    TouchPress,
    TouchPosition,
}

type Callback = Box<dyn FnMut(&CallbackContext<'_>)>;

struct Listener {
    id: ListenerId,
    phase: ActionPhase,
    callback: Callback,
}

pub struct InputBindingTable {
    name: String,
    actions: Vec<Action>,
    listeners: Vec<Vec<Listener>>,
    control_schemes: Vec<ControlScheme>,
    composite_mode: CompositeMode,
    enabled: bool,
    next_listener: u64,
    /// Subscriptions owned by the current `set_callbacks` handler
    handler_listeners: Vec<(ActionId, ListenerId)>,
    last_time: f64,
}

impl InputBindingTable {
    pub fn new(config: &ActionMapConfig) -> Result<Self, BindingError> {
        let mut actions: Vec<Action> = Vec::with_capacity(config.actions.len());
        for action_config in &config.actions {
            if actions.iter().any(|a| a.name == action_config.name) {
                return Err(BindingError::DuplicateAction(action_config.name.clone()));
            }
            actions.push(Action::build(action_config)?);
        }

        info!("Action map '{}' loaded with {} actions", config.name, actions.len());

        Ok(Self {
            name: config.name.clone(),
            listeners: actions.iter().map(|_| Vec::new()).collect(),
            actions,
            control_schemes: config.control_schemes.clone(),
            composite_mode: config.composite_mode,
            enabled: false,
            next_listener: 0,
            handler_listeners: Vec::new(),
            last_time: 0.0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self, name: &str) -> Option<ActionId> {
        self.actions.iter().position(|a| a.name == name).map(ActionId)
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.name.as_str())
    }

    pub fn read_value(&self, action: ActionId) -> Option<ActionValue> {
        self.actions.get(action.0).map(|a| a.value)
    }

    pub fn control_schemes(&self) -> &[ControlScheme] {
        &self.control_schemes
    }

    pub fn control_scheme(&self, name: &str) -> Option<&ControlScheme> {
        self.control_schemes.iter().find(|s| s.name == name)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        if !self.enabled {
            debug!("Action map '{}' enabled", self.name);
        }
        self.enabled = true;
    }

    /// Cancel every actuated action, reset values and stop processing
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        let mut events = Vec::new();
        for (index, action) in self.actions.iter_mut().enumerate() {
            let was_actuated = action.value.is_actuated();
            action.value = action.default;
            if was_actuated {
                events.push((index, ActionPhase::Canceled));
            }
        }
        self.dispatch(&events, self.last_time);
        self.enabled = false;
        debug!("Action map '{}' disabled", self.name);
    }

    pub fn subscribe(
        &mut self,
        action: ActionId,
        phase: ActionPhase,
        callback: impl FnMut(&CallbackContext<'_>) + 'static,
    ) -> Option<ListenerId> {
        let listeners = self.listeners.get_mut(action.0)?;
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        listeners.push(Listener { id, phase, callback: Box::new(callback) });
        Some(id)
    }

    pub fn unsubscribe(&mut self, action: ActionId, id: ListenerId) -> bool {
        let Some(listeners) = self.listeners.get_mut(action.0) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self, action: ActionId) -> usize {
        self.listeners.get(action.0).map_or(0, Vec::len)
    }

    /// Replace the handler wired to `Pan`, `TouchPress` and `TouchPosition`.
    ///
    /// Every subscription of the previous handler is removed first; passing
    /// `None` only removes. On error nothing changes.
    pub fn set_callbacks(&mut self, handler: Option<Rc<RefCell<dyn PlayerActions>>>) -> Result<(), BindingError> {
        let wiring = [
            (self.require(PAN)?, HandlerMethod::Pan),
            (self.require(TOUCH_PRESS)?, HandlerMethod::TouchPress),
            (self.require(TOUCH_POSITION)?, HandlerMethod::TouchPosition),
        ];

        for (action, id) in std::mem::take(&mut self.handler_listeners) {
            self.unsubscribe(action, id);
        }

        let Some(handler) = handler else {
            debug!("Callbacks cleared on action map '{}'", self.name);
            return Ok(());
        };

        for (action, method) in wiring {
            for phase in ALL_PHASES {
                let handler = handler.clone();
                let subscribed = self.subscribe(action, phase, move |ctx| {
                    let mut handler = handler.borrow_mut();
                    match method {
                        HandlerMethod::Pan => handler.on_pan(ctx),
                        HandlerMethod::TouchPress => handler.on_touch_press(ctx),
                        HandlerMethod::TouchPosition => handler.on_touch_position(ctx),
                    }
                });
                if let Some(id) = subscribed {
                    self.handler_listeners.push((action, id));
                }
            }
        }
        debug!("Callbacks registered on action map '{}'", self.name);
        Ok(())
    }

    /// Resolve every action against the raw input, then fire callbacks.
    /// All values are updated before the first callback runs.
    pub fn process(&mut self, input: &InputState, time: f64) {
        self.last_time = time;
        if !self.enabled {
            return;
        }

        let mut events = Vec::new();
        for (index, action) in self.actions.iter_mut().enumerate() {
            let value = action.evaluate(input, self.composite_mode);
            events.extend(action.transition(value).into_iter().map(|phase| (index, phase)));
        }
        self.dispatch(&events, time);
    }

    fn dispatch(&mut self, events: &[(usize, ActionPhase)], time: f64) {
        for &(index, phase) in events {
            let action = &self.actions[index];
            trace!("{} {:?} {:?}", action.name, phase, action.value);
            let context = CallbackContext {
                action: &action.name,
                phase,
                time,
                value: action.value,
                actions: &self.actions,
            };
            for listener in self.listeners[index].iter_mut().filter(|l| l.phase == phase) {
                (listener.callback)(&context);
            }
        }
    }

    fn require(&self, name: &str) -> Result<ActionId, BindingError> {
        self.action(name).ok_or_else(|| BindingError::MissingAction {
            map: self.name.clone(),
            action: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::InputEvent;

    fn player() -> InputBindingTable {
        let mut table = InputBindingTable::new(&ActionMapConfig::default()).unwrap();
        table.enable();
        table
    }

    fn key_down(input: &mut InputState, key: &str) {
        input.process_event(&InputEvent::KeyDown(key.to_string()));
    }

    fn key_up(input: &mut InputState, key: &str) {
        input.process_event(&InputEvent::KeyUp(key.to_string()));
    }

    /// Records every callback as "<method> <phase>"
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl PlayerActions for Recorder {
        fn on_pan(&mut self, ctx: &CallbackContext<'_>) {
            self.calls.push(format!("pan {:?}", ctx.phase));
        }
        fn on_touch_press(&mut self, ctx: &CallbackContext<'_>) {
            self.calls.push(format!("press {:?}", ctx.phase));
        }
        fn on_touch_position(&mut self, ctx: &CallbackContext<'_>) {
            self.calls.push(format!("position {:?}", ctx.phase));
        }
    }

    #[test]
    fn arrow_keys_form_a_normalized_vector() {
        let mut table = player();
        let pan = table.action(PAN).unwrap();
        let mut input = InputState::new();

        key_down(&mut input, "ArrowRight");
        table.process(&input, 0.0);
        assert_eq!(table.read_value(pan), Some(ActionValue::Vector2(Vec2::X)));

        key_down(&mut input, "ArrowUp");
        table.process(&input, 0.1);
        let v = table.read_value(pan).unwrap().as_vec2();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!(v.x > 0.0 && v.y > 0.0);

        // Opposite keys cancel out
        key_down(&mut input, "ArrowLeft");
        key_down(&mut input, "ArrowDown");
        table.process(&input, 0.2);
        assert_eq!(table.read_value(pan), Some(ActionValue::Vector2(Vec2::ZERO)));
    }

    #[test]
    fn digital_mode_keeps_diagonals_unscaled() {
        let config = ActionMapConfig {
            composite_mode: CompositeMode::Digital,
            ..ActionMapConfig::default()
        };
        let mut table = InputBindingTable::new(&config).unwrap();
        table.enable();
        let mut input = InputState::new();
        key_down(&mut input, "ArrowUp");
        key_down(&mut input, "ArrowLeft");
        table.process(&input, 0.0);
        assert_eq!(table.read_value(table.action(PAN).unwrap()), Some(ActionValue::Vector2(Vec2::new(-1.0, 1.0))));
    }

    #[test]
    fn value_action_phases() {
        let mut table = player();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        table.set_callbacks(Some(recorder.clone())).unwrap();
        let mut input = InputState::new();

        key_down(&mut input, "ArrowUp");
        table.process(&input, 0.0);
        // Holding the key without change fires nothing
        table.process(&input, 0.1);
        key_down(&mut input, "ArrowRight");
        table.process(&input, 0.2);
        key_up(&mut input, "ArrowUp");
        key_up(&mut input, "ArrowRight");
        table.process(&input, 0.3);

        assert_eq!(
            recorder.borrow().calls,
            vec!["pan Started", "pan Performed", "pan Performed", "pan Canceled"]
        );
    }

    #[test]
    fn touch_press_fires_press_phases_and_position_passes_through() {
        let mut table = player();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        table.set_callbacks(Some(recorder.clone())).unwrap();
        let mut input = InputState::new();

        input.process_event(&InputEvent::TouchStart { x: 100.0, y: 50.0 });
        table.process(&input, 0.0);
        input.process_event(&InputEvent::TouchEnd { x: 100.0, y: 50.0 });
        table.process(&input, 0.1);

        assert_eq!(
            recorder.borrow().calls,
            vec!["press Started", "press Performed", "position Performed", "press Canceled"]
        );
    }

    #[test]
    fn callbacks_can_read_other_actions() {
        let mut table = player();
        let press = table.action(TOUCH_PRESS).unwrap();
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        table.subscribe(press, ActionPhase::Started, move |ctx| {
            *sink.borrow_mut() = ctx.read_action(TOUCH_POSITION);
        });

        let mut input = InputState::new();
        input.process_event(&InputEvent::TouchStart { x: 12.0, y: 34.0 });
        table.process(&input, 0.0);

        // Position was updated before the press callback ran
        assert_eq!(*seen.borrow(), Some(ActionValue::Vector2(Vec2::new(12.0, 34.0))));
    }

    #[test]
    fn replacing_callbacks_removes_old_subscriptions() {
        let mut table = player();
        let pan = table.action(PAN).unwrap();
        let first = Rc::new(RefCell::new(Recorder::default()));
        let second = Rc::new(RefCell::new(Recorder::default()));

        table.set_callbacks(Some(first.clone())).unwrap();
        assert_eq!(table.listener_count(pan), 3);
        table.set_callbacks(Some(second.clone())).unwrap();
        assert_eq!(table.listener_count(pan), 3);

        let mut input = InputState::new();
        key_down(&mut input, "ArrowDown");
        table.process(&input, 0.0);

        assert!(first.borrow().calls.is_empty());
        assert_eq!(second.borrow().calls, vec!["pan Started", "pan Performed"]);

        table.set_callbacks(None).unwrap();
        for name in [PAN, TOUCH_PRESS, TOUCH_POSITION] {
            assert_eq!(table.listener_count(table.action(name).unwrap()), 0);
        }
    }

    #[test]
    fn manual_subscriptions_survive_handler_swap() {
        let mut table = player();
        let pan = table.action(PAN).unwrap();
        let id = table.subscribe(pan, ActionPhase::Performed, |_| {}).unwrap();
        table.set_callbacks(Some(Rc::new(RefCell::new(Recorder::default())))).unwrap();
        table.set_callbacks(None).unwrap();
        assert_eq!(table.listener_count(pan), 1);
        assert!(table.unsubscribe(pan, id));
        assert!(!table.unsubscribe(pan, id));
    }

    #[test]
    fn disabled_table_is_silent_and_disable_cancels() {
        let mut table = player();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        table.set_callbacks(Some(recorder.clone())).unwrap();
        let mut input = InputState::new();

        key_down(&mut input, "ArrowLeft");
        table.process(&input, 0.0);
        table.disable();
        assert!(!table.is_enabled());
        table.process(&input, 0.1);

        assert_eq!(recorder.borrow().calls, vec!["pan Started", "pan Performed", "pan Canceled"]);

        // Re-enabling with the key still held starts the action again
        table.enable();
        table.process(&input, 0.2);
        assert_eq!(recorder.borrow().calls.len(), 5);
    }

    #[test]
    fn control_schemes_are_queryable() {
        let table = player();
        assert_eq!(table.control_schemes().len(), 5);
        let touch = table.control_scheme("Touch").unwrap();
        assert_eq!(touch.devices[0].device_path, "<Touchscreen>");
        assert!(table.control_scheme("Wheel").is_none());
    }

    #[test]
    fn invalid_maps_are_rejected() {
        let mut config = ActionMapConfig::default();
        config.actions.push(config.actions[0].clone());
        assert!(matches!(InputBindingTable::new(&config), Err(BindingError::DuplicateAction(_))));

        let mut config = ActionMapConfig::default();
        config.actions[2].bindings[0].path = "<Mouse>/position".into();
        assert!(matches!(InputBindingTable::new(&config), Err(BindingError::UnknownControl { .. })));

        let mut config = ActionMapConfig::default();
        config.actions[0].bindings.remove(0);
        assert!(matches!(InputBindingTable::new(&config), Err(BindingError::OrphanPart { .. })));

        let mut config = ActionMapConfig::default();
        config.actions[0].bindings[1].name = "forward".into();
        assert!(matches!(InputBindingTable::new(&config), Err(BindingError::UnknownPart { .. })));

        let mut config = ActionMapConfig::default();
        config.actions[0].bindings[0].path = "1DAxis".into();
        assert!(matches!(InputBindingTable::new(&config), Err(BindingError::UnknownComposite { .. })));
    }

    #[test]
    fn callbacks_need_all_player_actions() {
        let mut config = ActionMapConfig::default();
        config.actions.retain(|a| a.name != TOUCH_POSITION);
        let mut table = InputBindingTable::new(&config).unwrap();
        let err = table.set_callbacks(Some(Rc::new(RefCell::new(Recorder::default())))).unwrap_err();
        assert!(matches!(err, BindingError::MissingAction { .. }));
    }

    #[test]
    fn loads_inputactions_json() {
        let json = r#"{
            "name": "Player",
            "actions": [
                {
                    "name": "Pan",
                    "type": "Value",
                    "expectedControlType": "Vector2",
                    "bindings": [
                        { "name": "2D Vector", "path": "2DVector", "isComposite": true },
                        { "name": "up", "path": "<Keyboard>/w", "isPartOfComposite": true },
                        { "name": "down", "path": "<Keyboard>/s", "isPartOfComposite": true },
                        { "name": "left", "path": "<Keyboard>/a", "isPartOfComposite": true },
                        { "name": "right", "path": "<Keyboard>/d", "isPartOfComposite": true }
                    ]
                }
            ],
            "controlSchemes": [
                { "name": "Touch", "bindingGroup": "Touch",
                  "devices": [ { "devicePath": "<Touchscreen>", "isOptional": false, "isOR": false } ] }
            ]
        }"#;
        let config: ActionMapConfig = serde_json::from_str(json).unwrap();
        let mut table = InputBindingTable::new(&config).unwrap();
        table.enable();

        let mut input = InputState::new();
        key_down(&mut input, "d");
        table.process(&input, 0.0);
        assert_eq!(table.read_value(table.action(PAN).unwrap()), Some(ActionValue::Vector2(Vec2::X)));
        assert_eq!(table.control_scheme("Touch").unwrap().binding_group, "Touch");
    }
}
