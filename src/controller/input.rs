/// Platform-agnostic input handling system
use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Platform-independent input events.
///
/// Touch positions are in screen pixels with the origin at the bottom-left
/// corner; hosts with a top-left origin flip y before sending.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events, named like browser `KeyboardEvent.key` values
    KeyDown(String),
    KeyUp(String),

    // Primary touch
    TouchStart { x: f32, y: f32 },
    TouchMove { x: f32, y: f32 },
    TouchEnd { x: f32, y: f32 },

    // UI
    MaterialButton(usize),

    // Window events
    Resized { width: u32, height: u32 },
    FocusLost,
    VisibilityChanged { visible: bool },
}

/// Which physical path drives the camera. Exactly one is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// Arrow keys combined into one 2D axis
    #[default]
    KeyboardAxis,
    /// Tap a screen half to pan towards it
    TouchDrag,
}

/// State of the primary touch contact
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TouchState {
    pub pressed: bool,
    pub position: Vec2,
}

/// Raw device state the binding table reads from
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub pressed_keys: HashSet<String>,
    pub touch: TouchState,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                self.pressed_keys.insert(key.clone());
            }
            InputEvent::KeyUp(key) => {
                self.pressed_keys.remove(key.as_str());
            }
            InputEvent::TouchStart { x, y } => {
                self.touch = TouchState { pressed: true, position: Vec2::new(*x, *y) };
            }
            InputEvent::TouchMove { x, y } => {
                self.touch.position = Vec2::new(*x, *y);
            }
            InputEvent::TouchEnd { x, y } => {
                self.touch = TouchState { pressed: false, position: Vec2::new(*x, *y) };
            }
            InputEvent::FocusLost | InputEvent::VisibilityChanged { visible: false } => {
                self.clear();
            }
            _ => {}
        }
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }

    /// Drop held keys and release the touch, keeping its last position
    pub fn clear(&mut self) {
        self.pressed_keys.clear();
        self.touch.pressed = false;
    }
}

/// Follows the one finger that drives the primary touch; other fingers are ignored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimaryTouch<Id> {
    finger: Option<Id>,
}

impl<Id> Default for PrimaryTouch<Id> {
    fn default() -> Self {
        Self { finger: None }
    }
}

impl<Id: Copy + PartialEq> PrimaryTouch<Id> {
    /// Claims the primary slot when it is free
    pub fn begin(&mut self, id: Id) -> bool {
        match self.finger {
            Some(finger) => finger == id,
            None => {
                self.finger = Some(id);
                true
            }
        }
    }

    pub fn is_primary(&self, id: Id) -> bool {
        self.finger == Some(id)
    }

    /// Frees the slot if `id` holds it
    pub fn release(&mut self, id: Id) -> bool {
        let primary = self.is_primary(id);
        if primary {
            self.finger = None;
        }
        primary
    }
}

/// Convert a top-left-origin y coordinate to the bottom-left origin used by touch events
pub fn flip_y(y: f32, height: u32) -> f32 {
    height as f32 - y
}

/// Map a material button key ("1".."9") to its palette index
pub fn material_button_from_key(key: &str) -> Option<usize> {
    match key {
        "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9" => {
            key.parse::<usize>().ok().map(|n| n - 1)
        }
        _ => None,
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, Touch, TouchEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let key = e.key();
        if is_down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        }
    }

    fn changed_touches(e: &TouchEvent) -> impl Iterator<Item = Touch> {
        let list = e.changed_touches();
        (0..list.length()).filter_map(move |i| list.get(i))
    }

    /// Touch position in bottom-left-origin pixels
    fn position(touch: &Touch, height: u32) -> (f32, f32) {
        (touch.client_x() as f32, flip_y(touch.client_y() as f32, height))
    }

    pub fn touch_start_to_input(e: &TouchEvent, height: u32, primary: &mut PrimaryTouch<i32>) -> Option<InputEvent> {
        let touch = changed_touches(e).find(|t| primary.begin(t.identifier()))?;
        let (x, y) = position(&touch, height);
        Some(InputEvent::TouchStart { x, y })
    }

    pub fn touch_move_to_input(e: &TouchEvent, height: u32, primary: &mut PrimaryTouch<i32>) -> Option<InputEvent> {
        let touch = changed_touches(e).find(|t| primary.is_primary(t.identifier()))?;
        let (x, y) = position(&touch, height);
        Some(InputEvent::TouchMove { x, y })
    }

    pub fn touch_end_to_input(e: &TouchEvent, height: u32, primary: &mut PrimaryTouch<i32>) -> Option<InputEvent> {
        let touch = changed_touches(e).find(|t| primary.release(t.identifier()))?;
        let (x, y) = position(&touch, height);
        Some(InputEvent::TouchEnd { x, y })
    }
}
