use glam::{EulerRot, Quat, Vec2};

/// Coordinate frame a rotation is applied in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// Relative to the global axes
    World,
    /// Relative to the object's own current orientation
    Local,
}

/// Accumulated camera orientation in degrees.
///
/// Pitch is the rotation about the local horizontal axis, yaw about the
/// world vertical axis, roll about the view axis. Values are not wrapped,
/// so a full turn to the right reads as `yaw == 360.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Orientation {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Decompose a rotation into yaw-pitch-roll (Y, then X, then Z)
    pub fn from_rotation(rotation: Quat) -> Self {
        let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
        Self {
            pitch: pitch.to_degrees(),
            yaw: yaw.to_degrees(),
            roll: roll.to_degrees(),
        }
    }

    /// Yaw follows the horizontal input, pitch the inverted vertical input.
    pub fn pan(&mut self, delta: Vec2, speed: f32) {
        self.yaw += delta.x * speed;
        self.pitch += -delta.y * speed;
    }

    /// Axis values in display order: X (pitch), Y (yaw), Z (roll)
    pub fn axes(&self) -> [f32; 3] {
        [self.pitch, self.yaw, self.roll]
    }
}
