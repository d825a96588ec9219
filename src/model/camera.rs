use glam::{EulerRot, Quat, Vec3};

use super::orientation::Space;

/// Default vertical field of view in degrees
pub const DEFAULT_FOV: f32 = 60.0;

pub struct Camera {
    pub rotation: Quat,
    /// Vertical field of view in degrees
    pub field_of_view: f32,
    pub aspect: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            field_of_view: DEFAULT_FOV,
            aspect: aspect_ratio(width, height),
        }
    }

    pub fn with_field_of_view(mut self, degrees: f32) -> Self {
        self.field_of_view = degrees;
        self
    }

    pub fn forward(&self) -> Vec3 {
        (self.rotation * Vec3::NEG_Z).normalize()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Rotate by euler angles in degrees (yaw about Y, pitch about X, roll about Z).
    /// World-space rotations are applied before the current rotation, local-space after it.
    pub fn rotate(&mut self, pitch: f32, yaw: f32, roll: f32, space: Space) {
        let delta = Quat::from_euler(
            EulerRot::YXZ,
            yaw.to_radians(),
            pitch.to_radians(),
            roll.to_radians(),
        );
        self.rotation = match space {
            Space::World => delta * self.rotation,
            Space::Local => self.rotation * delta,
        }
        .normalize();
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 { 1.0 } else { width as f32 / height as f32 }
}
