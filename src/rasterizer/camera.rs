//! First-person camera driven by cursor deltas

use std::f32::consts::PI;
use super::math::{Mat4, Vec3};

/// Pitch stays just inside +/-90 degrees so direction and up never collapse
const PITCH_LIMIT: f32 = PI * 0.499;

/// Camera state
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    /// Unit view direction, derived from pitch/yaw
    pub direction: Vec3,
    pub up: Vec3,
    pub pitch: f32, // radians
    pub yaw: f32,
    pub sensitivity: f32,
    last_x: f32,
    last_y: f32,
}

impl Camera {
    /// Camera at `position` looking down +X with +Y up
    pub fn new(position: Vec3, sensitivity: f32) -> Self {
        Self {
            position,
            direction: Vec3::new(1.0, 0.0, 0.0),
            up: Vec3::UP,
            pitch: 0.0,
            yaw: 0.0,
            sensitivity,
            last_x: 0.0,
            last_y: 0.0,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.direction, self.up)
    }

    pub fn pos(&self) -> Vec3 {
        self.position
    }

    pub fn dir(&self) -> Vec3 {
        self.direction
    }

    pub fn move_forward(&mut self, d: f32) {
        self.position += self.direction * d;
    }

    pub fn move_side(&mut self, d: f32) {
        self.position += self.direction.cross(self.up) * d;
    }

    pub fn move_up(&mut self, d: f32) {
        self.position += self.up * d;
    }

    /// Seed the cursor position that the next [`Camera::rotate`] measures from
    pub fn reset(&mut self, x: f32, y: f32) {
        self.last_x = x;
        self.last_y = y;
    }

    /// Turn by the cursor movement since the last call (or `reset`)
    pub fn rotate(&mut self, x: f32, y: f32) {
        let dx = x - self.last_x;
        let dy = y - self.last_y;
        self.last_x = x;
        self.last_y = y;

        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw -= dx * self.sensitivity;
        self.update_basis();
    }

    /// Set absolute angles (radians) and rebuild the basis
    pub fn set_angles(&mut self, pitch: f32, yaw: f32) {
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw = yaw;
        self.update_basis();
    }

    // Up is taken from the same spherical parametrization rather than from
    // cross products, so it is only approximately orthogonal after rounding.
    fn update_basis(&mut self) {
        let (sp, cp) = self.pitch.sin_cos();
        let (sy, cy) = self.yaw.sin_cos();
        self.direction = Vec3::new(cy * cp, sp, sy * cp).normalize();
        self.up = Vec3::new(-cy * sp, cp, -sy * sp).normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.001)
    }
}
