use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

use crate::engine::xr::session::SessionManager;

/// Orbit state around the model.
///
/// Left drag orbits, right drag pans, the wheel zooms.
#[derive(Component, Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Horizontal angle in radians.
    pub yaw: f32,
    /// Vertical angle in radians, clamped short of the poles.
    pub pitch: f32,
    pub orbit_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 5.0,
            yaw: 0.0,
            pitch: 0.35,
            orbit_speed: 0.005,
            pan_speed: 0.0015,
            zoom_speed: 0.1,
            min_distance: 0.5,
            max_distance: 50.0,
        }
    }
}

const PITCH_LIMIT: f32 = 1.55;

impl OrbitCamera {
    pub fn position(&self) -> Vec3 {
        let horizontal = self.distance * self.pitch.cos();
        self.target
            + Vec3::new(
                horizontal * self.yaw.sin(),
                self.distance * self.pitch.sin(),
                horizontal * self.yaw.cos(),
            )
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * self.orbit_speed;
        self.pitch = (self.pitch + delta.y * self.orbit_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn pan(&mut self, delta: Vec2) {
        let forward = (self.target - self.position()).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        let scale = self.pan_speed * self.distance;
        self.target += right * (-delta.x * scale) + up * (delta.y * scale);
    }

    pub fn zoom(&mut self, scroll: f32) {
        self.distance =
            (self.distance * (1.0 - scroll * self.zoom_speed)).clamp(self.min_distance, self.max_distance);
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }
}

/// Mouse input for orbit cameras. Suspended while an AR session drives the view.
pub fn orbit_camera_input(
    mut cameras: Query<&mut OrbitCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    session: Res<SessionManager>,
) {
    let delta: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();
    let scroll: f32 = scroll_events
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y * 0.05,
        })
        .sum();

    if !session.is_idle() {
        return;
    }

    for mut camera in &mut cameras {
        if mouse_button.pressed(MouseButton::Left) && delta != Vec2::ZERO {
            camera.orbit(delta);
        }
        if mouse_button.pressed(MouseButton::Right) && delta != Vec2::ZERO {
            camera.pan(delta);
        }
        if scroll.abs() > f32::EPSILON {
            camera.zoom(scroll);
        }
    }
}

pub fn update_orbit_cameras(
    mut cameras: Query<(&OrbitCamera, &mut Transform), Changed<OrbitCamera>>,
) {
    for (camera, mut transform) in &mut cameras {
        *transform = camera.transform();
    }
}
