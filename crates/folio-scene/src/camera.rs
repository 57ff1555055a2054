//! Orbit camera around the avatar
//!
//! The polar angle is fixed by the profile, so dragging only swings the
//! camera around the vertical axis. Zoom and pan are off unless the
//! profile enables them. Motion is damped towards the drag target.

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;

use folio_core::CameraFraming;

/// Marker component for the avatar camera
#[derive(Component)]
pub struct MainCamera;

/// Orbit controller settings, built from the profile's framing on mount
#[derive(Debug, Clone, Resource)]
pub struct OrbitSettings {
    pub azimuth: f32,
    pub target_azimuth: f32,
    /// Angle from the vertical axis, never changed by input
    pub polar_angle: f32,
    pub distance: f32,
    pub target_distance: f32,
    /// Minimum distance, also the initial one
    pub min_distance: f32,
    pub max_distance: f32,
    pub target: Vec3,
    pub target_focus: Vec3,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
    pub enable_zoom: bool,
    pub enable_pan: bool,
}

impl OrbitSettings {
    pub fn from_framing(framing: &CameraFraming) -> Self {
        let target = Vec3::from_array(framing.target);
        Self {
            azimuth: framing.azimuth,
            target_azimuth: framing.azimuth,
            polar_angle: framing.polar_angle,
            distance: framing.distance,
            target_distance: framing.distance,
            min_distance: framing.distance,
            max_distance: framing.distance * 3.0,
            target,
            target_focus: target,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: framing.damping,
            enable_zoom: framing.enable_zoom,
            enable_pan: framing.enable_pan,
        }
    }

    /// Camera position for the current (smoothed) orbit
    pub fn eye(&self) -> Vec3 {
        let horizontal = self.distance * self.polar_angle.sin();
        self.target
            + Vec3::new(
                horizontal * self.azimuth.sin(),
                self.distance * self.polar_angle.cos(),
                horizontal * self.azimuth.cos(),
            )
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(self.target, Vec3::Y)
    }

    /// Ease current values towards their targets for a frame of `dt` seconds
    pub fn smooth(&mut self, dt: f32) {
        let lerp_factor = 1.0 - (-self.smooth_factor * 60.0 * dt).exp();
        self.azimuth += (self.target_azimuth - self.azimuth) * lerp_factor;
        self.distance += (self.target_distance - self.distance) * lerp_factor;
        self.target += (self.target_focus - self.target) * lerp_factor;
    }

    pub fn zoom(&mut self, amount: f32) {
        if !self.enable_zoom {
            return;
        }
        let zoom_factor = 1.0 - amount * self.zoom_speed;
        self.target_distance =
            (self.target_distance * zoom_factor).clamp(self.min_distance, self.max_distance);
    }

    /// Shift the focus in the camera's screen plane
    pub fn pan(&mut self, delta: Vec2) {
        if !self.enable_pan {
            return;
        }
        let right = Vec3::new(self.azimuth.cos(), 0.0, -self.azimuth.sin());
        let pan_speed = self.distance * 0.002;
        self.target_focus -= right * delta.x * pan_speed;
        self.target_focus += Vec3::Y * delta.y * pan_speed;
    }
}

pub struct OrbitCameraPlugin;

impl Plugin for OrbitCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_camera);
    }
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    settings: Option<ResMut<OrbitSettings>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    time: Res<Time>,
    mut contexts: bevy_egui::EguiContexts,
) {
    // Nothing mounted
    let Some(mut settings) = settings else { return };

    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);

    if !egui_wants_pointer {
        let motion = mouse_motion.delta;
        if mouse_button.pressed(MouseButton::Left) {
            settings.target_azimuth -= motion.x * settings.sensitivity;
        }
        if mouse_button.pressed(MouseButton::Right) {
            settings.pan(motion);
        }
        if mouse_scroll.delta.y != 0.0 {
            settings.zoom(mouse_scroll.delta.y);
        }

        if touch_input.iter().count() == 1 {
            for touch in touch_input.iter() {
                let delta = touch.delta();
                if delta != Vec2::ZERO {
                    settings.target_azimuth -= delta.x * settings.sensitivity;
                }
            }
        }
    }

    settings.smooth(time.delta_secs());

    if let Ok(mut transform) = camera_query.single_mut() {
        *transform = settings.transform();
    }
}
