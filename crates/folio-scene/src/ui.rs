//! Loading overlay
//!
//! A centered "Loading Model" label with a progress bar, shown until the
//! avatar's first state is entered. After a failed load it stays up with
//! the last percentage reached.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use folio_core::{AvatarController, ControllerEvent, ListenerId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorState {
    pub visible: bool,
    pub percent: u8,
    pub failed: bool,
}

impl IndicatorState {
    fn apply(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Progress(percent) => self.percent = *percent,
            ControllerEvent::StateChanged(_) => self.visible = false,
            ControllerEvent::LoadFailed(_) => self.failed = true,
            ControllerEvent::Disposed => self.visible = false,
        }
    }

    pub fn fraction(&self) -> f32 {
        f32::from(self.percent.min(100)) / 100.0
    }
}

/// Overlay state, fed by a controller listener
#[derive(Resource, Clone, Default)]
pub struct LoadIndicator(Arc<Mutex<IndicatorState>>);

impl LoadIndicator {
    /// Sync with `controller` and follow its events from now on
    pub fn attach(&self, controller: &mut AvatarController) -> Option<ListenerId> {
        if let Ok(mut state) = self.0.lock() {
            *state = IndicatorState {
                visible: controller.shows_loading_indicator(),
                percent: controller.progress().percent(),
                failed: false,
            };
        }
        let shared = Arc::clone(&self.0);
        controller.subscribe(move |event| {
            if let Ok(mut state) = shared.lock() {
                state.apply(event);
            }
        })
    }

    pub fn snapshot(&self) -> IndicatorState {
        self.0.lock().map(|state| *state).unwrap_or_default()
    }
}

pub struct LoadingOverlayPlugin;

impl Plugin for LoadingOverlayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LoadIndicator>()
            .add_systems(EguiPrimaryContextPass, loading_overlay);
    }
}

fn loading_overlay(mut contexts: EguiContexts, indicator: Res<LoadIndicator>) {
    let state = indicator.snapshot();
    if !state.visible {
        return;
    }
    let Ok(ctx) = contexts.ctx_mut() else { return };

    egui::Area::new(egui::Id::new("avatar-loading"))
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("Loading Model").size(18.0).strong());
                    ui.add_space(6.0);
                    ui.add(
                        egui::ProgressBar::new(state.fraction())
                            .desired_width(192.0)
                            .show_percentage(),
                    );
                });
            });
        });
}
