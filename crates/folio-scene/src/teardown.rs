//! Unmount from outside the app
//!
//! The host holds a [`TeardownSignal`] clone. Once it is raised the next
//! frame disposes every avatar controller, then the viewport session, and
//! drops the app to reactive updates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bevy::prelude::*;
use bevy::winit::WinitSettings;
use tracing::info;

use crate::avatar::Avatar;
use crate::viewport::ViewportSession;

#[derive(Resource, Clone, Default, Debug)]
pub struct TeardownSignal(Arc<AtomicBool>);

impl TeardownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct TeardownPlugin;

impl Plugin for TeardownPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TeardownSignal>()
            .add_systems(Last, teardown_on_signal);
    }
}

fn teardown_on_signal(
    mut commands: Commands,
    signal: Res<TeardownSignal>,
    session: Option<Res<ViewportSession>>,
    mut avatars: Query<&mut Avatar>,
    winit_settings: Option<ResMut<WinitSettings>>,
) {
    if !signal.is_requested() {
        return;
    }
    let Some(session) = session else { return };

    for mut avatar in &mut avatars {
        avatar.controller_mut().dispose();
    }
    session.dispose(&mut commands);

    if let Some(mut winit_settings) = winit_settings {
        *winit_settings = WinitSettings::desktop_app();
    }
    info!("Avatar scene torn down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_is_shared() {
        let signal = TeardownSignal::new();
        let host = signal.clone();
        assert!(!signal.is_requested());
        host.request();
        assert!(signal.is_requested());
    }
}
