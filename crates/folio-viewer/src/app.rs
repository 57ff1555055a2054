//! Bevy application setup for the desktop preview

use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy::winit::WinitSettings;
use bevy_egui::EguiPlugin;
use bevy_picking::{prelude::MeshPickingPlugin, DefaultPickingPlugins};

use folio_scene::{AvatarConfig, AvatarScenePlugin, AvatarSourcePlugin, TeardownSignal};

use crate::config::ViewerConfig;

/// Run the viewer until its window closes
pub fn run(viewer: &ViewerConfig, avatar: AvatarConfig) -> AppExit {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.12, 0.12, 0.14)))
        .insert_resource(WinitSettings::default())
        .insert_resource(avatar)
        .insert_resource(TeardownSignal::new())
        // Must come before DefaultPlugins so the asset server picks up `avatar://`
        .add_plugins(AvatarSourcePlugin)
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: viewer.title.clone(),
                        resolution: WindowResolution::new(viewer.width, viewer.height),
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    meta_check: bevy::asset::AssetMetaCheck::Never,
                    ..default()
                }),
        )
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .add_plugins(AvatarScenePlugin)
        .add_systems(Update, unmount_on_escape)
        .run()
}

/// Escape tears the scene down the same way the web handle does
fn unmount_on_escape(keyboard: Res<ButtonInput<KeyCode>>, teardown: Res<TeardownSignal>) {
    if keyboard.just_pressed(KeyCode::Escape) && !teardown.is_requested() {
        tracing::info!("Escape pressed, unmounting avatar");
        teardown.request();
    }
}
