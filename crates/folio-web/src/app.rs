//! Bevy application setup

use bevy::prelude::*;
use bevy::winit::WinitSettings;
use bevy_egui::EguiPlugin;
use bevy_picking::{prelude::MeshPickingPlugin, DefaultPickingPlugins};

use folio_scene::{AvatarConfig, AvatarScenePlugin, AvatarSourcePlugin, TeardownSignal};

/// Run the Bevy application.
///
/// On the web the winit runner hands the event loop to the browser and
/// returns right away.
pub fn run(canvas: &str, config: AvatarConfig, teardown: TeardownSignal) {
    App::new()
        .insert_resource(ClearColor(Color::NONE))
        .insert_resource(WinitSettings::default())
        .insert_resource(config)
        .insert_resource(teardown)
        // Must come before DefaultPlugins so the asset server picks up `avatar://`
        .add_plugins(AvatarSourcePlugin)
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Folio".to_string(),
                        canvas: Some(canvas.to_string()),
                        fit_canvas_to_parent: true,
                        prevent_default_event_handling: false,
                        transparent: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    // The avatar comes through our own download, nothing has .meta files
                    meta_check: bevy::asset::AssetMetaCheck::Never,
                    ..default()
                }),
        )
        // These must be added BEFORE EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .add_plugins(AvatarScenePlugin)
        .run();
}
