//! Folio Scene - Bevy side of the avatar centerpiece
//!
//! This crate mounts the avatar into a Bevy app used by both the browser
//! build (folio-web) and the desktop preview (folio-viewer):
//! - Explicitly owned viewport session (camera, lights, pedestal)
//! - Damped orbit camera with a fixed polar angle
//! - Asset download with byte progress, decoded through an in-memory source
//! - Animation cross-fades driven by the folio-core controller
//! - Ray-cast click detection on the avatar geometry
//! - Loading overlay

pub mod avatar;
pub mod camera;
pub mod download;
pub mod picking;
pub mod teardown;
pub mod ui;
pub mod viewport;

use bevy::asset::io::memory::{Dir, MemoryAssetReader};
use bevy::asset::io::AssetSource;
use bevy::prelude::*;

use folio_core::AvatarProfile;

/// Asset source the downloaded avatar bytes are published to
pub const AVATAR_SOURCE: &str = "avatar";

/// What to mount and where its bytes come from
#[derive(Debug, Clone, Resource)]
pub struct AvatarConfig {
    pub profile: AvatarProfile,
    /// URL prefix (web) or directory (native) the profile's asset lives under
    pub asset_root: String,
}

impl AvatarConfig {
    pub fn new(profile: AvatarProfile, asset_root: impl Into<String>) -> Self {
        Self {
            profile,
            asset_root: asset_root.into(),
        }
    }

    /// Location the downloader fetches from
    pub fn asset_location(&self) -> String {
        let root = self.asset_root.trim_end_matches('/');
        let asset = self.profile.asset.trim_start_matches('/');
        if root.is_empty() {
            asset.to_string()
        } else {
            format!("{}/{}", root, asset)
        }
    }
}

/// In-memory directory backing the `avatar://` asset source
#[derive(Resource, Clone, Default)]
pub struct AvatarAssetDir(pub Dir);

/// Registers the `avatar://` source. Must be added before `DefaultPlugins`
/// so the asset server sees it.
#[derive(Default)]
pub struct AvatarSourcePlugin;

impl Plugin for AvatarSourcePlugin {
    fn build(&self, app: &mut App) {
        let dir = AvatarAssetDir::default();
        let root = dir.0.clone();
        app.register_asset_source(
            AVATAR_SOURCE,
            AssetSource::build().with_reader(move || {
                Box::new(MemoryAssetReader { root: root.clone() })
            }),
        )
        .insert_resource(dir);
    }
}

/// Plugin that mounts the avatar described by [`AvatarConfig`]
pub struct AvatarScenePlugin;

impl Plugin for AvatarScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(camera::OrbitCameraPlugin)
            .add_plugins(avatar::AvatarPlugin)
            .add_plugins(picking::AvatarPickingPlugin)
            .add_plugins(ui::LoadingOverlayPlugin)
            .add_plugins(teardown::TeardownPlugin);
    }
}

pub use avatar::Avatar;
pub use teardown::TeardownSignal;
pub use viewport::ViewportSession;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_location() {
        let mut config = AvatarConfig::new(AvatarProfile::pedestal(), "");
        assert_eq!(config.asset_location(), "Avatar.glb");

        config.asset_root = "https://example.com/static/".to_string();
        assert_eq!(config.asset_location(), "https://example.com/static/Avatar.glb");

        config.asset_root = "assets".to_string();
        config.profile.asset = "/models/me.glb".to_string();
        assert_eq!(config.asset_location(), "assets/models/me.glb");
    }
}
