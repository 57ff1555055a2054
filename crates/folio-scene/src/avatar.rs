//! Avatar entity: loading, animation graph and cross-fades
//!
//! The [`Avatar`] component owns the controller for the mounted model. The
//! systems here feed it download progress, publish the finished bytes to
//! the `avatar://` source, spawn the decoded scene, bind its animation
//! player and play whatever transitions the controller hands back.

use std::collections::HashMap;
use std::path::Path;

use bevy::animation::RepeatAnimation;
use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use tracing::{debug, error, info, warn};

use folio_core::{AssetLoadFailure, AvatarController, AvatarProfile, Transition};

use crate::download::{start_download, DownloadEvent, PendingDownload};
use crate::ui::LoadIndicator;
use crate::viewport::ViewportSession;
use crate::{AvatarAssetDir, AvatarConfig, AVATAR_SOURCE};

/// Animation players that an avatar has been bound to
pub type PlayerQuery<'w, 's> =
    Query<'w, 's, (&'static mut AnimationPlayer, &'static mut AnimationTransitions)>;

/// Reason recorded when the decoded asset has nothing to spawn
const NO_SCENE: &str = "asset contains no scene";

enum LoadStage {
    Downloading,
    Decoding(Handle<Gltf>),
    Spawned,
    Failed,
}

#[derive(Component)]
pub struct Avatar {
    controller: AvatarController,
    stage: LoadStage,
    /// Graph node for each clip name in the asset
    clips: HashMap<String, AnimationNodeIndex>,
    graph: Option<Handle<AnimationGraph>>,
    player: Option<Entity>,
    /// Latest transition not yet handed to the player
    pending: Option<Transition>,
}

impl Avatar {
    pub fn new(controller: AvatarController) -> Self {
        Self {
            controller,
            stage: LoadStage::Downloading,
            clips: HashMap::new(),
            graph: None,
            player: None,
            pending: None,
        }
    }

    pub fn controller(&self) -> &AvatarController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AvatarController {
        &mut self.controller
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.stage, LoadStage::Failed)
    }

    /// Transition waiting for the animation player
    pub fn pending(&self) -> Option<&Transition> {
        self.pending.as_ref()
    }

    /// Feed one download event to the controller. Returns the asset bytes
    /// once the download finished.
    pub fn handle_download(&mut self, event: DownloadEvent) -> Option<Vec<u8>> {
        match event {
            DownloadEvent::Progress { loaded, total } => {
                self.controller.on_progress(loaded, total);
                None
            }
            DownloadEvent::Finished(bytes) => Some(bytes),
            DownloadEvent::Failed(reason) => {
                self.fail(reason);
                None
            }
        }
    }

    /// Queue a transition for the animation player
    pub fn queue(&mut self, transition: Option<Transition>) {
        if transition.is_some() {
            self.pending = transition;
        }
    }

    /// Play the queued transition if the player is bound
    pub fn apply_pending(&mut self, players: &mut PlayerQuery) {
        let Some(player_entity) = self.player else { return };
        let Some(transition) = self.pending.take() else { return };
        match players.get_mut(player_entity) {
            Ok((mut player, mut transitions)) => {
                play_transition(&self.clips, &transition, &mut player, &mut transitions);
            }
            Err(_) => self.pending = Some(transition),
        }
    }

    fn fail(&mut self, reason: impl Into<String>) {
        let asset = self.controller.profile().asset.clone();
        self.controller
            .on_load_failed(AssetLoadFailure::new(asset, reason));
        self.stage = LoadStage::Failed;
    }
}

pub struct AvatarPlugin;

impl Plugin for AvatarPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingDownload>()
            .init_resource::<LoadIndicator>()
            .add_systems(Startup, mount_avatar)
            .add_systems(
                Update,
                (
                    pump_download,
                    spawn_loaded_avatar,
                    bind_animation_player,
                    drive_avatar,
                )
                    .chain(),
            );
    }
}

fn mount_avatar(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Option<Res<AvatarConfig>>,
    pending: Res<PendingDownload>,
    indicator: Res<LoadIndicator>,
) {
    let Some(config) = config else {
        warn!("No avatar configured; nothing to mount");
        return;
    };

    let mut controller = match AvatarController::new(config.profile.clone()) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Invalid avatar profile '{}': {}", config.profile.name, e);
            return;
        }
    };
    indicator.attach(&mut controller);

    let session = ViewportSession::mount(&mut commands, &mut meshes, &mut materials, &config.profile);
    commands.spawn((
        Name::new("avatar"),
        Transform::default(),
        Visibility::default(),
        Avatar::new(controller),
        ChildOf(session.root()),
    ));
    commands.insert_resource(session);

    start_download(config.asset_location(), pending.clone());
}

fn pump_download(
    pending: Res<PendingDownload>,
    dir: Res<AvatarAssetDir>,
    asset_server: Res<AssetServer>,
    mut avatars: Query<&mut Avatar>,
) {
    let events = pending.drain();
    if events.is_empty() {
        return;
    }
    let Ok(mut avatar) = avatars.single_mut() else {
        debug!("Dropping {} download events, no avatar mounted", events.len());
        return;
    };

    for event in events {
        let Some(bytes) = avatar.handle_download(event) else { continue };
        let asset = avatar
            .controller
            .profile()
            .asset
            .trim_start_matches('/')
            .to_string();
        dir.0.insert_asset(Path::new(&asset), bytes);
        let handle = asset_server.load::<Gltf>(format!("{}://{}", AVATAR_SOURCE, asset));
        avatar.stage = LoadStage::Decoding(handle);
    }
}

#[derive(Debug, PartialEq)]
enum DecodeStep {
    Wait,
    Ready,
    Failed(String),
}

fn decode_step(state: Option<&LoadState>) -> DecodeStep {
    match state {
        Some(LoadState::Loaded) => DecodeStep::Ready,
        Some(LoadState::Failed(err)) => DecodeStep::Failed(err.to_string()),
        _ => DecodeStep::Wait,
    }
}

/// The asset's default scene, else its first one
fn pick_scene(
    default_scene: Option<&Handle<Scene>>,
    scenes: &[Handle<Scene>],
) -> Result<Handle<Scene>, &'static str> {
    default_scene
        .or_else(|| scenes.first())
        .cloned()
        .ok_or(NO_SCENE)
}

fn spawn_loaded_avatar(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    mut avatars: Query<(Entity, &mut Avatar)>,
) {
    for (entity, mut avatar) in &mut avatars {
        let handle = match &avatar.stage {
            LoadStage::Decoding(handle) => handle.clone(),
            _ => continue,
        };

        match decode_step(asset_server.get_load_state(handle.id()).as_ref()) {
            DecodeStep::Ready => {}
            DecodeStep::Failed(reason) => {
                avatar.fail(reason);
                continue;
            }
            DecodeStep::Wait => continue,
        }
        let Some(gltf) = gltfs.get(&handle) else { continue };

        let scene = match pick_scene(gltf.default_scene.as_ref(), &gltf.scenes) {
            Ok(scene) => scene,
            Err(reason) => {
                avatar.fail(reason);
                continue;
            }
        };

        let (graph, clips) = build_graph(gltf, avatar.controller.profile());
        avatar.graph = Some(graphs.add(graph));
        avatar.clips = clips;
        avatar.stage = LoadStage::Spawned;
        commands.entity(entity).with_child(SceneRoot(scene));

        let initial = avatar.controller.on_loaded();
        avatar.queue(initial);
    }
}

/// One graph node per named clip, all blended under the root
pub fn build_graph(
    gltf: &Gltf,
    profile: &AvatarProfile,
) -> (AnimationGraph, HashMap<String, AnimationNodeIndex>) {
    let mut graph = AnimationGraph::new();
    let mut clips = HashMap::new();
    for (name, clip) in &gltf.named_animations {
        let node = graph.add_clip(clip.clone(), 1.0, graph.root);
        clips.insert(name.to_string(), node);
    }

    for (state, spec) in &profile.states {
        if !clips.contains_key(&spec.clip) {
            warn!(state = %state, clip = %spec.clip, "Clip missing from avatar asset");
        }
    }
    info!("Avatar animation graph built with {} clips", clips.len());
    (graph, clips)
}

/// Attach the graph to the first animation player under the avatar
fn bind_animation_player(
    mut commands: Commands,
    mut avatars: Query<(Entity, &mut Avatar)>,
    children: Query<&Children>,
    mut players: Query<&mut AnimationPlayer, Without<AnimationGraphHandle>>,
) {
    for (entity, mut avatar) in &mut avatars {
        if avatar.player.is_some() {
            continue;
        }
        let Some(graph) = avatar.graph.clone() else { continue };
        let Some(player_entity) = children
            .iter_descendants(entity)
            .find(|descendant| players.contains(*descendant))
        else {
            continue;
        };
        let Ok(mut player) = players.get_mut(player_entity) else { continue };

        let mut transitions = AnimationTransitions::new();
        if let Some(transition) = avatar.pending.take() {
            play_transition(&avatar.clips, &transition, &mut player, &mut transitions);
        }
        commands
            .entity(player_entity)
            .insert((AnimationGraphHandle(graph), transitions));
        avatar.player = Some(player_entity);
        debug!(?player_entity, "Animation player bound");
    }
}

fn drive_avatar(time: Res<Time>, mut avatars: Query<&mut Avatar>, mut players: PlayerQuery) {
    for mut avatar in &mut avatars {
        let fired = avatar.controller.tick(time.delta());
        avatar.queue(fired);
        avatar.apply_pending(&mut players);
    }
}

/// Cross-fade to the transition's clip. Unknown clips keep the current one.
fn play_transition(
    clips: &HashMap<String, AnimationNodeIndex>,
    transition: &Transition,
    player: &mut AnimationPlayer,
    transitions: &mut AnimationTransitions,
) {
    let Some(&node) = clips.get(&transition.clip) else {
        warn!(clip = %transition.clip, state = %transition.to, "Clip not found; keeping current animation");
        return;
    };
    let repeat = if transition.looping {
        RepeatAnimation::Forever
    } else {
        RepeatAnimation::Never
    };
    transitions
        .play(player, node, transition.blend)
        .set_repeat(repeat);
}
