//! Click detection on the avatar
//!
//! A click or tap casts a ray from the camera through the pointer. It counts
//! as a hit if any intersected mesh along the ray belongs to the avatar's
//! entity tree, so the pedestal in front of the feet does not swallow it.
//! Drags (orbiting) are not clicks.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_picking::prelude::{MeshRayCast, MeshRayCastSettings};
use tracing::trace;

use crate::avatar::{Avatar, PlayerQuery};
use crate::camera::MainCamera;

/// Pointer travel beyond which a press becomes a drag
const DRAG_THRESHOLD: f32 = 10.0;

/// Track a press so taps can be told apart from drags
#[derive(Resource, Default, Debug)]
pub struct PointerGesture {
    /// Position where the press started
    start_position: Option<Vec2>,
    is_dragging: bool,
}

impl PointerGesture {
    pub fn press(&mut self, position: Vec2) {
        self.start_position = Some(position);
        self.is_dragging = false;
    }

    pub fn moved(&mut self, position: Vec2) {
        if let Some(start) = self.start_position {
            if position.distance(start) > DRAG_THRESHOLD {
                self.is_dragging = true;
            }
        }
    }

    /// End the press. Returns where it started if it was a click.
    pub fn release(&mut self) -> Option<Vec2> {
        let start = self.start_position.take();
        let was_drag = std::mem::take(&mut self.is_dragging);
        if was_drag {
            None
        } else {
            start
        }
    }
}

/// Walk up the hierarchy from `entity` looking for `ancestor`
pub fn is_descendant(
    entity: Entity,
    ancestor: Entity,
    parent_of: impl Fn(Entity) -> Option<Entity>,
) -> bool {
    let mut current = Some(entity);
    while let Some(e) = current {
        if e == ancestor {
            return true;
        }
        current = parent_of(e);
    }
    false
}

/// Whether any of `hits` lies in the tree rooted at `avatar`
pub fn hits_avatar(
    hits: impl IntoIterator<Item = Entity>,
    avatar: Entity,
    parent_of: impl Fn(Entity) -> Option<Entity> + Copy,
) -> bool {
    hits.into_iter()
        .any(|entity| is_descendant(entity, avatar, parent_of))
}

pub struct AvatarPickingPlugin;

impl Plugin for AvatarPickingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerGesture>()
            .add_systems(Update, handle_avatar_click);
    }
}

fn handle_avatar_click(
    mut gesture: ResMut<PointerGesture>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut ray_cast: MeshRayCast,
    parents: Query<&ChildOf>,
    mut avatars: Query<(Entity, &mut Avatar)>,
    mut players: PlayerQuery,
    mut contexts: bevy_egui::EguiContexts,
) {
    let Ok(window) = windows.single() else { return };
    let mut click_position: Option<Vec2> = None;

    for touch in touch_input.iter_just_pressed() {
        gesture.press(touch.position());
    }
    for touch in touch_input.iter() {
        gesture.moved(touch.position());
    }
    for _ in touch_input.iter_just_released() {
        if let Some(position) = gesture.release() {
            click_position = Some(position);
        }
    }

    if mouse_button.just_pressed(MouseButton::Left) {
        if let Some(position) = window.cursor_position() {
            gesture.press(position);
        }
    } else if mouse_button.pressed(MouseButton::Left) {
        if let Some(position) = window.cursor_position() {
            gesture.moved(position);
        }
    }
    if mouse_button.just_released(MouseButton::Left) {
        if let Some(position) = gesture.release() {
            click_position = Some(position);
        }
    }

    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);
    if egui_wants_pointer {
        return;
    }
    let Some(position) = click_position else { return };
    let Ok((camera, camera_transform)) = cameras.single() else { return };
    let Ok(ray) = camera.viewport_to_world(camera_transform, position) else { return };

    // Every intersection, not just the nearest one
    let keep_going = |_: Entity| false;
    let settings = MeshRayCastSettings::default().with_early_exit_test(&keep_going);
    let hits: Vec<Entity> = ray_cast
        .cast_ray(ray, &settings)
        .iter()
        .map(|(entity, _)| *entity)
        .collect();
    let parent_of = |e: Entity| parents.get(e).ok().map(|c| c.parent());

    for (avatar_entity, mut avatar) in &mut avatars {
        let hit = hits_avatar(hits.iter().copied(), avatar_entity, parent_of);
        trace!(hit, count = hits.len(), "Avatar click");
        let transition = avatar.controller_mut().on_click(hit);
        avatar.queue(transition);
        avatar.apply_pending(&mut players);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_descendant_walk() {
        let mut world = World::new();
        let root = world.spawn_empty().id();
        let avatar = world.spawn_empty().id();
        let mesh = world.spawn_empty().id();
        let pedestal = world.spawn_empty().id();

        let parents: HashMap<Entity, Entity> =
            [(avatar, root), (mesh, avatar), (pedestal, root)].into_iter().collect();
        let parent_of = |e: Entity| parents.get(&e).copied();

        assert!(is_descendant(mesh, avatar, parent_of));
        assert!(is_descendant(avatar, avatar, parent_of));
        assert!(!is_descendant(pedestal, avatar, parent_of));
        assert!(!is_descendant(root, avatar, parent_of));
    }

    #[test]
    fn test_occluder_in_front_still_hits() {
        let mut world = World::new();
        let root = world.spawn_empty().id();
        let avatar = world.spawn_empty().id();
        let mesh = world.spawn_empty().id();
        let pedestal = world.spawn_empty().id();

        let parents: HashMap<Entity, Entity> =
            [(avatar, root), (mesh, avatar), (pedestal, root)].into_iter().collect();
        let parent_of = |e: Entity| parents.get(&e).copied();

        assert!(hits_avatar([pedestal, mesh], avatar, parent_of));
        assert!(hits_avatar([mesh], avatar, parent_of));
        assert!(!hits_avatar([pedestal], avatar, parent_of));
        assert!(!hits_avatar(Vec::new(), avatar, parent_of));
    }

    #[test]
    fn test_tap_versus_drag() {
        let mut gesture = PointerGesture::default();
        gesture.press(Vec2::new(100.0, 100.0));
        gesture.moved(Vec2::new(104.0, 103.0));
        assert_eq!(gesture.release(), Some(Vec2::new(100.0, 100.0)));

        gesture.press(Vec2::new(100.0, 100.0));
        gesture.moved(Vec2::new(140.0, 100.0));
        // Coming back does not turn a drag into a click
        gesture.moved(Vec2::new(100.0, 100.0));
        assert_eq!(gesture.release(), None);

        // Release without a press
        assert_eq!(gesture.release(), None);
    }
}
