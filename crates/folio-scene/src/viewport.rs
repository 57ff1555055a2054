//! Viewport session - the explicitly owned rendering context
//!
//! Every entity the avatar scene creates hangs off one root entity, so a
//! single `dispose` releases the camera, lights, pedestal and model
//! together. The orbit settings and ambient light are resources owned by
//! the session as well.

use bevy::prelude::*;
use tracing::info;

use folio_core::{AvatarProfile, StageSpec};

use crate::camera::{MainCamera, OrbitSettings};

/// Marker for the pedestal the avatar stands on
#[derive(Component)]
pub struct Pedestal;

#[derive(Debug, Resource)]
pub struct ViewportSession {
    root: Entity,
    camera: Entity,
    profile: String,
}

impl ViewportSession {
    /// Spawn the camera, lights and pedestal for `profile`
    pub fn mount(
        commands: &mut Commands,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
        profile: &AvatarProfile,
    ) -> Self {
        let stage = &profile.stage;
        let orbit = OrbitSettings::from_framing(&profile.camera);
        let camera_transform = orbit.transform();

        commands.insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: stage.ambient_brightness,
            ..default()
        });

        let mut camera = Entity::PLACEHOLDER;
        let root = commands
            .spawn((
                Name::new("avatar-viewport"),
                Transform::default(),
                Visibility::default(),
            ))
            .with_children(|parent| {
                camera = parent
                    .spawn((
                        Camera3d::default(),
                        Camera {
                            // The page shows through around the model
                            clear_color: ClearColorConfig::Custom(Color::NONE),
                            ..default()
                        },
                        Projection::Perspective(PerspectiveProjection {
                            fov: profile.camera.fov_degrees.to_radians(),
                            near: 0.01,
                            far: 100.0,
                            ..default()
                        }),
                        camera_transform,
                        MainCamera,
                    ))
                    .id();

                spawn_lights(parent, stage);
                spawn_pedestal(parent, meshes, materials, stage);
            })
            .id();

        commands.insert_resource(orbit);

        info!(profile = %profile.name, "Viewport mounted");
        Self {
            root,
            camera,
            profile: profile.name.clone(),
        }
    }

    /// Parent of every entity in the session, the avatar included
    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn camera(&self) -> Entity {
        self.camera
    }

    /// Despawn everything the session created and drop its resources
    pub fn dispose(&self, commands: &mut Commands) {
        commands.entity(self.root).despawn();
        commands.remove_resource::<OrbitSettings>();
        commands.remove_resource::<AmbientLight>();
        commands.remove_resource::<ViewportSession>();
        info!(profile = %self.profile, "Viewport disposed");
    }
}

fn spawn_lights(parent: &mut ChildSpawnerCommands, stage: &StageSpec) {
    let spot = &stage.spot_light;
    parent.spawn((
        SpotLight {
            intensity: spot.intensity,
            range: spot.range,
            outer_angle: spot.angle,
            inner_angle: spot.angle * (1.0 - spot.penumbra.clamp(0.0, 1.0)),
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(Vec3::from_array(spot.position))
            .looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let key = &stage.key_light;
    parent.spawn((
        DirectionalLight {
            illuminance: key.illuminance,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_translation(Vec3::from_array(key.position))
            .looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn spawn_pedestal(
    parent: &mut ChildSpawnerCommands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    stage: &StageSpec,
) {
    parent.spawn((
        Mesh3d(meshes.add(Cylinder::new(stage.pedestal_radius, stage.pedestal_height))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.9, 0.9, 0.9),
            perceptual_roughness: 0.8,
            ..default()
        })),
        // Top face flush with the floor plane
        Transform::from_xyz(0.0, -stage.pedestal_height / 2.0, 0.0),
        Pedestal,
    ));
}
