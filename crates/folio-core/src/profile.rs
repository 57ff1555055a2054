//! Avatar profiles - one asset, its state table, and how it is framed
//!
//! A profile is a configuration of the shared state-machine design. Two are
//! built in: `pedestal` (the avatar on a pedestal that can also get bored)
//! and `lounge` (sit, stand up, sit back down). Others can be loaded from
//! TOML:
//!
//! ```toml
//! name = "custom"
//! asset = "Avatar.glb"
//! initial = "sitting"
//!
//! [states.sitting]
//! clip = "sitting"
//! on_click = "standing-up"
//!
//! [states.standing-up]
//! clip = "stand"
//! looping = false
//! blend_secs = 1.0
//! after = { secs = 2.0, to = "sitting" }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::ProfileError;
use crate::state::{AvatarState, StateSpec};

/// Orbit camera framing around the avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFraming {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    /// Orbit center
    pub target: [f32; 3],
    /// Distance from the target
    pub distance: f32,
    /// Starting azimuth around the vertical axis, radians (0 = looking down -Z)
    #[serde(default)]
    pub azimuth: f32,
    /// Angle from the vertical axis, radians. Kept fixed while orbiting.
    pub polar_angle: f32,
    #[serde(default)]
    pub enable_zoom: bool,
    #[serde(default)]
    pub enable_pan: bool,
    /// Smoothing applied to orbit motion (0 = none)
    #[serde(default = "default_damping")]
    pub damping: f32,
}

fn default_fov() -> f32 {
    45.0
}

fn default_damping() -> f32 {
    0.15
}

/// Lights and pedestal around the avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    pub pedestal_radius: f32,
    pub pedestal_height: f32,
    pub ambient_brightness: f32,
    pub key_light: KeyLight,
    pub spot_light: SpotLightSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyLight {
    pub illuminance: f32,
    pub position: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotLightSpec {
    pub intensity: f32,
    pub range: f32,
    /// Outer cone angle, radians
    pub angle: f32,
    /// Fraction of the cone that fades out (0 = hard edge)
    pub penumbra: f32,
    pub position: [f32; 3],
}

impl Default for StageSpec {
    fn default() -> Self {
        Self {
            pedestal_radius: 0.8,
            pedestal_height: 0.1,
            ambient_brightness: 400.0,
            key_light: KeyLight {
                illuminance: 4000.0,
                position: [1.0, 1.0, 2.0],
            },
            spot_light: SpotLightSpec {
                intensity: 250_000.0,
                range: 8.0,
                angle: 1.0,
                penumbra: 0.5,
                position: [0.0, 4.0, 2.0],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarProfile {
    pub name: String,
    /// Model asset path, relative to the asset root
    pub asset: String,
    pub initial: AvatarState,
    pub states: BTreeMap<AvatarState, StateSpec>,
    pub camera: CameraFraming,
    #[serde(default)]
    pub stage: StageSpec,
}

impl AvatarProfile {
    pub const BUILTIN: [&'static str; 2] = ["pedestal", "lounge"];

    /// Avatar on a pedestal: sits until clicked, stands, gets bored when
    /// clicked again, and sits back down after a minute.
    pub fn pedestal() -> Self {
        use AvatarState::*;

        let mut states = BTreeMap::new();
        states.insert(Sitting, StateSpec::new("sitting").on_click(StandingUp).blend(1.0));
        states.insert(
            StandingUp,
            StateSpec::new("stand").once().blend(1.0).after(1.0, StoodUp),
        );
        states.insert(
            StoodUp,
            StateSpec::new("standing")
                .blend(0.5)
                .on_click(Bored)
                .after(60.0, Sitting),
        );
        states.insert(
            Bored,
            StateSpec::new("bored")
                .blend(0.5)
                .after_with_blend(9.0, StoodUp, 0.9),
        );

        Self {
            name: "pedestal".to_string(),
            asset: "Avatar.glb".to_string(),
            initial: Sitting,
            states,
            camera: CameraFraming {
                fov_degrees: 45.0,
                target: [0.0, 0.75, 0.0],
                distance: 3.0,
                azimuth: 0.197,
                polar_angle: 1.45,
                enable_zoom: false,
                enable_pan: false,
                damping: default_damping(),
            },
            stage: StageSpec::default(),
        }
    }

    /// Sit, stand up on click, and sit back down after an idle minute.
    pub fn lounge() -> Self {
        use AvatarState::*;

        let mut states = BTreeMap::new();
        states.insert(Sitting, StateSpec::new("sitting").on_click(StandingUp).blend(1.0));
        states.insert(
            StandingUp,
            StateSpec::new("stand").once().blend(1.0).after(2.0, StoodUp),
        );
        states.insert(StoodUp, StateSpec::new("standing").blend(0.5).after(60.0, Sitting));

        Self {
            name: "lounge".to_string(),
            asset: "Avatar.glb".to_string(),
            initial: Sitting,
            states,
            camera: CameraFraming {
                fov_degrees: 35.0,
                target: [0.0, 0.9, 0.0],
                distance: 2.4,
                azimuth: 0.0,
                polar_angle: 1.35,
                enable_zoom: false,
                enable_pan: false,
                damping: default_damping(),
            },
            stage: StageSpec {
                pedestal_radius: 0.6,
                ..StageSpec::default()
            },
        }
    }

    pub fn builtin(name: &str) -> Result<Self, ProfileError> {
        match name.to_lowercase().as_str() {
            "pedestal" => Ok(Self::pedestal()),
            "lounge" => Ok(Self::lounge()),
            _ => Err(ProfileError::UnknownProfile(name.to_string())),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ProfileError> {
        let profile: AvatarProfile = toml::from_str(content)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_json(content: &str) -> Result<Self, ProfileError> {
        let profile: AvatarProfile = serde_json::from_str(content)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn spec(&self, state: AvatarState) -> Option<&StateSpec> {
        self.states.get(&state)
    }

    /// Check that every rule lands on a known state and all numbers are sane
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !self.states.contains_key(&self.initial) {
            return Err(ProfileError::MissingInitial(self.initial));
        }

        for (state, spec) in &self.states {
            if spec.clip.trim().is_empty() {
                return Err(ProfileError::EmptyClip(*state));
            }
            check_duration(*state, spec.blend_secs)?;

            let targets = [spec.on_click, spec.after.as_ref().map(|rule| rule.to)];
            for to in targets.into_iter().flatten() {
                if !self.states.contains_key(&to) {
                    return Err(ProfileError::DanglingTarget { from: *state, to });
                }
            }
            if let Some(rule) = &spec.after {
                check_duration(*state, rule.secs)?;
                if let Some(blend) = rule.blend_secs {
                    check_duration(*state, blend)?;
                }
            }
            if spec.is_terminal() {
                tracing::warn!(profile = %self.name, state = %state, "State has no exit");
            }
        }

        Ok(())
    }
}

/// Non-negative and representable as a `Duration`
fn check_duration(state: AvatarState, value: f32) -> Result<(), ProfileError> {
    if value >= 0.0 && Duration::try_from_secs_f32(value).is_ok() {
        Ok(())
    } else {
        Err(ProfileError::InvalidDuration { state, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Trigger;
    use std::io::Write;

    #[test]
    fn test_builtins_validate() {
        for name in AvatarProfile::BUILTIN {
            let profile = AvatarProfile::builtin(name).unwrap();
            profile.validate().unwrap();
            assert_eq!(profile.name, name);
        }
        assert!(AvatarProfile::builtin("PEDESTAL").is_ok());
        assert!(matches!(
            AvatarProfile::builtin("gallery"),
            Err(ProfileError::UnknownProfile(_))
        ));
    }

    #[test]
    fn test_lounge_cycle() {
        let profile = AvatarProfile::lounge();
        let sitting = profile.spec(AvatarState::Sitting).unwrap();
        assert_eq!(sitting.target(Trigger::Click), Some(AvatarState::StandingUp));

        let standing_up = profile.spec(AvatarState::StandingUp).unwrap();
        assert_eq!(standing_up.on_click, None);
        assert_eq!(standing_up.after.as_ref().unwrap().secs, 2.0);

        let stood = profile.spec(AvatarState::StoodUp).unwrap();
        assert_eq!(stood.target(Trigger::Elapsed), Some(AvatarState::Sitting));
        assert!(profile.spec(AvatarState::Bored).is_none());
    }

    #[test]
    fn test_pedestal_clips() {
        let profile = AvatarProfile::pedestal();
        let clips: Vec<&str> = profile.states.values().map(|s| s.clip.as_str()).collect();
        assert_eq!(clips, vec!["sitting", "stand", "standing", "bored"]);
        let bored = profile.spec(AvatarState::Bored).unwrap();
        assert_eq!(bored.after.as_ref().unwrap().blend_secs, Some(0.9));
        assert_eq!(profile.spec(AvatarState::StoodUp).unwrap().blend_secs, 0.5);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
name = "custom"
asset = "models/me.glb"
initial = "sitting"

[camera]
target = [0.0, 1.0, 0.0]
distance = 2.0
polar_angle = 1.4

[states.sitting]
clip = "sit_idle"
on_click = "standing-up"

[states.standing-up]
clip = "stand"
looping = false
blend_secs = 1.0
after = { secs = 2.5, to = "sitting" }
"#;

        let profile = AvatarProfile::from_toml(toml).unwrap();
        assert_eq!(profile.asset, "models/me.glb");
        assert_eq!(profile.camera.fov_degrees, 45.0);
        assert!(!profile.camera.enable_zoom);
        assert_eq!(profile.stage, StageSpec::default());

        let sitting = profile.spec(AvatarState::Sitting).unwrap();
        assert!(sitting.looping);
        assert_eq!(sitting.blend_secs, 0.5);

        let standing_up = profile.spec(AvatarState::StandingUp).unwrap();
        assert!(!standing_up.looping);
        assert_eq!(standing_up.after.as_ref().unwrap().to, AvatarState::Sitting);
    }

    #[test]
    fn test_rejects_dangling_target() {
        let mut profile = AvatarProfile::lounge();
        profile
            .states
            .get_mut(&AvatarState::StoodUp)
            .unwrap()
            .on_click = Some(AvatarState::Bored);

        assert!(matches!(
            profile.validate(),
            Err(ProfileError::DanglingTarget {
                from: AvatarState::StoodUp,
                to: AvatarState::Bored
            })
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut profile = AvatarProfile::lounge();
        profile.initial = AvatarState::Bored;
        assert!(matches!(profile.validate(), Err(ProfileError::MissingInitial(_))));

        let mut profile = AvatarProfile::lounge();
        profile.states.get_mut(&AvatarState::Sitting).unwrap().blend_secs = f32::NAN;
        assert!(matches!(profile.validate(), Err(ProfileError::InvalidDuration { .. })));

        let mut profile = AvatarProfile::lounge();
        profile.states.get_mut(&AvatarState::Sitting).unwrap().blend_secs = 3.0e38;
        assert!(matches!(profile.validate(), Err(ProfileError::InvalidDuration { .. })));

        let mut profile = AvatarProfile::lounge();
        profile.states.get_mut(&AvatarState::Sitting).unwrap().clip = " ".to_string();
        assert!(matches!(profile.validate(), Err(ProfileError::EmptyClip(_))));
    }

    #[test]
    fn test_rejects_unrepresentable_timer() {
        let toml = r#"
name = "slow"
asset = "models/me.glb"
initial = "sitting"

[camera]
target = [0.0, 1.0, 0.0]
distance = 2.0
polar_angle = 1.4

[states.sitting]
clip = "sit_idle"
after = { secs = 1e20, to = "sitting" }
"#;
        assert!(matches!(
            AvatarProfile::from_toml(toml),
            Err(ProfileError::InvalidDuration {
                state: AvatarState::Sitting,
                ..
            })
        ));

        let within = toml.replace("1e20", "86400.0");
        assert!(AvatarProfile::from_toml(&within).is_ok());
    }

    #[test]
    fn test_json_matches_toml() {
        let profile = AvatarProfile::pedestal();
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(AvatarProfile::from_json(&json).unwrap(), profile);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let content = toml::to_string_pretty(&AvatarProfile::lounge()).unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let profile = AvatarProfile::load(file.path()).unwrap();
        assert_eq!(profile.name, "lounge");
        assert!(AvatarProfile::load(Path::new("/nonexistent/profile.toml")).is_err());
    }
}
