//! Animation states and the rules that move between them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The closed set of poses the avatar can be in.
///
/// Which of them a given asset actually uses is decided by its profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvatarState {
    Sitting,
    StandingUp,
    StoodUp,
    Bored,
}

impl AvatarState {
    pub const ALL: [AvatarState; 4] = [
        AvatarState::Sitting,
        AvatarState::StandingUp,
        AvatarState::StoodUp,
        AvatarState::Bored,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarState::Sitting => "sitting",
            AvatarState::StandingUp => "standing-up",
            AvatarState::StoodUp => "stood-up",
            AvatarState::Bored => "bored",
        }
    }
}

impl fmt::Display for AvatarState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What caused a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Pointer click that hit the model
    Click,
    /// The state's timer expired
    Elapsed,
}

/// Leave the state automatically after `secs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerRule {
    pub secs: f32,
    pub to: AvatarState,
    /// Cross-fade for this exit, overriding the target's own `blend_secs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_secs: Option<f32>,
}

impl TimerRule {
    pub fn delay(&self) -> Duration {
        seconds(self.secs)
    }

    /// Cross-fade override for this exit, if any
    pub fn blend_duration(&self) -> Option<Duration> {
        self.blend_secs.map(seconds)
    }
}

/// Profile seconds to a `Duration`. Negative and NaN become zero, values
/// too large to represent saturate at `Duration::MAX`.
fn seconds(secs: f32) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
}

/// One entry of a profile's state table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpec {
    /// Animation clip name inside the model asset
    pub clip: String,
    /// Whether the clip repeats while the state is active
    #[serde(default = "default_true")]
    pub looping: bool,
    /// Target on a click hit. `None` means clicks are ignored in this state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_click: Option<AvatarState>,
    /// Cross-fade duration used when entering this state
    #[serde(default = "default_blend")]
    pub blend_secs: f32,
    /// Timed exit from this state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<TimerRule>,
}

fn default_true() -> bool {
    true
}

fn default_blend() -> f32 {
    0.5
}

impl StateSpec {
    pub fn new(clip: impl Into<String>) -> Self {
        Self {
            clip: clip.into(),
            looping: true,
            on_click: None,
            blend_secs: default_blend(),
            after: None,
        }
    }

    pub fn once(mut self) -> Self {
        self.looping = false;
        self
    }

    pub fn on_click(mut self, to: AvatarState) -> Self {
        self.on_click = Some(to);
        self
    }

    pub fn after(mut self, secs: f32, to: AvatarState) -> Self {
        self.after = Some(TimerRule {
            secs,
            to,
            blend_secs: None,
        });
        self
    }

    /// Timed exit with its own cross-fade duration
    pub fn after_with_blend(mut self, secs: f32, to: AvatarState, blend_secs: f32) -> Self {
        self.after = Some(TimerRule {
            secs,
            to,
            blend_secs: Some(blend_secs),
        });
        self
    }

    pub fn blend(mut self, secs: f32) -> Self {
        self.blend_secs = secs;
        self
    }

    pub fn blend_duration(&self) -> Duration {
        seconds(self.blend_secs)
    }

    /// Where a trigger leads from this state, if anywhere
    pub fn target(&self, trigger: Trigger) -> Option<AvatarState> {
        match trigger {
            Trigger::Click => self.on_click,
            Trigger::Elapsed => self.after.as_ref().map(|rule| rule.to),
        }
    }

    /// A state with no way out
    pub fn is_terminal(&self) -> bool {
        self.on_click.is_none() && self.after.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_names() {
        assert_eq!(AvatarState::StandingUp.to_string(), "standing-up");
        let parsed: AvatarState = serde_json::from_str("\"stood-up\"").unwrap();
        assert_eq!(parsed, AvatarState::StoodUp);
        for state in AvatarState::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
    }

    #[test]
    fn test_targets() {
        let spec = StateSpec::new("sitting").on_click(AvatarState::StandingUp);
        assert_eq!(spec.target(Trigger::Click), Some(AvatarState::StandingUp));
        assert_eq!(spec.target(Trigger::Elapsed), None);
        assert!(!spec.is_terminal());
        assert!(StateSpec::new("idle").is_terminal());
    }

    #[test]
    fn test_negative_durations_clamp() {
        let spec = StateSpec::new("x").blend(-1.0).after(-3.0, AvatarState::Sitting);
        assert_eq!(spec.blend_duration(), Duration::ZERO);
        assert_eq!(spec.after.unwrap().delay(), Duration::ZERO);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let spec = StateSpec::new("x")
            .blend(3.0e38)
            .after_with_blend(1e20, AvatarState::Sitting, f32::INFINITY);
        assert_eq!(spec.blend_duration(), Duration::MAX);
        let rule = spec.after.unwrap();
        assert_eq!(rule.delay(), Duration::MAX);
        assert_eq!(rule.blend_duration(), Some(Duration::MAX));
        assert_eq!(seconds(f32::NAN), Duration::ZERO);
        assert_eq!(seconds(1.5), Duration::from_millis(1500));
    }
}
