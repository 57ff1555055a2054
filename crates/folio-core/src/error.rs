//! Error types shared by the avatar crates

use thiserror::Error;

use crate::state::AvatarState;

/// The avatar asset could not be fetched or decoded.
///
/// This is only ever reported through the diagnostic log. The loading
/// indicator stays up and nothing retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to load avatar asset {asset}: {reason}")]
pub struct AssetLoadFailure {
    pub asset: String,
    pub reason: String,
}

impl AssetLoadFailure {
    pub fn new(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to read profile: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse profile: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to parse profile JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Unknown built-in profile: {0}")]
    UnknownProfile(String),
    #[error("Initial state {0} has no state entry")]
    MissingInitial(AvatarState),
    #[error("State {from} points at {to}, which has no state entry")]
    DanglingTarget { from: AvatarState, to: AvatarState },
    #[error("State {0} has an empty clip name")]
    EmptyClip(AvatarState),
    #[error("State {state} has an invalid duration: {value}")]
    InvalidDuration { state: AvatarState, value: f32 },
}
