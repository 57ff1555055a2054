//! Configuration loading for the desktop viewer

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use folio_core::{AvatarProfile, ProfileError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub avatar: AvatarSection,
    /// Inline profile, used instead of `avatar.profile` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<AvatarProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_title() -> String {
    "Folio Avatar".to_string()
}

fn default_width() -> u32 {
    960
}

fn default_height() -> u32 {
    720
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarSection {
    /// Built-in profile name
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Profile TOML file, takes precedence over `profile`
    #[serde(default)]
    pub profile_path: Option<PathBuf>,
    /// Directory the profile's asset is read from
    #[serde(default = "default_asset_root")]
    pub asset_root: String,
}

impl Default for AvatarSection {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            profile_path: None,
            asset_root: default_asset_root(),
        }
    }
}

fn default_profile() -> String {
    "pedestal".to_string()
}

fn default_asset_root() -> String {
    "assets".to_string()
}

impl Config {
    /// Pick the avatar profile. A name from the command line wins, then the
    /// inline `[profile]`, then `profile_path`, then the built-in name.
    pub fn resolve_profile(&self, cli_profile: Option<&str>) -> Result<AvatarProfile, ConfigError> {
        if let Some(name) = cli_profile {
            return Ok(AvatarProfile::builtin(name)?);
        }
        if let Some(profile) = &self.profile {
            profile.validate()?;
            return Ok(profile.clone());
        }
        if let Some(path) = &self.avatar.profile_path {
            return AvatarProfile::load(path).map_err(|e| match e {
                ProfileError::IoError(source) => ConfigError::Io {
                    path: path.clone(),
                    source,
                },
                other => ConfigError::Profile(other),
            });
        }
        Ok(AvatarProfile::builtin(&self.avatar.profile)?)
    }
}

/// Load configuration from file, falling back to defaults when it is missing
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
