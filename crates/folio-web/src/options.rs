//! Mount options passed from the page

use serde::Deserialize;

use folio_core::{AvatarProfile, ProfileError};

/// JSON options for `mount`, all optional:
///
/// ```json
/// { "profile": "lounge", "assetRoot": "/static" }
/// ```
///
/// `profileConfig` may carry a complete profile instead of a built-in name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MountOptions {
    pub profile: Option<String>,
    pub profile_config: Option<AvatarProfile>,
    pub asset_root: Option<String>,
}

impl MountOptions {
    pub fn from_json(json: Option<&str>) -> Result<Self, ProfileError> {
        match json.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(json) => Ok(serde_json::from_str(json)?),
        }
    }

    /// Inline profile, then the named one, then `?profile=`, then `pedestal`
    pub fn resolve_profile(&self, query: Option<&str>) -> Result<AvatarProfile, ProfileError> {
        if let Some(profile) = &self.profile_config {
            profile.validate()?;
            return Ok(profile.clone());
        }
        let name = self
            .profile
            .as_deref()
            .or(query)
            .unwrap_or("pedestal");
        AvatarProfile::builtin(name)
    }
}

/// `?profile=` from the page URL
#[cfg(target_arch = "wasm32")]
pub fn query_profile() -> Option<String> {
    let window = web_sys::window()?;
    let location = window.location().href().ok()?;
    let url = web_sys::Url::new(&location).ok()?;
    url.search_params().get("profile")
}

#[cfg(not(target_arch = "wasm32"))]
pub fn query_profile() -> Option<String> {
    None
}
