//! Folio Web - the avatar centerpiece for the portfolio page
//!
//! The page calls `mount(canvas, options)` once the canvas exists and keeps
//! the returned handle; `handle.unmount()` tears the scene down. Section
//! highlighting for the page navigation is exposed as [`PageNav`].

mod app;
mod nav;
mod options;

use std::sync::atomic::{AtomicBool, Ordering};

use wasm_bindgen::prelude::*;

use folio_scene::{AvatarConfig, TeardownSignal};

pub use nav::PageNav;
pub use options::MountOptions;

/// A page only gets one event loop, and it cannot be restarted after teardown
static MOUNTED: AtomicBool = AtomicBool::new(false);

const ALREADY_MOUNTED: &str = "Avatar is already mounted or torn down on this page";

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build(),
    );
}

/// Handle to a mounted avatar scene
#[wasm_bindgen]
pub struct AvatarHandle {
    teardown: TeardownSignal,
}

#[wasm_bindgen]
impl AvatarHandle {
    /// Dispose the controller and every scene resource. Safe to call twice.
    pub fn unmount(&self) {
        if !self.teardown.is_requested() {
            tracing::info!("Unmount requested");
        }
        self.teardown.request();
    }

    #[wasm_bindgen(getter)]
    pub fn mounted(&self) -> bool {
        !self.teardown.is_requested()
    }
}

/// Mount the avatar into the canvas matching `canvas` (a CSS selector).
///
/// `options` is an optional JSON string, see [`MountOptions`].
#[wasm_bindgen]
pub fn mount(canvas: &str, options: Option<String>) -> Result<AvatarHandle, JsValue> {
    let options = MountOptions::from_json(options.as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let profile = options
        .resolve_profile(options::query_profile().as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    if MOUNTED.swap(true, Ordering::SeqCst) {
        return Err(JsValue::from_str(ALREADY_MOUNTED));
    }

    tracing::info!(canvas, profile = %profile.name, "Mounting avatar");
    let config = AvatarConfig::new(profile, options.asset_root.unwrap_or_default());
    let teardown = TeardownSignal::new();
    app::run(canvas, config, teardown.clone());

    Ok(AvatarHandle { teardown })
}
