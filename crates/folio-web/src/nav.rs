//! Page navigation state for JavaScript

use std::time::Duration;

use wasm_bindgen::prelude::*;

use folio_core::{MobileNav, SectionTracker};

/// Active-section tracking and the auto-hiding mobile nav.
///
/// The page forwards intersection ratios, scroll events and a frame tick.
#[wasm_bindgen]
pub struct PageNav {
    sections: SectionTracker,
    mobile: MobileNav,
}

impl Default for PageNav {
    fn default() -> Self {
        Self {
            sections: SectionTracker::default(),
            mobile: MobileNav::new(),
        }
    }
}

#[wasm_bindgen]
impl PageNav {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the newly active section, if it changed
    pub fn observe(&mut self, section: &str, visible_ratio: f32, viewport_width: f32) -> Option<String> {
        self.sections
            .observe(section, visible_ratio, viewport_width)
            .map(str::to_string)
    }

    #[wasm_bindgen(getter)]
    pub fn active(&self) -> String {
        self.sections.active().to_string()
    }

    pub fn on_scroll(&mut self, viewport_width: f32) {
        self.mobile.on_scroll(viewport_width);
    }

    /// Advance by `dt_ms`. Returns true when the mobile nav just hid.
    pub fn tick(&mut self, dt_ms: f64) -> bool {
        self.mobile.tick(frame_delta(dt_ms))
    }

    #[wasm_bindgen(getter)]
    pub fn nav_visible(&self) -> bool {
        self.mobile.is_visible()
    }

    /// Drop the pending hide timer when the page unmounts
    pub fn dispose(&mut self) {
        self.mobile.cancel();
    }
}

/// Negative and NaN deltas count as no time, huge ones saturate
fn frame_delta(dt_ms: f64) -> Duration {
    if dt_ms.is_nan() || dt_ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(dt_ms / 1000.0).unwrap_or(Duration::MAX)
}
