//! Scroll-driven navigation highlighting
//!
//! The host page reports how much of each section is visible (for example
//! from an intersection observer). A section becomes the active nav item
//! once its visible ratio reaches its threshold. On narrow viewports the
//! nav is shown while scrolling and hidden shortly after scrolling stops.

use std::time::Duration;

use crate::timer::TimerSlot;

/// Viewport width below which the mobile nav overlay is used
pub const MOBILE_BREAKPOINT: f32 = 640.0;
/// Viewport width below which tall sections use a lower threshold
pub const NARROW_BREAKPOINT: f32 = 800.0;
/// How long the mobile nav stays visible after the last scroll
pub const MOBILE_NAV_LINGER: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Element id the nav item scrolls to
    pub id: String,
    pub name: String,
    /// Visible ratio needed to become active
    pub threshold: f32,
    /// Threshold used on narrow viewports, if different
    pub narrow_threshold: Option<f32>,
}

impl Section {
    pub fn new(name: &str, threshold: f32) -> Self {
        Self {
            id: name.to_lowercase(),
            name: name.to_string(),
            threshold,
            narrow_threshold: None,
        }
    }

    pub fn narrow(mut self, threshold: f32) -> Self {
        self.narrow_threshold = Some(threshold);
        self
    }

    pub fn threshold_for(&self, viewport_width: f32) -> f32 {
        match self.narrow_threshold {
            Some(narrow) if viewport_width < NARROW_BREAKPOINT => narrow,
            _ => self.threshold,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionTracker {
    sections: Vec<Section>,
    active: String,
}

impl Default for SectionTracker {
    /// The portfolio page: home, resume, services, projects, contact
    fn default() -> Self {
        Self::new(vec![
            Section::new("Home", 0.6),
            Section::new("Resume", 0.2),
            Section::new("Services", 0.6),
            Section::new("Projects", 0.6).narrow(0.1),
            Section::new("Contact", 0.6),
        ])
    }
}

impl SectionTracker {
    /// The first section starts active
    pub fn new(sections: Vec<Section>) -> Self {
        let active = sections
            .first()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        Self { sections, active }
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Report a section's visible ratio. Returns the new active section name
    /// when it changed.
    pub fn observe(&mut self, name: &str, visible_ratio: f32, viewport_width: f32) -> Option<&str> {
        let section = self.section(name)?;
        if visible_ratio < section.threshold_for(viewport_width) || section.name == self.active {
            return None;
        }
        self.active = section.name.clone();
        tracing::debug!(section = %self.active, "Active section changed");
        Some(&self.active)
    }
}

/// Auto-hiding nav overlay for narrow viewports
#[derive(Debug, Clone)]
pub struct MobileNav {
    visible: bool,
    hide: TimerSlot<()>,
}

impl Default for MobileNav {
    fn default() -> Self {
        Self {
            visible: true,
            hide: TimerSlot::new(),
        }
    }
}

impl MobileNav {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// A scroll event happened. Wide viewports keep their sidebar and are
    /// not affected.
    pub fn on_scroll(&mut self, viewport_width: f32) {
        if viewport_width >= MOBILE_BREAKPOINT {
            return;
        }
        self.visible = true;
        self.hide.arm(MOBILE_NAV_LINGER, ());
    }

    /// Advance time. Returns true when the overlay just hid.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if self.hide.advance(dt).is_some() {
            self.visible = false;
            return true;
        }
        false
    }

    /// Drop the pending hide, e.g. when the page unmounts
    pub fn cancel(&mut self) {
        self.hide.cancel();
    }
}
