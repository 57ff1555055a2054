//! Folio Core - Avatar state machine and supporting types
//!
//! This crate holds everything about the portfolio avatar that does not
//! need a renderer:
//! - Animation states and the per-profile transition table
//! - Cancellable single-shot timers driven by frame deltas
//! - Monotonic asset load progress
//! - Explicit listener registration for controller events
//! - Scroll-driven section highlighting for the page navigation

pub mod controller;
pub mod error;
pub mod listener;
pub mod navigation;
pub mod profile;
pub mod progress;
pub mod state;
pub mod timer;

pub use controller::{AvatarController, ControllerEvent, Phase, Transition};
pub use error::{AssetLoadFailure, ProfileError};
pub use listener::{ListenerId, Listeners};
pub use navigation::{MobileNav, Section, SectionTracker};
pub use profile::{AvatarProfile, CameraFraming, StageSpec};
pub use progress::LoadProgress;
pub use state::{AvatarState, StateSpec, TimerRule, Trigger};
pub use timer::TimerSlot;
