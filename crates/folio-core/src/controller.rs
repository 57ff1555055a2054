//! Avatar Interaction Controller
//!
//! Owns the state machine for one mounted avatar: the current state, the
//! single pending timer, load progress and the registered listeners. The
//! renderer feeds it inputs (download progress, load result, frame delta,
//! click hit/miss) and applies the [`Transition`]s it hands back.
//!
//! Phases:
//! - `Loading`: asset in flight, indicator visible, clicks and ticks ignored
//! - `Ready`: exactly one state active, transitions allowed
//! - `Failed`: asset could not be loaded, indicator stays up, nothing retries
//! - `Disposed`: torn down, every input is ignored and no listener is called

use std::time::Duration;
use tracing::{debug, error, info, trace};

use crate::error::{AssetLoadFailure, ProfileError};
use crate::listener::{ListenerId, Listeners};
use crate::profile::AvatarProfile;
use crate::progress::LoadProgress;
use crate::state::{AvatarState, Trigger};
use crate::timer::TimerSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Failed,
    Disposed,
}

/// A state change the renderer must apply as a cross-fade
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// `None` for the very first state after loading
    pub from: Option<AvatarState>,
    pub to: AvatarState,
    /// `None` for the very first state after loading
    pub trigger: Option<Trigger>,
    /// Clip to fade in
    pub clip: String,
    pub blend: Duration,
    pub looping: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Load percent moved (0-100, never decreasing)
    Progress(u8),
    StateChanged(Transition),
    LoadFailed(AssetLoadFailure),
    Disposed,
}

/// Timed exit waiting in the timer slot
#[derive(Debug, Clone, Copy)]
struct Scheduled {
    to: AvatarState,
    blend: Option<Duration>,
}

pub struct AvatarController {
    profile: AvatarProfile,
    phase: Phase,
    state: Option<AvatarState>,
    timer: TimerSlot<Scheduled>,
    progress: LoadProgress,
    listeners: Listeners<ControllerEvent>,
}

impl std::fmt::Debug for AvatarController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarController")
            .field("profile", &self.profile.name)
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("timer", &self.timer.remaining())
            .field("progress", &self.progress.percent())
            .finish()
    }
}

impl AvatarController {
    pub fn new(profile: AvatarProfile) -> Result<Self, ProfileError> {
        profile.validate()?;
        info!(profile = %profile.name, asset = %profile.asset, "Avatar controller created");
        Ok(Self {
            profile,
            phase: Phase::Loading,
            state: None,
            timer: TimerSlot::new(),
            progress: LoadProgress::new(),
            listeners: Listeners::new(),
        })
    }

    pub fn profile(&self) -> &AvatarProfile {
        &self.profile
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current state, `None` until the asset has loaded
    pub fn state(&self) -> Option<AvatarState> {
        self.state
    }

    pub fn progress(&self) -> &LoadProgress {
        &self.progress
    }

    /// Whether a timed transition is pending
    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_armed()
    }

    /// The indicator stays up while loading and forever after a failure
    pub fn shows_loading_indicator(&self) -> bool {
        matches!(self.phase, Phase::Loading | Phase::Failed)
    }

    pub fn subscribe<F>(&mut self, callback: F) -> Option<ListenerId>
    where
        F: FnMut(&ControllerEvent) + Send + Sync + 'static,
    {
        if self.phase == Phase::Disposed {
            return None;
        }
        Some(self.listeners.subscribe(callback))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Download progress in bytes. `total` is `None` when the size is unknown.
    pub fn on_progress(&mut self, loaded: u64, total: Option<u64>) {
        if self.phase != Phase::Loading {
            return;
        }
        if self.progress.update(loaded, total) {
            let percent = self.progress.percent();
            trace!(loaded, ?total, percent, "Avatar load progress");
            self.listeners.emit(&ControllerEvent::Progress(percent));
        }
    }

    /// The asset is decoded and in the scene. Returns the initial state.
    pub fn on_loaded(&mut self) -> Option<Transition> {
        if self.phase != Phase::Loading {
            return None;
        }
        if self.progress.complete() {
            self.listeners.emit(&ControllerEvent::Progress(100));
        }
        self.phase = Phase::Ready;
        info!(profile = %self.profile.name, "Avatar loaded");

        let initial = self.profile.initial;
        self.enter(initial, None, None)
    }

    /// The asset could not be loaded. Logged only; the indicator stays up.
    pub fn on_load_failed(&mut self, failure: AssetLoadFailure) {
        if self.phase != Phase::Loading {
            return;
        }
        error!("{}", failure);
        self.phase = Phase::Failed;
        self.listeners.emit(&ControllerEvent::LoadFailed(failure));
    }

    /// A click happened; `hit` says whether the pointer ray hit the model.
    pub fn on_click(&mut self, hit: bool) -> Option<Transition> {
        if !hit || self.phase != Phase::Ready {
            return None;
        }
        let current = self.state?;
        let Some(to) = self
            .profile
            .spec(current)
            .and_then(|spec| spec.target(Trigger::Click))
        else {
            trace!(state = %current, "Click ignored in this state");
            return None;
        };
        self.enter(to, Some(Trigger::Click), None)
    }

    /// Advance timers by one frame. Fires at most one timed transition.
    pub fn tick(&mut self, dt: Duration) -> Option<Transition> {
        if self.phase != Phase::Ready {
            return None;
        }
        let scheduled = self.timer.advance(dt)?;
        self.enter(scheduled.to, Some(Trigger::Elapsed), scheduled.blend)
    }

    /// Tear down: cancel the pending timer and drop every listener.
    pub fn dispose(&mut self) {
        if self.phase == Phase::Disposed {
            return;
        }
        if self.timer.cancel() {
            debug!("Cancelled pending avatar timer on dispose");
        }
        self.listeners.emit(&ControllerEvent::Disposed);
        self.listeners.clear();
        self.phase = Phase::Disposed;
        info!(profile = %self.profile.name, "Avatar controller disposed");
    }

    fn enter(
        &mut self,
        to: AvatarState,
        trigger: Option<Trigger>,
        blend_override: Option<Duration>,
    ) -> Option<Transition> {
        self.timer.cancel();

        let Some(spec) = self.profile.spec(to) else {
            error!(state = %to, "No state entry; transition dropped");
            return None;
        };

        if let Some(rule) = &spec.after {
            self.timer.arm(
                rule.delay(),
                Scheduled {
                    to: rule.to,
                    blend: rule.blend_duration(),
                },
            );
        }

        let transition = Transition {
            from: self.state,
            to,
            trigger,
            clip: spec.clip.clone(),
            blend: blend_override.unwrap_or_else(|| spec.blend_duration()),
            looping: spec.looping,
        };
        self.state = Some(to);

        debug!(
            from = ?transition.from.map(|s| s.as_str()),
            to = %to,
            clip = %transition.clip,
            blend_ms = transition.blend.as_millis() as u64,
            "Avatar transition"
        );
        self.listeners
            .emit(&ControllerEvent::StateChanged(transition.clone()));
        Some(transition)
    }
}

impl Drop for AvatarController {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const FRAME: Duration = Duration::from_millis(16);

    fn ready(profile: AvatarProfile) -> AvatarController {
        let mut controller = AvatarController::new(profile).unwrap();
        controller.on_loaded().unwrap();
        controller
    }

    /// Tick frame by frame for `span`, collecting every transition
    fn run_for(controller: &mut AvatarController, span: Duration) -> Vec<Transition> {
        let mut fired = Vec::new();
        let mut elapsed = Duration::ZERO;
        while elapsed < span {
            if let Some(t) = controller.tick(FRAME) {
                fired.push(t);
            }
            elapsed += FRAME;
        }
        fired
    }

    fn record(controller: &mut AvatarController) -> Arc<Mutex<Vec<ControllerEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        controller
            .subscribe(move |e| sink.lock().unwrap().push(e.clone()))
            .unwrap();
        events
    }

    #[test]
    fn test_initial_state_after_load() {
        let mut controller = AvatarController::new(AvatarProfile::lounge()).unwrap();
        assert_eq!(controller.phase(), Phase::Loading);
        assert!(controller.shows_loading_indicator());
        assert_eq!(controller.state(), None);

        let first = controller.on_loaded().unwrap();
        assert_eq!(first.from, None);
        assert_eq!(first.trigger, None);
        assert_eq!(first.to, AvatarState::Sitting);
        assert_eq!(first.clip, "sitting");
        assert!(!controller.shows_loading_indicator());

        // Loading twice does nothing
        assert!(controller.on_loaded().is_none());
    }

    #[test]
    fn test_click_hit_while_sitting_stands_up() {
        for profile in [AvatarProfile::lounge(), AvatarProfile::pedestal()] {
            let mut controller = ready(profile);
            let t = controller.on_click(true).unwrap();
            assert_eq!(t.from, Some(AvatarState::Sitting));
            assert_eq!(t.to, AvatarState::StandingUp);
            assert_eq!(t.trigger, Some(Trigger::Click));
            assert_eq!(t.clip, "stand");
            assert!(!t.looping);
            assert_eq!(t.blend, Duration::from_secs(1));
            assert_eq!(controller.state(), Some(AvatarState::StandingUp));
        }
    }

    #[test]
    fn test_click_miss_changes_nothing() {
        let mut controller = ready(AvatarProfile::pedestal());
        let remaining = controller.timer.remaining();
        for _ in 0..5 {
            assert!(controller.on_click(false).is_none());
        }
        assert_eq!(controller.state(), Some(AvatarState::Sitting));
        assert_eq!(controller.timer.remaining(), remaining);
    }

    #[test]
    fn test_clicks_ignored_while_loading() {
        let mut controller = AvatarController::new(AvatarProfile::lounge()).unwrap();
        assert!(controller.on_click(true).is_none());
        assert!(controller.tick(Duration::from_secs(120)).is_none());
        assert_eq!(controller.state(), None);
    }

    #[test]
    fn test_standing_up_is_debounced() {
        let mut controller = ready(AvatarProfile::lounge());
        controller.on_click(true).unwrap();

        let remaining = controller.timer.remaining().unwrap();
        assert!(controller.on_click(true).is_none());
        assert!(controller.on_click(true).is_none());
        assert_eq!(controller.state(), Some(AvatarState::StandingUp));
        // Ignored clicks do not restart the timer
        assert_eq!(controller.timer.remaining().unwrap(), remaining);
    }

    #[test]
    fn test_standing_up_settles_exactly_once() {
        let mut controller = ready(AvatarProfile::lounge());
        controller.on_click(true).unwrap();

        let fired = run_for(&mut controller, Duration::from_millis(2100));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].from, Some(AvatarState::StandingUp));
        assert_eq!(fired[0].to, AvatarState::StoodUp);
        assert_eq!(fired[0].trigger, Some(Trigger::Elapsed));
        assert_eq!(controller.state(), Some(AvatarState::StoodUp));
    }

    #[test]
    fn test_idle_cycle_repeats() {
        let mut controller = ready(AvatarProfile::lounge());

        for _ in 0..3 {
            controller.on_click(true).unwrap();
            let fired = run_for(&mut controller, Duration::from_millis(2050));
            assert_eq!(fired.len(), 1);

            // Nothing happens until the idle minute is up
            assert!(run_for(&mut controller, Duration::from_secs(57)).is_empty());
            let fired = run_for(&mut controller, Duration::from_secs(4));
            assert_eq!(fired.len(), 1);
            assert_eq!(fired[0].to, AvatarState::Sitting);

            // Sitting has no timer
            assert!(!controller.has_pending_timer());
            assert!(run_for(&mut controller, Duration::from_secs(120)).is_empty());
        }
    }

    #[test]
    fn test_pedestal_bored_cancels_idle_timer() {
        let mut controller = ready(AvatarProfile::pedestal());
        controller.on_click(true).unwrap();
        run_for(&mut controller, Duration::from_millis(1050));
        assert_eq!(controller.state(), Some(AvatarState::StoodUp));

        // 50s into the idle minute, get bored
        assert!(run_for(&mut controller, Duration::from_secs(50)).is_empty());
        let bored = controller.on_click(true).unwrap();
        assert_eq!(bored.to, AvatarState::Bored);

        // The old sit-down deadline passes without firing
        let fired = run_for(&mut controller, Duration::from_millis(9050));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].to, AvatarState::StoodUp);
        assert_eq!(fired[0].blend, Duration::from_secs_f32(0.9));

        // Back to a fresh idle minute
        assert!(run_for(&mut controller, Duration::from_secs(59)).is_empty());
        let fired = run_for(&mut controller, Duration::from_secs(2));
        assert_eq!(fired[0].to, AvatarState::Sitting);
    }

    #[test]
    fn test_bored_ignores_clicks() {
        let mut controller = ready(AvatarProfile::pedestal());
        controller.on_click(true).unwrap();
        run_for(&mut controller, Duration::from_millis(1050));
        controller.on_click(true).unwrap();
        assert!(controller.on_click(true).is_none());
        assert_eq!(controller.state(), Some(AvatarState::Bored));
    }

    #[test]
    fn test_one_huge_frame_fires_one_transition() {
        let mut controller = ready(AvatarProfile::lounge());
        controller.on_click(true).unwrap();

        let t = controller.tick(Duration::from_secs(3600)).unwrap();
        assert_eq!(t.to, AvatarState::StoodUp);
        // The next state's timer starts fresh
        assert!(controller.has_pending_timer());
        assert_eq!(controller.state(), Some(AvatarState::StoodUp));
    }

    #[test]
    fn test_dispose_cancels_timers_in_every_state() {
        let setups: Vec<fn(&mut AvatarController)> = vec![
            |_| {},
            |c| {
                c.on_click(true);
            },
            |c| {
                c.on_click(true);
                run_for(c, Duration::from_millis(1050));
            },
            |c| {
                c.on_click(true);
                run_for(c, Duration::from_millis(1050));
                c.on_click(true);
            },
        ];

        for setup in setups {
            let mut controller = ready(AvatarProfile::pedestal());
            setup(&mut controller);
            let events = record(&mut controller);

            controller.dispose();
            assert_eq!(controller.phase(), Phase::Disposed);
            assert!(!controller.has_pending_timer());
            assert!(run_for(&mut controller, Duration::from_secs(600)).is_empty());
            assert!(controller.on_click(true).is_none());

            let events = events.lock().unwrap();
            assert_eq!(*events, vec![ControllerEvent::Disposed]);
        }
    }

    #[test]
    fn test_dispose_while_loading() {
        let mut controller = AvatarController::new(AvatarProfile::lounge()).unwrap();
        controller.dispose();
        controller.dispose();
        controller.on_progress(10, Some(10));
        assert!(controller.on_loaded().is_none());
        assert_eq!(controller.state(), None);
        assert!(controller.subscribe(|_| {}).is_none());
    }

    #[test]
    fn test_progress_events_monotonic_and_complete_before_ready() {
        let mut controller = AvatarController::new(AvatarProfile::pedestal()).unwrap();
        let events = record(&mut controller);

        for (loaded, total) in [(0, Some(800)), (200, Some(800)), (150, Some(800)), (800, Some(800))] {
            controller.on_progress(loaded, total);
        }
        controller.on_loaded();

        let events = events.lock().unwrap();
        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                ControllerEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![25, 99, 100]);
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));

        // 100% is reported before the first state change
        let full = events
            .iter()
            .position(|e| *e == ControllerEvent::Progress(100))
            .unwrap();
        let first_state = events
            .iter()
            .position(|e| matches!(e, ControllerEvent::StateChanged(_)))
            .unwrap();
        assert!(full < first_state);
    }

    #[test]
    fn test_load_failure_keeps_indicator() {
        let mut controller = AvatarController::new(AvatarProfile::lounge()).unwrap();
        let events = record(&mut controller);
        controller.on_progress(100, Some(1000));

        let failure = AssetLoadFailure::new("Avatar.glb", "HTTP 404");
        controller.on_load_failed(failure.clone());

        assert_eq!(controller.phase(), Phase::Failed);
        assert!(controller.shows_loading_indicator());
        assert!(controller.on_loaded().is_none());
        assert!(controller.on_click(true).is_none());
        assert_eq!(controller.progress().percent(), 10);
        assert_eq!(
            events.lock().unwrap().last(),
            Some(&ControllerEvent::LoadFailed(failure))
        );
    }

    #[test]
    fn test_unsubscribe_stops_events() {
        let mut controller = AvatarController::new(AvatarProfile::lounge()).unwrap();
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let id = controller
            .subscribe(move |_| *counter.lock().unwrap() += 1)
            .unwrap();

        controller.on_progress(1, Some(2));
        assert!(controller.unsubscribe(id));
        controller.on_loaded();
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_rejects_invalid_profile() {
        let mut profile = AvatarProfile::lounge();
        profile.initial = AvatarState::Bored;
        assert!(AvatarController::new(profile).is_err());

        let mut profile = AvatarProfile::lounge();
        if let Some(rule) = profile
            .states
            .get_mut(&AvatarState::StoodUp)
            .and_then(|spec| spec.after.as_mut())
        {
            rule.secs = 1e20;
        }
        assert!(matches!(
            AvatarController::new(profile),
            Err(ProfileError::InvalidDuration { .. })
        ));
    }
}
