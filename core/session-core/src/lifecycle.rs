//! Session lifecycle: the state machine that ties the pieces together.
//!
//! ```text
//! user input ──► ActivityTracker ──► SessionState ◄── SessionLifecycle ◄── Timers ◄── driver
//!                                         │                 │
//!                                    SessionStore     TimeoutMonitor / WarningCountdown
//! ```
//!
//! Two periodic timers run on the same cooperative loop: the monitor tick
//! (every `monitor_interval_secs`) and, only while in `Warning`, the
//! one-second countdown tick. Both expiry paths end in [`SessionLifecycle::terminate`],
//! which is guarded so only the first trigger performs the logout; any later
//! trigger finds the session already ended and emits nothing.
//!
//! Every public entry point first fires timers that became due before it,
//! so user input is always ordered after the ticks that preceded it.

use portal_protocol::{ProfilePatch, StudentProfile};
use tracing::{debug, info};

use crate::activity::{ActivityTracker, InteractionKind};
use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::countdown::{CountdownTick, WarningCountdown};
use crate::monitor::{MonitorVerdict, TimeoutMonitor};
use crate::restore::{evaluate_restore, RestoreOutcome};
use crate::state::{
    LifecycleEvent, NavigationIntent, Persist, SessionPhase, SessionSnapshot, SessionState,
    SessionStore, TerminationReason,
};
use crate::timers::{TimerKind, Timers};

const COUNTDOWN_TICK_MS: i64 = 1_000;

pub struct SessionLifecycle<C, S> {
    config: SessionConfig,
    clock: C,
    state: SessionState<S>,
    tracker: ActivityTracker,
    monitor: TimeoutMonitor,
    countdown: WarningCountdown,
    timers: Timers,
    phase: SessionPhase,
}

impl<C: Clock, S: SessionStore> SessionLifecycle<C, S> {
    pub fn new(config: SessionConfig, clock: C, store: S) -> Self {
        Self {
            tracker: ActivityTracker::new(config.persist_coalesce_ms),
            monitor: TimeoutMonitor::from_config(&config),
            countdown: WarningCountdown::new(config.countdown_secs),
            timers: Timers::new(),
            phase: SessionPhase::SignedOut,
            state: SessionState::new(store),
            clock,
            config,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState<S> {
        &self.state
    }

    pub fn profile(&self) -> &StudentProfile {
        self.state.profile()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn countdown_remaining(&self) -> Option<u32> {
        self.countdown.remaining()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.is_attached()
    }

    pub fn is_timer_armed(&self, kind: TimerKind) -> bool {
        self.timers.is_armed(kind)
    }

    /// When the driver should call [`Self::run_pending`] next.
    pub fn next_due_at(&self) -> Option<i64> {
        self.timers.next_due().map(|(due_at, _)| due_at)
    }

    /// Milliseconds since the last recognized activity, or `None` while signed out.
    pub fn inactivity_ms(&self) -> Option<i64> {
        self.state
            .is_authenticated()
            .then(|| (self.clock.now_ms() - self.state.last_activity_at()).max(0))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session entry
    // ─────────────────────────────────────────────────────────────────────

    /// Starts a session for a freshly authenticated profile.
    pub fn login(&mut self, profile: StudentProfile) -> Vec<LifecycleEvent> {
        let mut events = self.run_pending();
        let now = self.clock.now_ms();

        self.state
            .set_identity(&ProfilePatch::from_profile(&profile), now);
        self.start_monitoring(now);
        info!(roll_no = %profile.roll_no, "Session started");

        events.push(self.dashboard_intent());
        events
    }

    /// Resumes a persisted session, keeping its original inactivity baseline.
    /// A no-op while a session is already live.
    pub fn restore(
        &mut self,
        snapshot: SessionSnapshot,
        last_activity_at: i64,
    ) -> Vec<LifecycleEvent> {
        let mut events = self.run_pending();
        if self.phase.is_live() {
            debug!(phase = ?self.phase, "Restore ignored; session already live");
            return events;
        }
        let now = self.clock.now_ms();

        self.state.restore(snapshot, last_activity_at.min(now));
        self.start_monitoring(now);
        info!(roll_no = %self.state.profile().roll_no, "Session resumed");

        events.push(self.dashboard_intent());
        events
    }

    /// Applies the restore policy to this lifecycle's own store and resumes
    /// the session when it allows.
    pub fn restore_from_store(&mut self) -> RestoreOutcome {
        if self.phase.is_live() {
            return RestoreOutcome::AlreadyActive;
        }
        let now = self.clock.now_ms();
        let outcome = evaluate_restore(self.state.store_mut(), now, &self.config);
        if let RestoreOutcome::Restored {
            snapshot,
            last_activity_at,
        } = &outcome
        {
            self.restore(snapshot.clone(), *last_activity_at);
        }
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session operations
    // ─────────────────────────────────────────────────────────────────────

    /// Merges fields returned by the backend into the live identity.
    ///
    /// Ignored once the session has ended, so a slow response can't revive
    /// a logged-out session.
    pub fn apply_profile(&mut self, patch: &ProfilePatch) -> Vec<LifecycleEvent> {
        let events = self.run_pending();
        if self.phase.is_live() {
            let now = self.clock.now_ms();
            self.state.set_identity(patch, now);
        } else {
            debug!(phase = ?self.phase, "Dropping profile update for ended session");
        }
        events
    }

    /// Explicit activity refresh (e.g. a successful API round trip).
    pub fn refresh_activity(&mut self) -> Vec<LifecycleEvent> {
        let events = self.run_pending();
        if self.phase.is_live() {
            let now = self.clock.now_ms();
            self.state.refresh_activity(now, Persist::Now);
        }
        events
    }

    /// Feeds one user interaction to the tracker.
    ///
    /// During `Warning` this refreshes the timestamp but keeps the countdown
    /// running; only [`Self::stay_logged_in`] dismisses the warning.
    pub fn record_interaction(&mut self, kind: InteractionKind) -> Vec<LifecycleEvent> {
        let events = self.run_pending();
        let now = self.clock.now_ms();
        self.tracker.observe(kind, &mut self.state, now);
        events
    }

    /// "Stay logged in": cancels the countdown and restarts the inactivity
    /// budget from now.
    pub fn stay_logged_in(&mut self) -> Vec<LifecycleEvent> {
        let mut events = self.run_pending();
        let now = self.clock.now_ms();

        match self.phase {
            SessionPhase::Warning => {
                self.cancel_countdown();
                self.state.refresh_activity(now, Persist::Now);
                self.phase = SessionPhase::Active;
                debug!(at = now, "Warning dismissed");
                events.push(LifecycleEvent::WarningDismissed);
            }
            SessionPhase::Active => self.state.refresh_activity(now, Persist::Now),
            SessionPhase::SignedOut | SessionPhase::Expired => {}
        }
        events
    }

    /// Voluntary logout. A no-op when no session is live.
    pub fn logout(&mut self) -> Vec<LifecycleEvent> {
        let mut events = self.run_pending();
        events.extend(self.terminate(TerminationReason::Voluntary));
        events
    }

    /// Sends the user to the thank-you screen and logs them out shortly after.
    pub fn schedule_farewell_logout(&mut self) -> Vec<LifecycleEvent> {
        let mut events = self.run_pending();
        if !self.phase.is_live() {
            return events;
        }
        let now = self.clock.now_ms();
        let delay_ms = i64::try_from(self.config.farewell_delay_ms).unwrap_or(i64::MAX);
        self.timers.arm_once(TimerKind::Farewell, now, delay_ms);
        debug!(delay_ms, "Farewell logout scheduled");
        events.push(LifecycleEvent::Navigate(NavigationIntent::ThankYou));
        events
    }

    // ─────────────────────────────────────────────────────────────────────
    // Timer dispatch
    // ─────────────────────────────────────────────────────────────────────

    /// Fires every timer due up to the clock's current time, in order.
    pub fn run_pending(&mut self) -> Vec<LifecycleEvent> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        while let Some((due_at, kind)) = self.timers.pop_due(now) {
            match kind {
                TimerKind::Monitor => events.extend(self.on_monitor_tick(due_at)),
                TimerKind::Countdown => events.extend(self.on_countdown_tick()),
                TimerKind::Farewell => events.extend(self.terminate(TerminationReason::Farewell)),
            }
        }
        events
    }

    fn on_monitor_tick(&mut self, at: i64) -> Vec<LifecycleEvent> {
        self.state.flush_activity();
        self.state.sync_activity_from_store();
        let inactivity_ms = (at - self.state.last_activity_at()).max(0);

        match self.monitor.evaluate(self.phase, inactivity_ms) {
            MonitorVerdict::Steady => Vec::new(),
            MonitorVerdict::EnterWarning => {
                let remaining_secs = self.countdown.start();
                self.timers.arm(TimerKind::Countdown, at, COUNTDOWN_TICK_MS);
                self.phase = SessionPhase::Warning;
                info!(inactivity_ms, remaining_secs, "Session timeout warning");
                vec![LifecycleEvent::WarningStarted { remaining_secs }]
            }
            MonitorVerdict::Expire => self.terminate(TerminationReason::InactivityTimeout),
        }
    }

    fn on_countdown_tick(&mut self) -> Vec<LifecycleEvent> {
        match self.countdown.tick() {
            Some(CountdownTick::Remaining(remaining_secs)) => {
                vec![LifecycleEvent::CountdownTick { remaining_secs }]
            }
            Some(CountdownTick::Elapsed) => self.terminate(TerminationReason::CountdownElapsed),
            None => {
                self.timers.cancel(TimerKind::Countdown);
                Vec::new()
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn start_monitoring(&mut self, now: i64) {
        self.cancel_countdown();
        self.timers.cancel(TimerKind::Farewell);
        self.timers
            .arm(TimerKind::Monitor, now, self.config.monitor_interval_ms());
        self.tracker.attach();
        self.phase = SessionPhase::Active;
    }

    fn cancel_countdown(&mut self) {
        self.countdown.cancel();
        self.timers.cancel(TimerKind::Countdown);
    }

    /// The only path that ends a session. Stops every timer and detaches the
    /// tracker before clearing state; returns no events if already ended.
    fn terminate(&mut self, reason: TerminationReason) -> Vec<LifecycleEvent> {
        if !self.phase.is_live() {
            debug!(?reason, phase = ?self.phase, "Termination ignored; session already ended");
            return Vec::new();
        }

        self.timers.cancel_all();
        self.countdown.cancel();
        self.tracker.detach();
        let roll_no = self.state.profile().roll_no.clone();
        self.state.logout();
        self.phase = if reason.is_forced() {
            SessionPhase::Expired
        } else {
            SessionPhase::SignedOut
        };
        info!(roll_no = %roll_no, ?reason, "Session ended");

        vec![
            LifecycleEvent::Terminated { reason },
            LifecycleEvent::Navigate(NavigationIntent::Login),
        ]
    }

    fn dashboard_intent(&self) -> LifecycleEvent {
        LifecycleEvent::Navigate(NavigationIntent::Dashboard {
            roll_no: self.state.profile().roll_no.clone(),
        })
    }
}
