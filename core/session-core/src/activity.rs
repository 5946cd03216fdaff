//! User-presence tracking.
//!
//! The tracker listens for a fixed set of interaction classes while the
//! session is authenticated and refreshes the last-activity timestamp. The
//! in-memory timestamp moves on every interaction; durable writes are
//! coalesced to at most one per `persist_coalesce_ms` and the rest are
//! flushed on the next monitor tick.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::state::{Persist, SessionState, SessionStore};

/// Interaction classes that count as user presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Click,
    KeyPress,
    Scroll,
    PointerMove,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 4] = [
        InteractionKind::Click,
        InteractionKind::KeyPress,
        InteractionKind::Scroll,
        InteractionKind::PointerMove,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::Click => "click",
            InteractionKind::KeyPress => "keypress",
            InteractionKind::Scroll => "scroll",
            InteractionKind::PointerMove => "mousemove",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "click" => Ok(InteractionKind::Click),
            "keypress" | "key" => Ok(InteractionKind::KeyPress),
            "scroll" => Ok(InteractionKind::Scroll),
            "mousemove" | "move" => Ok(InteractionKind::PointerMove),
            other => Err(format!("Unknown interaction: {}", other)),
        }
    }
}

#[derive(Debug)]
pub struct ActivityTracker {
    attached: bool,
    coalesce_ms: i64,
    last_write_at: Option<i64>,
}

impl ActivityTracker {
    pub fn new(coalesce_ms: u64) -> Self {
        Self {
            attached: false,
            coalesce_ms: i64::try_from(coalesce_ms).unwrap_or(i64::MAX),
            last_write_at: None,
        }
    }

    pub fn attach(&mut self) {
        self.attached = true;
        self.last_write_at = None;
    }

    pub fn detach(&mut self) {
        self.attached = false;
        self.last_write_at = None;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Records one interaction. Returns whether it counted.
    pub fn observe<S: SessionStore>(
        &mut self,
        kind: InteractionKind,
        state: &mut SessionState<S>,
        now: i64,
    ) -> bool {
        if !self.attached || !state.is_authenticated() {
            return false;
        }

        let persist = match self.last_write_at {
            Some(previous) if now - previous < self.coalesce_ms => Persist::Deferred,
            _ => {
                self.last_write_at = Some(now);
                Persist::Now
            }
        };
        state.refresh_activity(now, persist);
        trace!(interaction = %kind, at = now, ?persist, "Activity recorded");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemorySessionStore;
    use portal_protocol::ProfilePatch;

    fn signed_in_state() -> SessionState<MemorySessionStore> {
        let mut state = SessionState::new(MemorySessionStore::new());
        state.set_identity(
            &ProfilePatch {
                roll_no: Some("1024".to_string()),
                ..Default::default()
            },
            0,
        );
        state
    }

    #[test]
    fn interaction_kinds_parse_from_dom_names() {
        for kind in InteractionKind::ALL {
            assert_eq!(kind.as_str().parse::<InteractionKind>(), Ok(kind));
        }
        assert!("hover".parse::<InteractionKind>().is_err());
    }

    #[test]
    fn detached_tracker_ignores_interactions() {
        let mut tracker = ActivityTracker::new(0);
        let mut state = signed_in_state();

        assert!(!tracker.observe(InteractionKind::Click, &mut state, 1_000));
        assert_eq!(state.last_activity_at(), 0);
    }

    #[test]
    fn attached_tracker_refreshes_activity() {
        let mut tracker = ActivityTracker::new(0);
        let mut state = signed_in_state();
        tracker.attach();

        assert!(tracker.observe(InteractionKind::Scroll, &mut state, 8_000));
        assert_eq!(state.last_activity_at(), 8_000);
        assert_eq!(state.store().load_last_activity().unwrap(), Some(8_000));
    }

    #[test]
    fn signed_out_state_is_not_refreshed() {
        let mut tracker = ActivityTracker::new(0);
        let mut state = SessionState::new(MemorySessionStore::new());
        tracker.attach();

        assert!(!tracker.observe(InteractionKind::KeyPress, &mut state, 8_000));
        assert_eq!(state.last_activity_at(), 0);
    }

    #[test]
    fn burst_is_coalesced_into_one_write() {
        let mut tracker = ActivityTracker::new(1_000);
        let mut state = signed_in_state();
        tracker.attach();
        let writes = state.store().activity_writes();

        for offset in 0..10 {
            tracker.observe(InteractionKind::PointerMove, &mut state, 5_000 + offset * 50);
        }

        assert_eq!(state.store().activity_writes(), writes + 1);
        assert_eq!(state.last_activity_at(), 5_450);

        state.flush_activity();
        assert_eq!(state.store().load_last_activity().unwrap(), Some(5_450));
    }

    #[test]
    fn writes_resume_after_coalesce_window() {
        let mut tracker = ActivityTracker::new(1_000);
        let mut state = signed_in_state();
        tracker.attach();
        let writes = state.store().activity_writes();

        tracker.observe(InteractionKind::Click, &mut state, 1_000);
        tracker.observe(InteractionKind::Click, &mut state, 2_000);

        assert_eq!(state.store().activity_writes(), writes + 2);
    }
}
