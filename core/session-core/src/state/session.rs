//! The single source of truth for identity, authentication, and activity.
//!
//! Owned by [`crate::SessionLifecycle`]; nothing else holds a mutable
//! reference. Mutation happens only through `set_identity`, `restore`,
//! `refresh_activity`, and `logout`. Storage failures are logged and
//! swallowed: persistence is best effort and never changes the in-memory
//! outcome.

use portal_protocol::{ProfilePatch, StudentProfile};
use tracing::{debug, warn};

use super::store::SessionStore;
use super::types::SessionSnapshot;

/// Whether an activity refresh is written through immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    Now,
    /// Keep the write pending until the next flush.
    Deferred,
}

#[derive(Debug)]
pub struct SessionState<S> {
    profile: StudentProfile,
    authenticated: bool,
    last_activity_at: i64,
    activity_pending: bool,
    store: S,
}

impl<S: SessionStore> SessionState<S> {
    /// Unauthenticated state with an empty identity.
    pub fn new(store: S) -> Self {
        Self {
            profile: StudentProfile::default(),
            authenticated: false,
            last_activity_at: 0,
            activity_pending: false,
            store,
        }
    }

    pub fn profile(&self) -> &StudentProfile {
        &self.profile
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn last_activity_at(&self) -> i64 {
        self.last_activity_at
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Merges `patch` into the identity, marks the session authenticated, and
    /// refreshes activity. Persists the non-secret projection.
    pub fn set_identity(&mut self, patch: &ProfilePatch, now: i64) {
        self.profile.apply(patch);
        self.authenticated = true;
        self.bump_activity(now);
        self.persist_snapshot(now);
        self.persist_activity();
        debug!(
            roll_no = %self.profile.roll_no,
            fields = ?patch.changed_fields(),
            "Session identity updated"
        );
    }

    /// Re-enters a previously persisted session. The inactivity baseline is
    /// the persisted timestamp, not `now`, so the remaining budget carries
    /// over from before the reload.
    pub fn restore(&mut self, snapshot: SessionSnapshot, last_activity_at: i64) {
        self.profile = snapshot.profile;
        self.authenticated = true;
        self.last_activity_at = last_activity_at;
        self.activity_pending = false;
        debug!(
            roll_no = %self.profile.roll_no,
            last_activity_at,
            "Session restored from storage"
        );
    }

    /// Sets the last-activity timestamp. Ignored while unauthenticated.
    pub fn refresh_activity(&mut self, now: i64, persist: Persist) {
        if !self.authenticated {
            return;
        }
        self.bump_activity(now);
        match persist {
            Persist::Now => self.persist_activity(),
            Persist::Deferred => self.activity_pending = true,
        }
    }

    /// Writes a deferred activity refresh, if any.
    pub fn flush_activity(&mut self) {
        if self.authenticated && self.activity_pending {
            self.persist_activity();
        }
    }

    /// Adopts a newer last-activity timestamp written by another process
    /// sharing the store. The baseline only ever moves forward.
    pub fn sync_activity_from_store(&mut self) {
        if !self.authenticated {
            return;
        }
        match self.store.load_last_activity() {
            Ok(Some(stored)) if stored > self.last_activity_at => {
                debug!(
                    previous = self.last_activity_at,
                    stored, "Adopting newer persisted activity"
                );
                self.bump_activity(stored);
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "Failed to read persisted last activity"),
        }
    }

    /// Clears storage and resets every field. Returns `false` when there was
    /// no session to end.
    pub fn logout(&mut self) -> bool {
        let was_authenticated = self.authenticated;

        if let Err(err) = self.store.clear() {
            warn!(error = %err, "Failed to clear persisted session");
        }
        self.profile = StudentProfile::default();
        self.authenticated = false;
        self.last_activity_at = 0;
        self.activity_pending = false;

        was_authenticated
    }

    /// Non-decreasing while authenticated, even if the clock steps back.
    fn bump_activity(&mut self, now: i64) {
        self.last_activity_at = self.last_activity_at.max(now);
    }

    fn persist_snapshot(&mut self, now: i64) {
        let snapshot = SessionSnapshot::new(self.profile.clone(), now);
        if let Err(err) = self.store.save_snapshot(&snapshot) {
            warn!(error = %err, "Failed to persist session snapshot");
        }
    }

    fn persist_activity(&mut self) {
        self.activity_pending = false;
        if let Err(err) = self.store.save_last_activity(self.last_activity_at) {
            warn!(error = %err, "Failed to persist last activity");
        }
    }
}
