//! Session restoration policy.
//!
//! Decides whether a persisted session may be resumed after a reload. The
//! threshold is the same `timeout_minutes` the live monitor enforces: a
//! session that would already have expired had the client kept running is
//! never resumed. Anything not restorable is cleared from storage.

use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::state::{SessionSnapshot, SessionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored {
        snapshot: SessionSnapshot,
        last_activity_at: i64,
    },
    /// Nothing (or only half a session) was stored.
    Missing,
    Stale {
        inactive_ms: i64,
    },
    /// Stored data could not be read.
    Corrupt,
    /// A session is already live; storage was not consulted.
    AlreadyActive,
}

impl RestoreOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, RestoreOutcome::Restored { .. })
    }
}

pub fn evaluate_restore<S: SessionStore>(
    store: &mut S,
    now: i64,
    config: &SessionConfig,
) -> RestoreOutcome {
    let loaded = store
        .load_snapshot()
        .and_then(|snapshot| Ok((snapshot, store.load_last_activity()?)));

    let (snapshot, last_activity_at) = match loaded {
        Ok((Some(snapshot), Some(last_activity_at))) => (snapshot, last_activity_at),
        Ok((None, None)) => return RestoreOutcome::Missing,
        Ok(_) => {
            debug!("Discarding partial stored session");
            clear_quietly(store);
            return RestoreOutcome::Missing;
        }
        Err(err) => {
            warn!(error = %err, "Stored session unreadable; clearing");
            clear_quietly(store);
            return RestoreOutcome::Corrupt;
        }
    };

    let inactive_ms = (now - last_activity_at).max(0);
    if inactive_ms >= config.timeout_ms() {
        debug!(inactive_ms, "Stored session is stale; clearing");
        clear_quietly(store);
        return RestoreOutcome::Stale { inactive_ms };
    }

    RestoreOutcome::Restored {
        snapshot,
        last_activity_at: last_activity_at.min(now),
    }
}

fn clear_quietly<S: SessionStore>(store: &mut S) {
    if let Err(err) = store.clear() {
        warn!(error = %err, "Failed to clear stored session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FileSessionStore, MemorySessionStore};
    use crate::storage::StorageConfig;
    use portal_protocol::StudentProfile;

    const MINUTE: i64 = 60_000;

    fn seeded_store(last_activity_at: i64) -> MemorySessionStore {
        let mut store = MemorySessionStore::new();
        let snapshot = SessionSnapshot::new(
            StudentProfile {
                roll_no: "1024".to_string(),
                ..Default::default()
            },
            0,
        );
        store.save_snapshot(&snapshot).expect("save");
        store.save_last_activity(last_activity_at).expect("save");
        store
    }

    #[test]
    fn empty_store_is_missing() {
        let mut store = MemorySessionStore::new();
        let outcome = evaluate_restore(&mut store, 0, &SessionConfig::default());
        assert_eq!(outcome, RestoreOutcome::Missing);
    }

    #[test]
    fn recent_session_is_restored() {
        let mut store = seeded_store(0);
        let outcome = evaluate_restore(&mut store, 3 * MINUTE, &SessionConfig::default());

        match outcome {
            RestoreOutcome::Restored {
                snapshot,
                last_activity_at,
            } => {
                assert_eq!(snapshot.profile.roll_no, "1024");
                assert_eq!(last_activity_at, 0);
            }
            other => panic!("expected restore, got {:?}", other),
        }
    }

    #[test]
    fn session_just_under_timeout_is_restored() {
        let mut store = seeded_store(0);
        let outcome = evaluate_restore(&mut store, 10 * MINUTE - 1, &SessionConfig::default());
        assert!(outcome.is_restored());
    }

    #[test]
    fn session_at_timeout_is_stale_and_cleared() {
        let mut store = seeded_store(0);
        let outcome = evaluate_restore(&mut store, 10 * MINUTE, &SessionConfig::default());

        assert_eq!(
            outcome,
            RestoreOutcome::Stale {
                inactive_ms: 10 * MINUTE
            }
        );
        assert!(store.load_snapshot().unwrap().is_none());
        assert!(store.load_last_activity().unwrap().is_none());
    }

    #[test]
    fn future_timestamp_is_clamped_to_now() {
        let mut store = seeded_store(5 * MINUTE);
        let outcome = evaluate_restore(&mut store, MINUTE, &SessionConfig::default());

        assert!(matches!(
            outcome,
            RestoreOutcome::Restored {
                last_activity_at,
                ..
            } if last_activity_at == MINUTE
        ));
    }

    #[test]
    fn snapshot_without_activity_is_discarded() {
        let mut store = MemorySessionStore::new();
        store
            .save_snapshot(&SessionSnapshot::new(StudentProfile::default(), 0))
            .expect("save");

        let outcome = evaluate_restore(&mut store, 0, &SessionConfig::default());
        assert_eq!(outcome, RestoreOutcome::Missing);
        assert!(store.load_snapshot().unwrap().is_none());
    }

    #[test]
    fn unreadable_file_store_is_corrupt_and_cleared() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let storage = StorageConfig::with_root(temp_dir.path().join("portal"));
        std::fs::create_dir_all(temp_dir.path().join("portal")).expect("create root");
        std::fs::write(storage.session_file(), "{not json").expect("write session");
        std::fs::write(
            storage.last_activity_file(),
            r#"{ "last_activity_at": 1769817600000 }"#,
        )
        .expect("write activity");

        let mut store = FileSessionStore::new(&storage);
        let outcome = evaluate_restore(&mut store, 1_769_817_660_000, &SessionConfig::default());

        assert_eq!(outcome, RestoreOutcome::Corrupt);
        assert!(!storage.session_file().exists());
        assert!(!storage.last_activity_file().exists());
    }
}
