//! Session lifecycle types shared by the state, monitor, and lifecycle modules.

use portal_protocol::StudentProfile;
use serde::{Deserialize, Serialize};

/// On-disk snapshot version. Files with another version are treated as absent.
pub const SNAPSHOT_VERSION: u32 = 1;

// -----------------------------------------------------------------------------
// Phase transitions (driven by SessionLifecycle)
//
// SignedOut --login/restore--------------------------> Active
// Active    --inactivity >= timeout - 1 min-----------> Warning
// Warning   --stay logged in--------------------------> Active
// Warning   --countdown zero | inactivity >= timeout--> Expired
// Active    --inactivity >= timeout-------------------> Expired
// Active|Warning --logout | farewell------------------> SignedOut
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session; the monitor is not running.
    SignedOut,
    Active,
    /// Countdown visible; the user may still stay logged in.
    Warning,
    /// Ended by the system due to inactivity.
    Expired,
}

impl SessionPhase {
    pub fn is_live(self) -> bool {
        matches!(self, SessionPhase::Active | SessionPhase::Warning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// User chose to log out.
    Voluntary,
    /// Monitor saw inactivity reach the timeout.
    InactivityTimeout,
    /// Warning countdown reached zero.
    CountdownElapsed,
    /// Automatic logout after the verification flow finished.
    Farewell,
}

impl TerminationReason {
    /// True when the system, not the user, ended the session.
    pub fn is_forced(self) -> bool {
        matches!(
            self,
            TerminationReason::InactivityTimeout | TerminationReason::CountdownElapsed
        )
    }
}

/// Where the surrounding application should send the user next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum NavigationIntent {
    Login,
    Dashboard { roll_no: String },
    ThankYou,
}

/// Everything observable the lifecycle emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    WarningStarted { remaining_secs: u32 },
    CountdownTick { remaining_secs: u32 },
    WarningDismissed,
    Terminated { reason: TerminationReason },
    Navigate(NavigationIntent),
}

/// Persisted projection of the session. Holds no credential material; the
/// login password never leaves [`portal_protocol::LoginRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub profile: StudentProfile,
    pub saved_at: i64,
}

impl SessionSnapshot {
    pub fn new(profile: StudentProfile, saved_at: i64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            profile,
            saved_at,
        }
    }
}
