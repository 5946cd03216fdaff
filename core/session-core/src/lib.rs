//! # session-core
//!
//! Session lifecycle for the student self-service portal: who is signed in,
//! when they were last active, and when an idle session must end.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Timers are a table of due instants
//!   driven by whoever owns the loop ([`SessionLifecycle::run_pending`]).
//! - **Injectable time**: Every decision reads a [`Clock`]. Tests use
//!   [`ManualClock`] and never sleep.
//! - **One exit**: Voluntary logout, inactivity expiry, countdown expiry,
//!   and the post-verification farewell all end the session through one
//!   guarded path, so a second trigger is a no-op.
//! - **Best-effort persistence**: Storage failures are logged, never fatal.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use session_core::{SessionConfig, SessionLifecycle, StorageConfig, FileSessionStore, SystemClock};
//!
//! let storage = StorageConfig::default();
//! let mut lifecycle = SessionLifecycle::new(
//!     SessionConfig::default(),
//!     SystemClock,
//!     FileSessionStore::new(&storage),
//! );
//! lifecycle.restore_from_store();
//! let events = lifecycle.run_pending();
//! ```

pub mod activity;
pub mod api;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod diff;
pub mod error;
pub mod lifecycle;
pub mod monitor;
pub mod otp;
pub mod patterns;
pub mod portal;
pub mod restore;
pub mod state;
pub mod storage;
pub mod timers;

pub use activity::{ActivityTracker, InteractionKind};
pub use api::{HttpPortalApi, PortalApi};
pub use clock::{Clock, ManualClock, SystemClock, MS_PER_MINUTE, MS_PER_SEC};
pub use config::{load_config, SessionConfig};
pub use countdown::{CountdownTick, WarningCountdown};
pub use diff::{diff_profile, verification_after_update};
pub use error::{PortalError, Result};
pub use lifecycle::SessionLifecycle;
pub use monitor::{MonitorVerdict, TimeoutMonitor};
pub use otp::{normalize_mobile_number, ApiOtpProvider, OtpFlow, OtpProvider};
pub use portal::{PortalService, UpdateOutcome};
pub use restore::{evaluate_restore, RestoreOutcome};
pub use state::{
    FileSessionStore, LifecycleEvent, MemorySessionStore, NavigationIntent, Persist,
    SessionPhase, SessionSnapshot, SessionState, SessionStore, TerminationReason,
};
pub use storage::StorageConfig;
pub use timers::{TimerKind, Timers};
