//! Session state and its durable projection.
//!
//! # Module Structure
//!
//! - [`session`]: the in-memory [`SessionState`] and its four mutations
//! - [`store`]: the [`SessionStore`] trait with file-backed and in-memory stores
//! - [`types`]: phases, termination reasons, events, and the persisted snapshot

mod session;
mod store;
pub(crate) mod types;

pub use session::{Persist, SessionState};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::{
    LifecycleEvent, NavigationIntent, SessionPhase, SessionSnapshot, TerminationReason,
    SNAPSHOT_VERSION,
};
