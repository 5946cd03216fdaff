//! Inactivity evaluation.
//!
//! Pure: given the current phase and elapsed inactivity, decide what the
//! lifecycle should do. Sampling cadence and side effects belong to
//! [`crate::SessionLifecycle`].

use crate::config::SessionConfig;
use crate::state::SessionPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorVerdict {
    Steady,
    EnterWarning,
    Expire,
}

#[derive(Debug, Clone, Copy)]
pub struct TimeoutMonitor {
    warning_after_ms: i64,
    timeout_ms: i64,
}

impl TimeoutMonitor {
    pub fn new(warning_after_ms: i64, timeout_ms: i64) -> Self {
        Self {
            warning_after_ms,
            timeout_ms,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.warning_after_ms(), config.timeout_ms())
    }

    /// Inactivity reaching the timeout expires the session from either live
    /// phase, so a coarse tick that skips the warning window still ends it.
    pub fn evaluate(&self, phase: SessionPhase, inactivity_ms: i64) -> MonitorVerdict {
        if !phase.is_live() {
            return MonitorVerdict::Steady;
        }
        if inactivity_ms >= self.timeout_ms {
            return MonitorVerdict::Expire;
        }
        if phase == SessionPhase::Active && inactivity_ms >= self.warning_after_ms {
            return MonitorVerdict::EnterWarning;
        }
        MonitorVerdict::Steady
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    fn monitor() -> TimeoutMonitor {
        TimeoutMonitor::from_config(&SessionConfig::default())
    }

    #[test]
    fn active_below_warning_threshold_is_steady() {
        assert_eq!(
            monitor().evaluate(SessionPhase::Active, 9 * MINUTE - 1),
            MonitorVerdict::Steady
        );
    }

    #[test]
    fn active_at_warning_threshold_warns() {
        assert_eq!(
            monitor().evaluate(SessionPhase::Active, 9 * MINUTE),
            MonitorVerdict::EnterWarning
        );
    }

    #[test]
    fn warning_does_not_rewarn() {
        assert_eq!(
            monitor().evaluate(SessionPhase::Warning, 9 * MINUTE + 30_000),
            MonitorVerdict::Steady
        );
    }

    #[test]
    fn warning_at_timeout_expires() {
        assert_eq!(
            monitor().evaluate(SessionPhase::Warning, 10 * MINUTE),
            MonitorVerdict::Expire
        );
    }

    #[test]
    fn active_past_timeout_expires_without_warning() {
        assert_eq!(
            monitor().evaluate(SessionPhase::Active, 25 * MINUTE),
            MonitorVerdict::Expire
        );
    }

    #[test]
    fn ended_phases_are_steady() {
        assert_eq!(
            monitor().evaluate(SessionPhase::SignedOut, 60 * MINUTE),
            MonitorVerdict::Steady
        );
        assert_eq!(
            monitor().evaluate(SessionPhase::Expired, 60 * MINUTE),
            MonitorVerdict::Steady
        );
    }
}
