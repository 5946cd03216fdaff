//! Scripted timeline on a manual clock.
//!
//! Steps are whitespace-separated: `wait:<n>{ms,s,m}`, `stay`, `logout`,
//! `login`, or an interaction (`click`, `keypress`, `scroll`, `mousemove`).
//! The session starts signed in at 00:00.

use std::str::FromStr;

use portal_protocol::StudentProfile;
use session_core::{
    Clock, InteractionKind, LifecycleEvent, ManualClock, MemorySessionStore, SessionConfig,
    SessionLifecycle, MS_PER_MINUTE, MS_PER_SEC,
};

use crate::render;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Wait(i64),
    Stay,
    Logout,
    Login,
    Interaction(InteractionKind),
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(amount) = s.strip_prefix("wait:") {
            return parse_wait(amount).map(Step::Wait);
        }
        match s {
            "stay" => Ok(Step::Stay),
            "logout" => Ok(Step::Logout),
            "login" => Ok(Step::Login),
            other => other
                .parse::<InteractionKind>()
                .map(Step::Interaction)
                .map_err(|_| format!("Unknown step '{}'", other)),
        }
    }
}

fn parse_wait(amount: &str) -> Result<i64, String> {
    let (digits, unit_ms) = if let Some(digits) = amount.strip_suffix("ms") {
        (digits, 1)
    } else if let Some(digits) = amount.strip_suffix('s') {
        (digits, MS_PER_SEC)
    } else if let Some(digits) = amount.strip_suffix('m') {
        (digits, MS_PER_MINUTE)
    } else {
        return Err(format!("Wait '{}' needs a unit (ms, s, m)", amount));
    };
    let value: i64 = digits
        .parse()
        .map_err(|_| format!("Invalid wait amount '{}'", amount))?;
    value
        .checked_mul(unit_ms)
        .filter(|ms| *ms >= 0)
        .ok_or_else(|| format!("Wait '{}' is out of range", amount))
}

fn simulated_student() -> StudentProfile {
    StudentProfile {
        roll_no: "SIM-001".to_string(),
        name: "Simulated Student".to_string(),
        ..Default::default()
    }
}

/// Runs the script and returns every event with the instant it fired at.
fn replay(config: &SessionConfig, steps: &[Step]) -> Vec<(i64, LifecycleEvent)> {
    let clock = ManualClock::new(0);
    let mut lifecycle =
        SessionLifecycle::new(config.clone(), clock.clone(), MemorySessionStore::new());
    let mut timeline = Vec::new();

    fn record(at: i64, events: Vec<LifecycleEvent>, timeline: &mut Vec<(i64, LifecycleEvent)>) {
        timeline.extend(events.into_iter().map(|event| (at, event)));
    }
    record(0, lifecycle.login(simulated_student()), &mut timeline);

    for step in steps {
        match step {
            Step::Wait(ms) => {
                let target = clock.now_ms() + ms;
                // Stop at each due timer so every event carries its own instant.
                while let Some(due_at) = lifecycle.next_due_at().filter(|due| *due <= target) {
                    clock.set(due_at);
                    record(due_at, lifecycle.run_pending(), &mut timeline);
                }
                clock.set(target);
            }
            Step::Stay => {
                record(clock.now_ms(), lifecycle.stay_logged_in(), &mut timeline)
            }
            Step::Logout => record(clock.now_ms(), lifecycle.logout(), &mut timeline),
            Step::Login => record(
                clock.now_ms(),
                lifecycle.login(simulated_student()),
                &mut timeline,
            ),
            Step::Interaction(kind) => record(
                clock.now_ms(),
                lifecycle.record_interaction(*kind),
                &mut timeline,
            ),
        }
    }
    timeline
}

pub fn run(config: &SessionConfig, raw_steps: &[String], ticks: bool) -> Result<(), String> {
    let steps = raw_steps
        .iter()
        .flat_map(|raw| raw.split_whitespace())
        .map(str::parse::<Step>)
        .collect::<Result<Vec<_>, _>>()?;

    for (at, event) in replay(config, &steps) {
        if ticks || render::is_notable(&event) {
            println!("[{}] {}", render::clock_offset(at), render::describe(&event));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_core::{NavigationIntent, TerminationReason};

    #[test]
    fn parses_steps() {
        assert_eq!("wait:8m".parse::<Step>(), Ok(Step::Wait(480_000)));
        assert_eq!("wait:30s".parse::<Step>(), Ok(Step::Wait(30_000)));
        assert_eq!("wait:250ms".parse::<Step>(), Ok(Step::Wait(250)));
        assert_eq!(
            "click".parse::<Step>(),
            Ok(Step::Interaction(InteractionKind::Click))
        );
        assert!("wait:8".parse::<Step>().is_err());
        assert!("wait:-1s".parse::<Step>().is_err());
        assert!("jump".parse::<Step>().is_err());
    }

    #[test]
    fn idle_timeline_warns_then_expires() {
        let timeline = replay(&SessionConfig::default(), &[Step::Wait(11 * MS_PER_MINUTE)]);

        let warning = timeline
            .iter()
            .find(|(_, event)| matches!(event, LifecycleEvent::WarningStarted { .. }));
        assert_eq!(warning.map(|(at, _)| *at), Some(9 * MS_PER_MINUTE));

        let (ended_at, _) = timeline
            .iter()
            .find(|(_, event)| matches!(event, LifecycleEvent::Terminated { .. }))
            .expect("terminated");
        assert_eq!(*ended_at, 10 * MS_PER_MINUTE);
        assert_eq!(
            timeline.last().map(|(_, event)| event),
            Some(&LifecycleEvent::Navigate(NavigationIntent::Login))
        );
    }

    #[test]
    fn stay_then_logout_timeline() {
        let steps = [
            Step::Wait(9 * MS_PER_MINUTE + 30 * MS_PER_SEC),
            Step::Stay,
            Step::Wait(MS_PER_MINUTE),
            Step::Logout,
        ];
        let timeline = replay(&SessionConfig::default(), &steps);

        assert!(timeline.contains(&(570_000, LifecycleEvent::WarningDismissed)));
        assert!(timeline.contains(&(
            630_000,
            LifecycleEvent::Terminated {
                reason: TerminationReason::Voluntary
            }
        )));
    }
}
