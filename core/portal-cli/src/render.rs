//! Human-readable output for lifecycle events and durations.

use session_core::{LifecycleEvent, NavigationIntent, TerminationReason, MS_PER_SEC};

pub fn describe(event: &LifecycleEvent) -> String {
    match event {
        LifecycleEvent::WarningStarted { remaining_secs } => format!(
            "Your session is about to expire due to inactivity. Logging out in {}s (type `stay` to keep working)",
            remaining_secs
        ),
        LifecycleEvent::CountdownTick { remaining_secs } => {
            format!("Logging out in {}s", remaining_secs)
        }
        LifecycleEvent::WarningDismissed => "Session extended".to_string(),
        LifecycleEvent::Terminated { reason } => match reason {
            TerminationReason::Voluntary => "Logged out".to_string(),
            TerminationReason::InactivityTimeout | TerminationReason::CountdownElapsed => {
                "Session expired due to inactivity".to_string()
            }
            TerminationReason::Farewell => {
                "Verification complete. Logged out".to_string()
            }
        },
        LifecycleEvent::Navigate(intent) => match intent {
            NavigationIntent::Login => "-> login".to_string(),
            NavigationIntent::Dashboard { roll_no } => format!("-> dashboard ({})", roll_no),
            NavigationIntent::ThankYou => "-> thank you".to_string(),
        },
    }
}

/// Whether an event is worth a line of output when ticks are hidden.
pub fn is_notable(event: &LifecycleEvent) -> bool {
    match event {
        LifecycleEvent::CountdownTick { remaining_secs } => {
            *remaining_secs <= 5 || remaining_secs % 15 == 0
        }
        _ => true,
    }
}

pub fn print_events(events: &[LifecycleEvent]) {
    for event in events.iter().filter(|event| is_notable(event)) {
        println!("{}", describe(event));
    }
}

/// `1h 02m`, `9m 05s`, or `42s`.
pub fn duration(ms: i64) -> String {
    let total_secs = ms.max(0) / MS_PER_SEC;
    let (hours, minutes, seconds) = (total_secs / 3600, (total_secs / 60) % 60, total_secs % 60);
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Offset on a simulated timeline, `mm:ss.mmm`.
pub fn clock_offset(ms: i64) -> String {
    let ms = ms.max(0);
    format!(
        "{:02}:{:02}.{:03}",
        ms / 60_000,
        (ms / MS_PER_SEC) % 60,
        ms % MS_PER_SEC
    )
}
