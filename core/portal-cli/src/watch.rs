//! Foreground session with live timers.
//!
//! The lifecycle stays on this thread. A reader thread only forwards stdin
//! lines over a channel; the loop sleeps on that channel until the next
//! timer is due.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use session_core::{Clock, InteractionKind};
use tracing::{debug, info};

use crate::context::{Context, LiveLifecycle};
use crate::render;

/// Upper bound on one wait, so a stepped wall clock is noticed promptly.
const MAX_WAIT_MS: i64 = 1_000;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Stay,
    Logout,
    Interaction(InteractionKind),
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    match line.trim() {
        "stay" | "s" => Command::Stay,
        "logout" | "quit" | "q" => Command::Logout,
        // A bare Enter is a keypress.
        "" => Command::Interaction(InteractionKind::KeyPress),
        other => other
            .parse::<InteractionKind>()
            .map(Command::Interaction)
            .unwrap_or_else(|_| Command::Unknown(other.to_string())),
    }
}

pub fn run(context: &Context) -> Result<(), String> {
    let mut lifecycle = context.resume()?;
    let profile = lifecycle.profile();
    println!(
        "Watching session for {} ({}). Commands: stay, logout, click, keypress, scroll, mousemove",
        profile.name, profile.roll_no
    );
    info!(roll_no = %profile.roll_no, "Watch started");

    let mut input = Some(spawn_stdin_reader());
    while lifecycle.phase().is_live() {
        render::print_events(&lifecycle.run_pending());
        if !lifecycle.phase().is_live() {
            break;
        }

        let wait = wait_duration(&lifecycle);
        let received = match &input {
            Some(rx) => rx.recv_timeout(wait),
            None => {
                thread::sleep(wait);
                Err(RecvTimeoutError::Timeout)
            }
        };

        match received {
            Ok(line) => handle_line(&mut lifecycle, &line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("stdin closed; timers keep running");
                input = None;
            }
        }
    }

    info!(phase = ?lifecycle.phase(), "Watch finished");
    Ok(())
}

fn handle_line(lifecycle: &mut LiveLifecycle, line: &str) {
    let events = match parse_command(line) {
        Command::Stay => lifecycle.stay_logged_in(),
        Command::Logout => lifecycle.logout(),
        Command::Interaction(kind) => lifecycle.record_interaction(kind),
        Command::Unknown(text) => {
            println!("Unknown command '{}'", text);
            lifecycle.record_interaction(InteractionKind::KeyPress)
        }
    };
    render::print_events(&events);
}

fn wait_duration(lifecycle: &LiveLifecycle) -> Duration {
    let now = lifecycle.clock().now_ms();
    let wait_ms = lifecycle
        .next_due_at()
        .map(|due_at| (due_at - now).clamp(0, MAX_WAIT_MS))
        .unwrap_or(MAX_WAIT_MS);
    Duration::from_millis(wait_ms.unsigned_abs())
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
