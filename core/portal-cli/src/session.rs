//! Session entry, exit, and inspection.

use std::env;
use std::io::{self, BufRead, Write};

use serde::Serialize;
use session_core::{Clock, RestoreOutcome, SessionConfig, SessionPhase, MS_PER_SEC};
use tracing::info;

use crate::context::Context;
use crate::render;

const PASSWORD_ENV: &str = "PORTAL_PASSWORD";

pub fn login(context: &Context, roll_no: &str, password: Option<String>) -> Result<(), String> {
    let password = match password.or_else(|| env::var(PASSWORD_ENV).ok()) {
        Some(password) => password,
        None => prompt_password()?,
    };

    let mut service = context.service();
    let events = service.login(roll_no, &password)?;
    render::print_events(&events);

    let profile = service.lifecycle().profile();
    println!("Welcome, {}", profile.name);
    if profile.is_data_verified && profile.is_mobile_verified {
        println!("Your details are verified.");
    } else {
        println!("Review your details, then run `portal-session confirm` or `verify-mobile`.");
    }
    Ok(())
}

/// Logging out without a live session still clears whatever is stored.
pub fn logout(context: &Context) -> Result<(), String> {
    let mut lifecycle = context.lifecycle();
    match lifecycle.restore_from_store() {
        RestoreOutcome::Restored { .. } | RestoreOutcome::AlreadyActive => {
            render::print_events(&lifecycle.logout());
        }
        outcome => {
            info!(?outcome, "Logout with no live session");
            println!("No active session.");
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatusReport {
    phase: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    roll_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inactive_secs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning_in_secs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_in_secs: Option<i64>,
    is_data_verified: bool,
    is_mobile_verified: bool,
}

pub fn status(context: &Context, json: bool) -> Result<(), String> {
    let mut lifecycle = context.lifecycle();
    let outcome = lifecycle.restore_from_store();
    let config = lifecycle.config();

    let report = match lifecycle.inactivity_ms() {
        Some(inactive_ms) => {
            let profile = lifecycle.profile();
            StatusReport {
                phase: reported_phase(lifecycle.phase(), inactive_ms, config),
                roll_no: Some(profile.roll_no.clone()),
                name: Some(profile.name.clone()),
                inactive_secs: Some(inactive_ms / MS_PER_SEC),
                warning_in_secs: Some((config.warning_after_ms() - inactive_ms).max(0) / MS_PER_SEC),
                expires_in_secs: Some((config.timeout_ms() - inactive_ms).max(0) / MS_PER_SEC),
                is_data_verified: profile.is_data_verified,
                is_mobile_verified: profile.is_mobile_verified,
            }
        }
        None => StatusReport {
            phase: match outcome {
                RestoreOutcome::Stale { .. } => SessionPhase::Expired,
                _ => SessionPhase::SignedOut,
            },
            roll_no: None,
            name: None,
            inactive_secs: None,
            warning_in_secs: None,
            expires_in_secs: None,
            is_data_verified: false,
            is_mobile_verified: false,
        },
    };

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to encode status: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    match (&report.roll_no, report.inactive_secs) {
        (Some(roll_no), Some(inactive_secs)) => {
            println!(
                "Signed in as {} ({})",
                report.name.as_deref().unwrap_or_default(),
                roll_no
            );
            println!("Idle for {}", render::duration(inactive_secs * MS_PER_SEC));
            println!(
                "Warning in {}, logout in {}",
                render::duration(report.warning_in_secs.unwrap_or(0) * MS_PER_SEC),
                render::duration(report.expires_in_secs.unwrap_or(0) * MS_PER_SEC)
            );
            println!(
                "Data verified: {}, mobile verified: {}",
                yes_no(report.is_data_verified),
                yes_no(report.is_mobile_verified)
            );
        }
        _ if report.phase == SessionPhase::Expired => {
            println!("Session expired due to inactivity.")
        }
        _ => println!("Not signed in."),
    }
    info!(
        phase = ?report.phase,
        at = lifecycle.clock().now_ms(),
        "Status reported"
    );
    Ok(())
}

/// A freshly restored session has not ticked yet, so a baseline already past
/// the warning threshold is reported as `Warning`.
fn reported_phase(phase: SessionPhase, inactive_ms: i64, config: &SessionConfig) -> SessionPhase {
    match phase {
        SessionPhase::Active if inactive_ms >= config.warning_after_ms() => SessionPhase::Warning,
        other => other,
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn prompt_password() -> Result<String, String> {
    print!("Password: ");
    io::stdout()
        .flush()
        .map_err(|e| format!("Failed to write prompt: {}", e))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| format!("Failed to read password: {}", e))?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}
