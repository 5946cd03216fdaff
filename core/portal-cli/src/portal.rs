//! Portal flows run against the resumed session.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use chrono::Local;
use portal_protocol::{StudentProfile, OTP_LENGTH};
use session_core::{Clock, LifecycleEvent, PortalError, TimerKind, UpdateOutcome};

use crate::context::{Context, LiveService};
use crate::render;

pub fn update(context: &Context, assignments: &[String]) -> Result<(), String> {
    let mut service = context.resume_service()?;
    let mut edited = service.lifecycle().profile().clone();
    for assignment in assignments {
        apply_assignment(&mut edited, assignment)?;
    }

    let outcome = service.submit_update(&edited);
    flush_backlog(&mut service);
    match outcome? {
        UpdateOutcome::NoChanges => println!("No changes detected."),
        UpdateOutcome::Updated { fields } => {
            println!("Updated: {}", fields.join(", "));
            println!("Run `portal-session confirm` to verify the new details.");
        }
    }
    Ok(())
}

pub fn confirm(context: &Context) -> Result<(), String> {
    let mut service = context.resume_service()?;
    let result = service.confirm_data();
    flush_backlog(&mut service);
    let events = result?;
    println!("Details confirmed.");
    finish(&mut service, &events);
    Ok(())
}

/// Sends a code to the registered number and reads it from stdin. Typing
/// `resend` asks for another code once the cooldown allows.
pub fn verify_mobile(context: &Context) -> Result<(), String> {
    let mut service = context.resume_service()?;
    let sent = service.send_otp();
    flush_backlog(&mut service);
    sent?;
    println!(
        "Code sent to {}.",
        service.lifecycle().profile().mobile_number
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Enter the {}-digit code (or `resend`): ", OTP_LENGTH);
        io::stdout()
            .flush()
            .map_err(|e| format!("Failed to write prompt: {}", e))?;

        let line = match lines.next() {
            Some(line) => line.map_err(|e| format!("Failed to read code: {}", e))?,
            None => return Err("Verification cancelled".to_string()),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input == "resend" {
            let resent = service.send_otp();
            flush_backlog(&mut service);
            match resent {
                Ok(()) => println!("A new code has been sent."),
                Err(PortalError::OtpCooldown { remaining_secs }) => {
                    println!("You can resend in {}s.", remaining_secs)
                }
                Err(e) => return Err(e.into()),
            }
            continue;
        }

        let verified = service.verify_otp(input);
        flush_backlog(&mut service);
        match verified {
            Ok(events) => {
                println!("Mobile number verified.");
                finish(&mut service, &events);
                return Ok(());
            }
            Err(e) if !service.lifecycle().phase().is_live() => return Err(e.into()),
            Err(e) => println!("{}", e),
        }
    }
}

pub fn history(context: &Context) -> Result<(), String> {
    let mut service = context.resume_service()?;
    let result = service.history();
    flush_backlog(&mut service);
    let entries = result?;

    if entries.is_empty() {
        println!("No updates recorded.");
        return Ok(());
    }
    for entry in entries {
        let when = entry
            .updated_at()
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| entry.update_date.clone());
        println!(
            "{}  {:<20} {} -> {}",
            when, entry.field_name, entry.old_value, entry.new_value
        );
    }
    Ok(())
}

/// Prints the events and, when a farewell logout is pending, waits for it.
fn finish(service: &mut LiveService, events: &[LifecycleEvent]) {
    render::print_events(events);
    if let Some(due_at) = service.lifecycle().next_due_at() {
        if service.lifecycle().is_timer_armed(TimerKind::Farewell) {
            let wait_ms = (due_at - service.lifecycle().clock().now_ms()).max(0);
            thread::sleep(Duration::from_millis(wait_ms.unsigned_abs()));
            render::print_events(&service.lifecycle_mut().run_pending());
        }
    }
}

fn flush_backlog(service: &mut LiveService) {
    render::print_events(&service.take_events());
}

/// Sets one form field from `name=value`.
fn apply_assignment(profile: &mut StudentProfile, assignment: &str) -> Result<(), String> {
    let (name, value) = assignment
        .split_once('=')
        .ok_or_else(|| format!("Expected FIELD=VALUE, got '{}'", assignment))?;
    let value = value.trim().to_string();

    let field = match name.trim() {
        "name" => &mut profile.name,
        "email" => &mut profile.email,
        "mobile_number" => &mut profile.mobile_number,
        "father_mobile_number" => &mut profile.father_mobile_number,
        "date_of_birth" => &mut profile.date_of_birth,
        "address" => &mut profile.address,
        "field_of_study" => &mut profile.field_of_study,
        "branch" => &mut profile.branch,
        "taluka" => &mut profile.taluka,
        "city" => &mut profile.city,
        "district" => &mut profile.district,
        "pincode" => &mut profile.pincode,
        other => return Err(format!("Unknown or read-only field '{}'", other)),
    };
    *field = value;
    Ok(())
}
