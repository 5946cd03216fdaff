//! Portal flows that connect the remote API to the session lifecycle.
//!
//! Each successful round trip counts as activity. Failed calls leave the
//! session untouched and return the backend's message.

use portal_protocol::{LoginRequest, ProfilePatch, StudentProfile, UpdateHistory};
use tracing::{debug, info};

use crate::api::PortalApi;
use crate::clock::Clock;
use crate::diff::{diff_profile, verification_after_update};
use crate::error::{PortalError, Result};
use crate::lifecycle::SessionLifecycle;
use crate::otp::{ApiOtpProvider, OtpFlow};
use crate::state::{LifecycleEvent, SessionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    NoChanges,
    Updated { fields: Vec<&'static str> },
}

pub struct PortalService<A, C, S> {
    api: A,
    lifecycle: SessionLifecycle<C, S>,
    otp: OtpFlow,
    /// Events fired by timers while a request was being prepared or sent.
    backlog: Vec<LifecycleEvent>,
}

impl<A: PortalApi, C: Clock, S: SessionStore> PortalService<A, C, S> {
    pub fn new(api: A, lifecycle: SessionLifecycle<C, S>) -> Self {
        let otp = OtpFlow::new(lifecycle.config().otp_cooldown_ms());
        Self {
            api,
            lifecycle,
            otp,
            backlog: Vec::new(),
        }
    }

    pub fn lifecycle(&self) -> &SessionLifecycle<C, S> {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut SessionLifecycle<C, S> {
        &mut self.lifecycle
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Drains lifecycle events that fired outside a call's own return value,
    /// such as an expiry noticed while checking for a live session.
    pub fn take_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.backlog)
    }

    /// Credentials are checked by the backend; only presence is checked here.
    pub fn login(&mut self, roll_no: &str, password: &str) -> Result<Vec<LifecycleEvent>> {
        let roll_no = roll_no.trim();
        if roll_no.is_empty() {
            return Err(PortalError::InvalidInput(
                "Roll number is required".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(PortalError::InvalidInput("Password is required".to_string()));
        }

        let credentials = LoginRequest {
            roll_no: roll_no.to_string(),
            password: password.to_string(),
        };
        let profile = self.api.login(&credentials)?;
        info!(roll_no, "Login accepted");
        Ok(self.lifecycle.login(profile))
    }

    pub fn refresh_profile(&mut self) -> Result<Vec<LifecycleEvent>> {
        let roll_no = self.roll_no()?;
        let profile = self.api.fetch_profile(&roll_no)?;
        Ok(self
            .lifecycle
            .apply_profile(&ProfilePatch::from_profile(&profile)))
    }

    /// Submits only the fields that differ from the live profile.
    pub fn submit_update(&mut self, edited: &StudentProfile) -> Result<UpdateOutcome> {
        let roll_no = self.roll_no()?;
        let previous = self.lifecycle.profile().clone();
        let patch = diff_profile(&previous, edited);
        if patch.is_empty() {
            debug!("No changes detected in submitted profile");
            return Ok(UpdateOutcome::NoChanges);
        }

        let updated = self.api.update_profile(&roll_no, &patch)?;
        let mut events = self
            .lifecycle
            .apply_profile(&ProfilePatch::from_profile(&updated));
        events.extend(
            self.lifecycle
                .apply_profile(&verification_after_update(&previous, &patch)),
        );
        self.backlog.extend(events);

        let fields = patch.changed_fields();
        info!(roll_no = %roll_no, ?fields, "Profile updated");
        Ok(UpdateOutcome::Updated { fields })
    }

    /// Confirms the stored data is correct.
    pub fn confirm_data(&mut self) -> Result<Vec<LifecycleEvent>> {
        let roll_no = self.roll_no()?;
        self.api.verify_data(&roll_no)?;
        let mut events = self.lifecycle.apply_profile(&ProfilePatch {
            is_data_verified: Some(true),
            ..Default::default()
        });
        events.extend(self.finish_if_verified());
        Ok(events)
    }

    pub fn send_otp(&mut self) -> Result<()> {
        let roll_no = self.roll_no()?;
        let mobile_number = self.lifecycle.profile().mobile_number.clone();
        let now = self.lifecycle.clock().now_ms();
        let mut provider = ApiOtpProvider::new(&self.api, &roll_no);
        self.otp.send(&mut provider, &mobile_number, now)?;
        let events = self.lifecycle.refresh_activity();
        self.backlog.extend(events);
        Ok(())
    }

    pub fn resend_available_in(&self) -> u64 {
        self.otp.resend_available_in(self.lifecycle.clock().now_ms())
    }

    /// Confirms the code; on success both verification flags are set.
    pub fn verify_otp(&mut self, code: &str) -> Result<Vec<LifecycleEvent>> {
        let roll_no = self.roll_no()?;
        let mut provider = ApiOtpProvider::new(&self.api, &roll_no);
        let flags = self.otp.confirm(&mut provider, code)?;

        let mut events = self.lifecycle.apply_profile(&flags);
        events.extend(self.finish_if_verified());
        Ok(events)
    }

    pub fn history(&mut self) -> Result<Vec<UpdateHistory>> {
        let roll_no = self.roll_no()?;
        let history = self.api.fetch_history(&roll_no)?;
        let events = self.lifecycle.refresh_activity();
        self.backlog.extend(events);
        Ok(history)
    }

    pub fn logout(&mut self) -> Vec<LifecycleEvent> {
        self.lifecycle.logout()
    }

    fn roll_no(&mut self) -> Result<String> {
        // Let any overdue expiry land before deciding the session is live.
        let events = self.lifecycle.run_pending();
        self.backlog.extend(events);
        if !self.lifecycle.phase().is_live() {
            return Err(PortalError::NotAuthenticated);
        }
        Ok(self.lifecycle.profile().roll_no.clone())
    }

    fn finish_if_verified(&mut self) -> Vec<LifecycleEvent> {
        let profile = self.lifecycle.profile();
        if profile.is_data_verified && profile.is_mobile_verified {
            self.lifecycle.schedule_farewell_logout()
        } else {
            Vec::new()
        }
    }
}
