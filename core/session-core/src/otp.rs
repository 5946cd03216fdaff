//! Mobile-number verification by one-time passcode.
//!
//! Delivery and checking of the code belong to the provider. This module
//! owns only the client-side rules around it: number normalization, code
//! shape, the resend cooldown, and producing the "verified" flags once the
//! provider accepts a code. A rejected code never produces them.

use portal_protocol::{ProfilePatch, OTP_LENGTH};
use tracing::{debug, warn};

use crate::api::PortalApi;
use crate::clock::MS_PER_SEC;
use crate::error::{PortalError, Result};
use crate::patterns::{RE_MOBILE_NUMBER, RE_OTP_CODE};

/// Sends and confirms codes. Implemented over the portal API by
/// [`ApiOtpProvider`]; tests use fakes.
pub trait OtpProvider {
    /// Returns an opaque handle identifying the pending confirmation.
    fn send_code(&mut self, mobile_number: &str) -> Result<String>;
    fn confirm(&mut self, handle: &str, code: &str) -> Result<()>;
}

/// OTP delivery through the backend's `request-otp` / `verify-mobile` endpoints.
///
/// These are per-student actions (`students/{roll_no}/request-otp/` and
/// `students/{roll_no}/verify-mobile/`) that a plain student CRUD backend
/// does not expose. Deploy a backend that serves both routes; without them
/// every send fails with [`PortalError::Api`] status 404 and no code is
/// ever pending.
pub struct ApiOtpProvider<'a, A> {
    api: &'a A,
    roll_no: String,
}

impl<'a, A: PortalApi> ApiOtpProvider<'a, A> {
    pub fn new(api: &'a A, roll_no: &str) -> Self {
        Self {
            api,
            roll_no: roll_no.to_string(),
        }
    }
}

impl<A: PortalApi> OtpProvider for ApiOtpProvider<'_, A> {
    fn send_code(&mut self, mobile_number: &str) -> Result<String> {
        self.api.request_otp(&self.roll_no, mobile_number)?;
        Ok(self.roll_no.clone())
    }

    fn confirm(&mut self, handle: &str, code: &str) -> Result<()> {
        self.api.verify_mobile(handle, code).map(|_| ())
    }
}

/// Prefixes `+` when missing, then checks the shape.
pub fn normalize_mobile_number(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if !RE_MOBILE_NUMBER.is_match(trimmed) {
        return Err(PortalError::InvalidMobileNumber(
            "include the country code, 10 to 15 digits".to_string(),
        ));
    }
    if trimmed.starts_with('+') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("+{}", trimmed))
    }
}

#[derive(Debug)]
pub struct OtpFlow {
    cooldown_ms: i64,
    resend_at: Option<i64>,
    pending: Option<String>,
}

impl OtpFlow {
    pub fn new(cooldown_ms: i64) -> Self {
        Self {
            cooldown_ms,
            resend_at: None,
            pending: None,
        }
    }

    /// Whole seconds until another code may be sent, rounded up.
    pub fn resend_available_in(&self, now: i64) -> u64 {
        match self.resend_at {
            Some(resend_at) if resend_at > now => {
                let remaining = resend_at - now;
                u64::try_from((remaining + MS_PER_SEC - 1) / MS_PER_SEC).unwrap_or(0)
            }
            _ => 0,
        }
    }

    pub fn is_code_sent(&self) -> bool {
        self.pending.is_some()
    }

    /// Sends a code and starts the cooldown. A failed send clears the
    /// cooldown so the user can retry at once.
    pub fn send<P: OtpProvider>(
        &mut self,
        provider: &mut P,
        mobile_number: &str,
        now: i64,
    ) -> Result<()> {
        let remaining_secs = self.resend_available_in(now);
        if remaining_secs > 0 {
            return Err(PortalError::OtpCooldown { remaining_secs });
        }

        let mobile_number = normalize_mobile_number(mobile_number)?;
        match provider.send_code(&mobile_number) {
            Ok(handle) => {
                self.pending = Some(handle);
                self.resend_at = Some(now + self.cooldown_ms);
                debug!(cooldown_ms = self.cooldown_ms, "OTP sent");
                Ok(())
            }
            Err(err) => {
                self.resend_at = None;
                warn!(error = %err, "OTP send failed");
                Err(err)
            }
        }
    }

    /// Confirms `code`. On success returns the flags to merge into the
    /// session; on failure the session must not change.
    pub fn confirm<P: OtpProvider>(&mut self, provider: &mut P, code: &str) -> Result<ProfilePatch> {
        let code = code.trim();
        if !RE_OTP_CODE.is_match(code) {
            return Err(PortalError::InvalidOtpFormat {
                expected: OTP_LENGTH,
            });
        }
        let handle = self.pending.as_deref().ok_or(PortalError::OtpNotRequested)?;

        provider.confirm(handle, code)?;
        self.pending = None;
        self.resend_at = None;
        debug!("OTP confirmed");

        Ok(ProfilePatch {
            is_mobile_verified: Some(true),
            is_data_verified: Some(true),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_protocol::{LoginRequest, StatusResponse, StudentProfile, UpdateHistory};

    #[derive(Default)]
    struct FakeProvider {
        sent_to: Vec<String>,
        fail_send: bool,
        accepted_code: String,
    }

    impl OtpProvider for FakeProvider {
        fn send_code(&mut self, mobile_number: &str) -> Result<String> {
            if self.fail_send {
                return Err(PortalError::Transport("provider unavailable".to_string()));
            }
            self.sent_to.push(mobile_number.to_string());
            Ok("confirmation-1".to_string())
        }

        fn confirm(&mut self, handle: &str, code: &str) -> Result<()> {
            assert_eq!(handle, "confirmation-1");
            if code == self.accepted_code {
                Ok(())
            } else {
                Err(PortalError::Api {
                    status: 400,
                    message: "Invalid OTP. Please try again.".to_string(),
                })
            }
        }
    }

    fn provider() -> FakeProvider {
        FakeProvider {
            accepted_code: "123456".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn normalizes_missing_plus() {
        assert_eq!(
            normalize_mobile_number("919876543210").unwrap(),
            "+919876543210"
        );
        assert_eq!(
            normalize_mobile_number(" +919876543210 ").unwrap(),
            "+919876543210"
        );
        assert!(normalize_mobile_number("12345").is_err());
    }

    #[test]
    fn send_starts_cooldown() {
        let mut flow = OtpFlow::new(60_000);
        let mut provider = provider();

        flow.send(&mut provider, "919876543210", 0).expect("send");
        assert_eq!(provider.sent_to, vec!["+919876543210".to_string()]);
        assert_eq!(flow.resend_available_in(0), 60);
        assert_eq!(flow.resend_available_in(59_001), 1);
        assert_eq!(flow.resend_available_in(60_000), 0);

        let err = flow.send(&mut provider, "919876543210", 30_000).unwrap_err();
        assert!(matches!(err, PortalError::OtpCooldown { remaining_secs: 30 }));

        flow.send(&mut provider, "919876543210", 60_000).expect("resend");
        assert_eq!(provider.sent_to.len(), 2);
    }

    #[test]
    fn failed_send_clears_cooldown() {
        let mut flow = OtpFlow::new(60_000);
        let mut provider = FakeProvider {
            fail_send: true,
            ..provider()
        };

        assert!(flow.send(&mut provider, "+919876543210", 0).is_err());
        assert_eq!(flow.resend_available_in(0), 0);
        assert!(!flow.is_code_sent());
    }

    #[test]
    fn confirm_without_send_is_rejected() {
        let mut flow = OtpFlow::new(60_000);
        let err = flow.confirm(&mut provider(), "123456").unwrap_err();
        assert!(matches!(err, PortalError::OtpNotRequested));
    }

    #[test]
    fn malformed_code_never_reaches_provider() {
        let mut flow = OtpFlow::new(60_000);
        let mut provider = provider();
        flow.send(&mut provider, "+919876543210", 0).expect("send");

        let err = flow.confirm(&mut provider, "12ab").unwrap_err();
        assert!(matches!(err, PortalError::InvalidOtpFormat { expected: 6 }));
    }

    #[test]
    fn wrong_code_yields_no_flags() {
        let mut flow = OtpFlow::new(60_000);
        let mut provider = provider();
        flow.send(&mut provider, "+919876543210", 0).expect("send");

        assert!(flow.confirm(&mut provider, "654321").is_err());
        assert!(flow.is_code_sent());
    }

    #[test]
    fn right_code_yields_verified_flags() {
        let mut flow = OtpFlow::new(60_000);
        let mut provider = provider();
        flow.send(&mut provider, "+919876543210", 0).expect("send");

        let patch = flow.confirm(&mut provider, "123456").expect("confirm");
        assert_eq!(patch.is_mobile_verified, Some(true));
        assert_eq!(patch.is_data_verified, Some(true));
        assert!(!flow.is_code_sent());
        assert_eq!(flow.resend_available_in(0), 0);
    }

    /// A backend that serves the student resource but no OTP actions.
    struct CrudOnlyBackend;

    fn not_found<T>(action: &str) -> Result<T> {
        Err(crate::api::api_error(404, "<h1>Not Found</h1>", action))
    }

    impl PortalApi for CrudOnlyBackend {
        fn login(&self, _: &LoginRequest) -> Result<StudentProfile> {
            not_found("login")
        }
        fn fetch_profile(&self, _: &str) -> Result<StudentProfile> {
            not_found("fetch profile")
        }
        fn update_profile(&self, _: &str, _: &ProfilePatch) -> Result<StudentProfile> {
            not_found("update profile")
        }
        fn verify_data(&self, _: &str) -> Result<StatusResponse> {
            not_found("verify data")
        }
        fn request_otp(&self, _: &str, _: &str) -> Result<StatusResponse> {
            not_found("request otp")
        }
        fn verify_mobile(&self, _: &str, _: &str) -> Result<StatusResponse> {
            not_found("verify mobile")
        }
        fn fetch_history(&self, _: &str) -> Result<Vec<UpdateHistory>> {
            not_found("fetch history")
        }
    }

    #[test]
    fn missing_otp_routes_surface_as_not_found() {
        let backend = CrudOnlyBackend;
        let mut provider = ApiOtpProvider::new(&backend, "1024");
        let mut flow = OtpFlow::new(60_000);

        let err = flow.send(&mut provider, "+919876543210", 0).unwrap_err();
        assert!(matches!(err, PortalError::Api { status: 404, .. }));
        assert!(!flow.is_code_sent());
        assert_eq!(flow.resend_available_in(0), 0);
    }
}
