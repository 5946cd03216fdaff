//! Remote portal API.
//!
//! [`PortalApi`] is the seam the rest of the crate talks to; [`HttpPortalApi`]
//! is the blocking HTTP/JSON implementation. Failures surface as
//! [`PortalError::Api`] carrying the backend's own message when it sends one.

use std::time::Duration;

use portal_protocol::{
    endpoints, ApiErrorBody, LoginRequest, OtpConfirm, OtpRequest, ProfilePatch, StatusResponse,
    StudentProfile, UpdateHistory,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{PortalError, Result};

pub trait PortalApi {
    fn login(&self, credentials: &LoginRequest) -> Result<StudentProfile>;
    fn fetch_profile(&self, roll_no: &str) -> Result<StudentProfile>;
    fn update_profile(&self, roll_no: &str, patch: &ProfilePatch) -> Result<StudentProfile>;
    fn verify_data(&self, roll_no: &str) -> Result<StatusResponse>;
    fn request_otp(&self, roll_no: &str, mobile_number: &str) -> Result<StatusResponse>;
    fn verify_mobile(&self, roll_no: &str, otp: &str) -> Result<StatusResponse>;
    fn fetch_history(&self, roll_no: &str) -> Result<Vec<UpdateHistory>>;
}

pub struct HttpPortalApi {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpPortalApi {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.api_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl PortalApi for HttpPortalApi {
    fn login(&self, credentials: &LoginRequest) -> Result<StudentProfile> {
        debug!(roll_no = %credentials.roll_no, "POST login");
        let response = self
            .agent
            .post(&self.url(&endpoints::login()))
            .send_json(credentials);
        decode_response(response, "login")
    }

    fn fetch_profile(&self, roll_no: &str) -> Result<StudentProfile> {
        let response = self.agent.get(&self.url(&endpoints::student(roll_no))).call();
        decode_response(response, "fetch profile")
    }

    /// Sends only the changed fields as a partial update. A `PUT` would be
    /// validated as a full replacement and rejected for the missing fields.
    fn update_profile(&self, roll_no: &str, patch: &ProfilePatch) -> Result<StudentProfile> {
        debug!(roll_no, fields = ?patch.changed_fields(), "PATCH profile");
        let response = self
            .agent
            .request("PATCH", &self.url(&endpoints::student(roll_no)))
            .send_json(patch);
        decode_response(response, "update profile")
    }

    fn verify_data(&self, roll_no: &str) -> Result<StatusResponse> {
        let response = self.agent.post(&self.url(&endpoints::verify(roll_no))).call();
        decode_response(response, "verify data")
    }

    fn request_otp(&self, roll_no: &str, mobile_number: &str) -> Result<StatusResponse> {
        let response = self
            .agent
            .post(&self.url(&endpoints::request_otp(roll_no)))
            .send_json(OtpRequest {
                mobile_number: mobile_number.to_string(),
            });
        decode_response(response, "request otp")
    }

    fn verify_mobile(&self, roll_no: &str, otp: &str) -> Result<StatusResponse> {
        let response = self
            .agent
            .post(&self.url(&endpoints::verify_mobile(roll_no)))
            .send_json(OtpConfirm {
                otp: otp.to_string(),
            });
        decode_response(response, "verify mobile")
    }

    fn fetch_history(&self, roll_no: &str) -> Result<Vec<UpdateHistory>> {
        let response = self.agent.get(&self.url(&endpoints::history(roll_no))).call();
        decode_response(response, "fetch history")
    }
}

fn decode_response<T: DeserializeOwned>(
    response: std::result::Result<ureq::Response, ureq::Error>,
    action: &str,
) -> Result<T> {
    match response {
        Ok(response) => response.into_json::<T>().map_err(|source| PortalError::Io {
            context: format!("decode {} response", action),
            source,
        }),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(api_error(status, &body, action))
        }
        Err(err) => Err(PortalError::Transport(err.to_string())),
    }
}

/// Maps a non-2xx response to a user-facing error.
pub fn api_error(status: u16, body: &str, action: &str) -> PortalError {
    let message = ApiErrorBody::message_from(body)
        .unwrap_or_else(|| format!("{} failed (HTTP {}). Please try again.", action, status));
    PortalError::Api { status, message }
}
