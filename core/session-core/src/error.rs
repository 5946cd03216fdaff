//! Error types for session-core collaborators.
//!
//! The lifecycle itself never fails; these errors come from configuration,
//! durable storage, the remote API, and the OTP flow.

use std::path::PathBuf;

/// All errors that can occur around the session lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ─────────────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("No authenticated session")]
    NotAuthenticated,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ─────────────────────────────────────────────────────────────────────
    // Remote API Errors
    // ─────────────────────────────────────────────────────────────────────
    /// Non-2xx response. `message` is user-facing text.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    // ─────────────────────────────────────────────────────────────────────
    // OTP Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Invalid phone number: {0}")]
    InvalidMobileNumber(String),

    #[error("OTP must be exactly {expected} digits")]
    InvalidOtpFormat { expected: usize },

    #[error("Please request an OTP first")]
    OtpNotRequested,

    #[error("OTP resend available in {remaining_secs}s")]
    OtpCooldown { remaining_secs: u64 },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PortalError {
    /// True for failures reported by the backend with an HTTP status.
    pub fn is_api(&self) -> bool {
        matches!(self, PortalError::Api { .. })
    }

    /// True when stored data could not be decoded.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, PortalError::Json { .. })
    }
}

/// Convenience type alias for Results using PortalError.
pub type Result<T> = std::result::Result<T, PortalError>;

impl From<PortalError> for String {
    fn from(err: PortalError) -> String {
        err.to_string()
    }
}
