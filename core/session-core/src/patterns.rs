//! Compiled regex patterns for the OTP flow.
//!
//! These only check shape before a request leaves the client; the backend
//! and the OTP provider own the real validation rules.

use once_cell::sync::Lazy;
use regex::Regex;

/// Optional leading `+`, then 10 to 15 digits.
pub static RE_MOBILE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").unwrap());

/// Exactly six digits.
pub static RE_OTP_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").unwrap());
