//! Session lifecycle configuration.
//!
//! Loaded from `~/.student-portal/config.toml`. A missing file yields the
//! defaults; a malformed one is an error so a typo never silently changes
//! the timeout.

use std::env;
use std::path::Path;

use fs_err as fs;
use portal_protocol::{DEFAULT_API_BASE_URL, REQUEST_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};

use crate::clock::{MS_PER_MINUTE, MS_PER_SEC};
use crate::error::{PortalError, Result};

pub const SESSION_TIMEOUT_MINUTES: u32 = 10;
pub const MONITOR_INTERVAL_SECS: u32 = 5;
pub const WARNING_COUNTDOWN_SECS: u32 = 60;
pub const PERSIST_COALESCE_MS: u64 = 1_000;
pub const OTP_RESEND_COOLDOWN_SECS: u32 = 60;
pub const FAREWELL_DELAY_MS: u64 = 2_000;

/// The warning appears this many minutes before the timeout.
pub const WARNING_LEAD_MINUTES: u32 = 1;

pub const API_URL_ENV: &str = "PORTAL_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub timeout_minutes: u32,
    pub monitor_interval_secs: u32,
    pub countdown_secs: u32,
    pub persist_coalesce_ms: u64,
    pub otp_resend_cooldown_secs: u32,
    pub farewell_delay_ms: u64,
    pub api_base_url: String,
    pub api_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: SESSION_TIMEOUT_MINUTES,
            monitor_interval_secs: MONITOR_INTERVAL_SECS,
            countdown_secs: WARNING_COUNTDOWN_SECS,
            persist_coalesce_ms: PERSIST_COALESCE_MS,
            otp_resend_cooldown_secs: OTP_RESEND_COOLDOWN_SECS,
            farewell_delay_ms: FAREWELL_DELAY_MS,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_minutes <= WARNING_LEAD_MINUTES {
            return Err(PortalError::InvalidConfig(format!(
                "timeout_minutes must be at least {}",
                WARNING_LEAD_MINUTES + 1
            )));
        }
        if self.monitor_interval_secs == 0 {
            return Err(PortalError::InvalidConfig(
                "monitor_interval_secs must be positive".to_string(),
            ));
        }
        if self.countdown_secs == 0 {
            return Err(PortalError::InvalidConfig(
                "countdown_secs must be positive".to_string(),
            ));
        }
        if self.api_timeout_secs == 0 {
            return Err(PortalError::InvalidConfig(
                "api_timeout_secs must be positive".to_string(),
            ));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(PortalError::InvalidConfig(
                "api_base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies `PORTAL_API_URL` when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
        self
    }

    pub fn timeout_ms(&self) -> i64 {
        i64::from(self.timeout_minutes) * MS_PER_MINUTE
    }

    /// Inactivity at which the warning starts.
    pub fn warning_after_ms(&self) -> i64 {
        i64::from(self.timeout_minutes.saturating_sub(WARNING_LEAD_MINUTES)) * MS_PER_MINUTE
    }

    pub fn monitor_interval_ms(&self) -> i64 {
        i64::from(self.monitor_interval_secs) * MS_PER_SEC
    }

    pub fn otp_cooldown_ms(&self) -> i64 {
        i64::from(self.otp_resend_cooldown_secs) * MS_PER_SEC
    }
}

/// Loads configuration from `path`, returning defaults if it doesn't exist.
pub fn load_config(path: &Path) -> Result<SessionConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(SessionConfig::default())
        }
        Err(source) => {
            return Err(PortalError::Io {
                context: "read session config".to_string(),
                source,
            })
        }
    };

    let config: SessionConfig =
        toml::from_str(&content).map_err(|err| PortalError::ConfigMalformed {
            path: path.to_path_buf(),
            details: err.to_string(),
        })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_portal_constants() {
        let config = SessionConfig::default();
        assert_eq!(config.timeout_ms(), 10 * 60_000);
        assert_eq!(config.warning_after_ms(), 9 * 60_000);
        assert_eq!(config.monitor_interval_ms(), 5_000);
        assert_eq!(config.countdown_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let config = load_config(&temp_dir.path().join("config.toml")).expect("load");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "timeout_minutes = 15\ncountdown_secs = 30\n").expect("write");

        let config = load_config(&path).expect("load");
        assert_eq!(config.timeout_minutes, 15);
        assert_eq!(config.countdown_secs, 30);
        assert_eq!(config.monitor_interval_secs, MONITOR_INTERVAL_SECS);
    }

    #[test]
    fn malformed_file_is_rejected() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "timeout_minutes = \"soon\"").expect("write");

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, PortalError::ConfigMalformed { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "timeout_mins = 5").expect("write");

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let short = SessionConfig {
            timeout_minutes: 1,
            ..Default::default()
        };
        assert!(short.validate().is_err());

        let no_tick = SessionConfig {
            monitor_interval_secs: 0,
            ..Default::default()
        };
        assert!(no_tick.validate().is_err());

        let no_countdown = SessionConfig {
            countdown_secs: 0,
            ..Default::default()
        };
        assert!(no_countdown.validate().is_err());
    }
}
