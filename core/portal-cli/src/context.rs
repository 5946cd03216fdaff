//! Per-invocation wiring: configuration, storage, and the live session.

use session_core::{
    load_config, FileSessionStore, HttpPortalApi, PortalService, RestoreOutcome, SessionConfig,
    SessionLifecycle, StorageConfig, SystemClock,
};
use tracing::{debug, warn};

pub type LiveLifecycle = SessionLifecycle<SystemClock, FileSessionStore>;
pub type LiveService = PortalService<HttpPortalApi, SystemClock, FileSessionStore>;

pub struct Context {
    pub storage: StorageConfig,
    pub config: SessionConfig,
}

impl Context {
    /// A malformed config file is logged and replaced by defaults.
    pub fn load(storage: StorageConfig) -> Self {
        let path = storage.config_file();
        let config = match load_config(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "Using default session config");
                SessionConfig::default()
            }
        }
        .with_env_overrides();
        debug!(api_base_url = %config.api_base_url, "Configuration loaded");

        Self { storage, config }
    }

    pub fn lifecycle(&self) -> LiveLifecycle {
        SessionLifecycle::new(
            self.config.clone(),
            SystemClock,
            FileSessionStore::new(&self.storage),
        )
    }

    pub fn service(&self) -> LiveService {
        PortalService::new(HttpPortalApi::from_config(&self.config), self.lifecycle())
    }

    /// Resumes the persisted session, failing when there is none to resume.
    pub fn resume(&self) -> Result<LiveLifecycle, String> {
        let mut lifecycle = self.lifecycle();
        require_restored(lifecycle.restore_from_store())?;
        Ok(lifecycle)
    }

    pub fn resume_service(&self) -> Result<LiveService, String> {
        let mut service = self.service();
        require_restored(service.lifecycle_mut().restore_from_store())?;
        Ok(service)
    }
}

fn require_restored(outcome: RestoreOutcome) -> Result<(), String> {
    match outcome {
        RestoreOutcome::Restored { .. } | RestoreOutcome::AlreadyActive => Ok(()),
        RestoreOutcome::Stale { inactive_ms } => Err(format!(
            "Session expired after {} of inactivity. Run `portal-session login` again.",
            crate::render::duration(inactive_ms)
        )),
        RestoreOutcome::Missing | RestoreOutcome::Corrupt => {
            Err("No active session. Run `portal-session login` first.".to_string())
        }
    }
}
