//! Storage paths for the portal client.
//!
//! All file locations are derived from one root so tests can point the whole
//! client at a temp directory with [`StorageConfig::with_root`].

use std::path::{Path, PathBuf};

const ROOT_DIR_NAME: &str = ".student-portal";

/// Central configuration for all portal storage paths.
///
/// Production code uses `StorageConfig::default()` which points to
/// `~/.student-portal/`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            root: home.join(ROOT_DIR_NAME),
        }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to session.json (non-secret profile projection).
    pub fn session_file(&self) -> PathBuf {
        self.root.join("session.json")
    }

    /// Path to last-activity.json (inactivity baseline).
    pub fn last_activity_file(&self) -> PathBuf {
        self.root.join("last-activity.json")
    }

    /// Path to config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Path to logs/ directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}
