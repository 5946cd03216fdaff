//! Durable client-side storage for the session projection.
//!
//! Two keys are kept: the [`SessionSnapshot`] and the last-activity
//! timestamp. They are separate files so the frequent activity writes never
//! rewrite the profile.
//!
//! # File Format
//!
//! ```json
//! // session.json
//! { "version": 1, "profile": { ... StudentProfile fields ... }, "saved_at": 1769817600000 }
//!
//! // last-activity.json
//! { "last_activity_at": 1769817600000 }
//! ```
//!
//! Writes go through a temp file + rename so a crash never leaves a
//! half-written file behind.

use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::error::{PortalError, Result};
use crate::storage::StorageConfig;

use super::types::{SessionSnapshot, SNAPSHOT_VERSION};

/// Key-value persistence for the session.
pub trait SessionStore {
    fn save_snapshot(&mut self, snapshot: &SessionSnapshot) -> Result<()>;
    fn load_snapshot(&self) -> Result<Option<SessionSnapshot>>;
    fn save_last_activity(&mut self, at_ms: i64) -> Result<()>;
    fn load_last_activity(&self) -> Result<Option<i64>>;
    /// Removes both keys. Clearing an empty store is not an error.
    fn clear(&mut self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct ActivityFile {
    last_activity_at: i64,
}

/// File-backed store rooted at a [`StorageConfig`].
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    session_path: PathBuf,
    activity_path: PathBuf,
}

impl FileSessionStore {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            session_path: storage.session_file(),
            activity_path: storage.last_activity_file(),
        }
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }
}

impl SessionStore for FileSessionStore {
    fn save_snapshot(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        write_json_atomic(&self.session_path, snapshot, "session snapshot")
    }

    fn load_snapshot(&self) -> Result<Option<SessionSnapshot>> {
        let snapshot: Option<SessionSnapshot> = read_json(&self.session_path, "session snapshot")?;
        match snapshot {
            Some(snapshot) if snapshot.version == SNAPSHOT_VERSION => Ok(Some(snapshot)),
            Some(snapshot) => {
                debug!(
                    version = snapshot.version,
                    expected = SNAPSHOT_VERSION,
                    "Ignoring session snapshot with unknown version"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn save_last_activity(&mut self, at_ms: i64) -> Result<()> {
        write_json_atomic(
            &self.activity_path,
            &ActivityFile {
                last_activity_at: at_ms,
            },
            "last activity",
        )
    }

    fn load_last_activity(&self) -> Result<Option<i64>> {
        let file: Option<ActivityFile> = read_json(&self.activity_path, "last activity")?;
        Ok(file.map(|file| file.last_activity_at))
    }

    fn clear(&mut self) -> Result<()> {
        remove_if_exists(&self.session_path)?;
        remove_if_exists(&self.activity_path)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Option<T>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PortalError::Io {
                context: format!("read {}", what),
                source,
            })
        }
    };

    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|source| PortalError::Json {
            context: format!("parse {}", what),
            source,
        })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| PortalError::Io {
            context: format!("create directory for {}", what),
            source,
        })?;
    }

    let payload = serde_json::to_vec_pretty(value).map_err(|source| PortalError::Json {
        context: format!("serialize {}", what),
        source,
    })?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, payload).map_err(|source| PortalError::Io {
        context: format!("write {}", what),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| PortalError::Io {
        context: format!("commit {}", what),
        source,
    })
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PortalError::Io {
            context: "clear session storage".to_string(),
            source,
        }),
    }
}

/// In-process store for tests and the `simulate` command.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    snapshot: Option<SessionSnapshot>,
    last_activity: Option<i64>,
    activity_writes: usize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of last-activity writes so far.
    pub fn activity_writes(&self) -> usize {
        self.activity_writes
    }
}

impl SessionStore for MemorySessionStore {
    fn save_snapshot(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn load_snapshot(&self) -> Result<Option<SessionSnapshot>> {
        Ok(self.snapshot.clone())
    }

    fn save_last_activity(&mut self, at_ms: i64) -> Result<()> {
        self.last_activity = Some(at_ms);
        self.activity_writes += 1;
        Ok(())
    }

    fn load_last_activity(&self) -> Result<Option<i64>> {
        Ok(self.last_activity)
    }

    fn clear(&mut self) -> Result<()> {
        self.snapshot = None;
        self.last_activity = None;
        Ok(())
    }
}
