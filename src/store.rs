//! Persisted preference store.
//!
//! The only state that outlives a session is the number of times the user
//! has switched filters; the feedback prompt keys off it. It lives in a
//! small JSON file:
//!
//! ```json
//! { "version": 1, "filter_count": 4 }
//! ```
//!
//! Loading is forgiving: a missing, unreadable, corrupt or
//! version-mismatched file yields fresh defaults rather than an error, so a
//! damaged preferences file never blocks editing. Saving does report
//! errors; callers decide whether they matter.
//!
//! A store created with [`PreferenceStore::in_memory`] has no backing file
//! and never touches disk.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version of the preferences file format. Bump this to discard existing
/// files when the format changes.
const PREFERENCES_VERSION: u32 = 1;

/// Default file name within the preferences directory.
pub const PREFERENCES_FILENAME: &str = "preferences.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk contents of the preferences file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Preferences {
    pub version: u32,
    pub filter_count: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            filter_count: 0,
        }
    }
}

/// Preferences plus where they are persisted.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    prefs: Preferences,
}

impl PreferenceStore {
    /// A store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            prefs: Preferences::default(),
        }
    }

    /// Load from `path`. Returns defaults if the file doesn't exist or
    /// can't be parsed.
    pub fn load(path: &Path) -> Self {
        let prefs = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<Preferences>(&content).ok())
            .filter(|p| p.version == PREFERENCES_VERSION)
            .unwrap_or_else(|| {
                log::debug!("starting with fresh preferences at {}", path.display());
                Preferences::default()
            });
        Self {
            path: Some(path.to_path_buf()),
            prefs,
        }
    }

    /// Write to the backing file, creating parent directories as needed.
    /// A no-op for in-memory stores.
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.prefs)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn filter_count(&self) -> u32 {
        self.prefs.filter_count
    }

    /// Bump the filter counter, persist, and return the new value.
    ///
    /// A failed write is logged and otherwise ignored: the in-memory count
    /// still advances for this session.
    pub fn increment_filter_count(&mut self) -> u32 {
        self.prefs.filter_count = self.prefs.filter_count.saturating_add(1);
        if let Err(e) = self.save() {
            log::warn!("could not persist preferences: {e}");
        }
        self.prefs.filter_count
    }
}

/// Resolve the preferences file path for a directory.
pub fn preferences_path(dir: &Path) -> PathBuf {
    dir.join(PREFERENCES_FILENAME)
}
