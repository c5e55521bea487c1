// ⚙️ Store Configuration - where the durable file and its backups live
//
// Resolution order: explicit value (CLI flag) > environment > default.

use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_FILE: &str = "file.json";
pub const STORE_FILE_ENV: &str = "PROPERTY_STORE_FILE";
pub const BACKUP_DIR_ENV: &str = "PROPERTY_STORE_BACKUP_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// The durable file, rewritten wholesale on every save
    pub path: PathBuf,

    /// Where backups go (None = next to the durable file)
    pub backup_dir: Option<PathBuf>,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            path: path.into(),
            backup_dir: None,
        }
    }

    /// Builder: send backups to a dedicated directory
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    /// Read `PROPERTY_STORE_FILE` / `PROPERTY_STORE_BACKUP_DIR`, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(STORE_FILE_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_FILE.to_string());

        let mut config = StoreConfig::new(path);
        if let Some(dir) = lookup(BACKUP_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            config = config.with_backup_dir(dir);
        }
        config
    }

    /// Directory backups are written to
    pub fn backup_dir(&self) -> PathBuf {
        match &self.backup_dir {
            Some(dir) => dir.clone(),
            None => parent_dir(&self.path),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::new(DEFAULT_STORE_FILE)
    }
}

/// Parent directory of a file path; "." for bare file names
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
