//! State snapshot and restore.
//!
//! Writes timestamped JSON snapshots of engine state so a restart can
//! recover configuration and open-position context. Snapshots are taken
//! once per configured interval plus once at shutdown, and old files are
//! pruned beyond the retention limit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Backup IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backup serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type BackupResult<T> = Result<T, BackupError>;

/// Backup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_interval_hours() -> u64 {
    6
}

fn default_max_backups() -> usize {
    10
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backup_dir: default_backup_dir(),
            interval_hours: default_interval_hours(),
            max_backups: default_max_backups(),
        }
    }
}

/// Snapshot file contents.
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupData {
    pub timestamp: DateTime<Utc>,
    /// Arbitrary engine state (ledger, config echo).
    pub state: serde_json::Value,
}

/// Manages timestamped JSON snapshots with retention.
pub struct BackupManager {
    dir: PathBuf,
    interval_hours: u64,
    max_backups: usize,
    last_backup: Option<DateTime<Utc>>,
}

impl BackupManager {
    /// Create the manager, ensuring the backup directory exists.
    pub fn new(config: &BackupConfig) -> BackupResult<Self> {
        std::fs::create_dir_all(&config.backup_dir)?;
        Ok(Self {
            dir: config.backup_dir.clone(),
            interval_hours: config.interval_hours,
            max_backups: config.max_backups,
            last_backup: None,
        })
    }

    /// Write a snapshot now. Returns the snapshot path.
    pub fn create_backup(&mut self, state: serde_json::Value) -> BackupResult<PathBuf> {
        let now = Utc::now();
        let file = self
            .dir
            .join(format!("backup_{}.json", now.format("%Y%m%d_%H%M%S%3f")));

        let data = BackupData {
            timestamp: now,
            state,
        };
        std::fs::write(&file, serde_json::to_vec_pretty(&data)?)?;
        self.last_backup = Some(now);
        info!(path = %file.display(), "Backup created");

        self.cleanup_old_backups();
        Ok(file)
    }

    /// Write a snapshot if the configured interval has elapsed.
    ///
    /// The first call always snapshots. Returns the path when one was taken.
    pub fn auto_backup(&mut self, state: serde_json::Value) -> BackupResult<Option<PathBuf>> {
        let due = match self.last_backup {
            None => true,
            Some(last) => {
                let elapsed = Utc::now() - last;
                elapsed.num_hours() >= self.interval_hours as i64
            }
        };
        if due {
            Ok(Some(self.create_backup(state)?))
        } else {
            Ok(None)
        }
    }

    /// Read a snapshot back.
    pub fn restore_backup(path: &Path) -> BackupResult<BackupData> {
        let bytes = std::fs::read(path)?;
        let data = serde_json::from_slice(&bytes)?;
        info!(path = %path.display(), "Backup restored");
        Ok(data)
    }

    /// All snapshot paths, newest first.
    pub fn list_backups(&self) -> BackupResult<Vec<PathBuf>> {
        let mut backups: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("backup_") && n.ends_with(".json"))
            })
            .collect();
        backups.sort();
        backups.reverse();
        Ok(backups)
    }

    /// The most recent snapshot, if any.
    pub fn latest_backup(&self) -> BackupResult<Option<PathBuf>> {
        Ok(self.list_backups()?.into_iter().next())
    }

    fn cleanup_old_backups(&self) {
        let Ok(backups) = self.list_backups() else {
            return;
        };
        for old in backups.iter().skip(self.max_backups) {
            match std::fs::remove_file(old) {
                Ok(()) => info!(path = %old.display(), "Removed old backup"),
                Err(e) => warn!(path = %old.display(), error = %e, "Failed to remove old backup"),
            }
        }
    }
}
