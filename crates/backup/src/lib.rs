use chrono::{DateTime, Local};
use pkgver_core::{run_batch, BatchEvent, BatchReport, PackageManager, PinnedPackage};
use pkgver_error::{PkgverError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub const DEFAULT_BACKUP_DIR: &str = "package_backups";
const FILE_PREFIX: &str = "package_versions_";
const FILE_SUFFIX: &str = ".json";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub backup_dir: PathBuf,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
        }
    }
}

/// Timestamped version snapshots in one directory.
pub struct BackupStore {
    backup_dir: PathBuf,
}

impl BackupStore {
    pub fn new() -> Self {
        Self::new_with_config(BackupConfig::default())
    }

    pub fn new_with_config(config: BackupConfig) -> Self {
        Self {
            backup_dir: config.backup_dir,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.backup_dir)
            .await
            .map_err(|e| PkgverError::BackupError {
                message: format!("failed to create backup directory: {}", e),
            })
    }

    pub fn snapshot_path(&self, at: DateTime<Local>) -> PathBuf {
        self.backup_dir.join(format!(
            "{}{}{}",
            FILE_PREFIX,
            at.format(TIMESTAMP_FORMAT),
            FILE_SUFFIX
        ))
    }

    /// Write `entries` to a snapshot named after the current time.
    pub async fn backup(&self, entries: &[PinnedPackage]) -> Result<PathBuf> {
        self.backup_at(entries, Local::now()).await
    }

    pub async fn backup_at(&self, entries: &[PinnedPackage], at: DateTime<Local>) -> Result<PathBuf> {
        if entries.is_empty() {
            return Err(PkgverError::EmptySnapshot);
        }
        self.ensure_dir().await?;

        let path = self.snapshot_path(at);
        let content = encode_snapshot(entries)?;
        fs::write(&path, content)
            .await
            .map_err(|e| PkgverError::BackupError {
                message: format!("failed to write {}: {}", path.display(), e),
            })?;

        info!("backup written: {} ({} packages)", path.display(), entries.len());
        Ok(path)
    }

    /// Snapshot files, newest first. A missing directory has no backups.
    pub async fn list_backups(&self) -> Result<Vec<PathBuf>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.backup_dir)
            .await
            .map_err(|e| PkgverError::BackupError {
                message: format!("failed to list backups: {}", e),
            })?;

        let mut backups = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PkgverError::BackupError {
                message: format!("failed to list backups: {}", e),
            })?
        {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with(FILE_PREFIX) && file_name.ends_with(FILE_SUFFIX) {
                backups.push(entry.path());
            }
        }

        backups.sort_by(|a, b| b.cmp(a));
        debug!("found {} backups", backups.len());
        Ok(backups)
    }

    pub async fn load(&self, path: &Path) -> Result<Vec<PinnedPackage>> {
        let content = fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(|e| PkgverError::DecodeError {
            context: format!("backup file {}", path.display()),
            message: e.to_string(),
        })
    }

    /// Reinstall every entry of the snapshot at `path`.
    pub async fn restore<M, P>(&self, path: &Path, manager: &M, on_event: P) -> Result<BatchReport>
    where
        M: PackageManager + ?Sized,
        P: FnMut(BatchEvent<'_>),
    {
        let entries = self.load(path).await?;
        Ok(restore_entries(manager, &entries, on_event).await)
    }
}

impl Default for BackupStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs each entry at its pinned version into the global environment,
/// continuing past failures.
pub async fn restore_entries<M, P>(manager: &M, entries: &[PinnedPackage], on_event: P) -> BatchReport
where
    M: PackageManager + ?Sized,
    P: FnMut(BatchEvent<'_>),
{
    info!("restoring {} packages", entries.len());
    run_batch(
        entries,
        |entry| async move { manager.install_exact(&entry.name, &entry.version).await },
        on_event,
    )
    .await
}

fn encode_snapshot(entries: &[PinnedPackage]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entries
        .serialize(&mut serializer)
        .map_err(|e| PkgverError::BackupError {
            message: format!("failed to encode snapshot: {}", e),
        })?;
    Ok(buf)
}
