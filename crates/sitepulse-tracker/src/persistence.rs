use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sitepulse_core::config::{Config, DeployMode};
use sitepulse_core::store::EventStore;
use sitepulse_store::{NullStore, SqliteStore};

/// Local backup record: the browser-storage pair (base64 blob + timestamp)
/// folded into one JSON file in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Base64-encoded SQLite database image.
    pub data: String,
    pub saved_at_ms: i64,
}

/// File-backed stand-in for tab-durable local storage.
///
/// Consumers tolerate absence or corruption of the file: both read as
/// "no backup" and the restore chain moves on.
pub struct LocalBackup {
    path: PathBuf,
}

impl LocalBackup {
    pub fn new(data_dir: &str) -> Self {
        Self {
            path: Path::new(data_dir).join("backup.json"),
        }
    }

    pub fn read(&self) -> Option<BackupRecord> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "backup record unreadable, ignoring");
                None
            }
        }
    }

    pub fn write(&self, record: &BackupRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec(record)?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Persisted,
    /// Skipped inside the throttle window. The newest state is simply
    /// dropped until a later call lands outside the window.
    Throttled,
    /// Snapshot export failed; logged, no retry.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreSource {
    LocalBackup,
    PublishedSnapshot,
    Fresh,
    /// Even an empty in-memory engine could not be opened; the tracker
    /// runs on a null store.
    Unavailable,
}

/// Serializes the store to a SQLite image and makes it as durable as a
/// static deployment allows: a local backup record always, plus the export
/// file in production mode (the stand-in for a manual upload). There is no
/// automated remote write-back; divergence between concurrently running
/// pages is accepted, not arbitrated.
pub struct PersistenceBridge {
    backup: LocalBackup,
    snapshot_url: Option<String>,
    export_path: Option<PathBuf>,
    throttle: Duration,
    last_persist: Mutex<Option<Instant>>,
    http: Option<reqwest::Client>,
}

impl PersistenceBridge {
    pub fn new(config: &Config) -> Self {
        let export_path = match config.mode {
            DeployMode::Production => Some(PathBuf::from(config.resolved_export_path())),
            DeployMode::Development => None,
        };
        // A client that fails to build only disables the fetch step of the
        // restore chain; it never fails construction.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .ok();
        Self {
            backup: LocalBackup::new(&config.data_dir),
            snapshot_url: config.snapshot_url.clone(),
            export_path,
            throttle: config.snapshot_throttle(),
            last_persist: Mutex::new(None),
            http,
        }
    }

    /// Throttled snapshot-and-persist.
    ///
    /// Calls within the minimum interval since the last successful persist
    /// are silently skipped: no queuing, no coalescing.
    pub async fn snapshot(&self, store: &dyn EventStore) -> PersistOutcome {
        if !self.throttle_open() {
            debug!("snapshot skipped by throttle");
            return PersistOutcome::Throttled;
        }
        self.persist_now(store).await
    }

    /// Unthrottled persist. Used by the explicit wipe so the empty image
    /// always lands, and available to hosts that manage their own cadence.
    pub async fn persist_now(&self, store: &dyn EventStore) -> PersistOutcome {
        let image = match store.export_snapshot().await {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "snapshot export failed");
                return PersistOutcome::Failed;
            }
        };

        let record = BackupRecord {
            data: BASE64.encode(&image),
            saved_at_ms: Utc::now().timestamp_millis(),
        };
        if let Err(e) = self.backup.write(&record) {
            warn!(error = %e, "local backup write failed");
        }

        if let Some(path) = &self.export_path {
            if let Err(e) = write_export_file(path, &image) {
                warn!(path = %path.display(), error = %e, "export file write failed");
            }
        }

        *self.lock_last_persist() = Some(Instant::now());
        info!(bytes = image.len(), "snapshot persisted");
        PersistOutcome::Persisted
    }

    /// Restore chain: local backup, then the published snapshot file, then a
    /// fresh empty store. Never fails; every step degrades to the next.
    pub async fn restore(&self) -> (Arc<dyn EventStore>, RestoreSource) {
        if let Some(record) = self.backup.read() {
            match BASE64.decode(&record.data) {
                Ok(bytes) => match SqliteStore::from_snapshot(&bytes) {
                    Ok(store) => {
                        info!(saved_at_ms = record.saved_at_ms, "restored from local backup");
                        return (Arc::new(store), RestoreSource::LocalBackup);
                    }
                    Err(e) => warn!(error = %e, "local backup image unusable"),
                },
                Err(e) => warn!(error = %e, "local backup is not valid base64"),
            }
        }

        if let (Some(url), Some(http)) = (&self.snapshot_url, &self.http) {
            match fetch_snapshot(http, url).await {
                Ok(bytes) => match SqliteStore::from_snapshot(&bytes) {
                    Ok(store) => {
                        info!(url = %url, "restored from published snapshot");
                        return (Arc::new(store), RestoreSource::PublishedSnapshot);
                    }
                    Err(e) => warn!(url = %url, error = %e, "published snapshot unusable"),
                },
                Err(e) => warn!(url = %url, error = %e, "published snapshot fetch failed"),
            }
        }

        match SqliteStore::open_in_memory() {
            Ok(store) => (Arc::new(store), RestoreSource::Fresh),
            Err(e) => {
                warn!(error = %e, "in-memory store unavailable, analytics disabled");
                (Arc::new(NullStore), RestoreSource::Unavailable)
            }
        }
    }

    fn throttle_open(&self) -> bool {
        match *self.lock_last_persist() {
            Some(at) if at.elapsed() < self.throttle => false,
            _ => true,
        }
    }

    fn lock_last_persist(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.last_persist
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn write_export_file(path: &Path, image: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, image)?;
    Ok(())
}

async fn fetch_snapshot(http: &reqwest::Client, url: &str) -> anyhow::Result<Vec<u8>> {
    let response = http.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
