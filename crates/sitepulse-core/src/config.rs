use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the local backup record and, in production mode,
    /// the default export file.
    pub data_dir: String,
    /// URL of a previously published snapshot, fetched during restore.
    /// `None` disables the fetch step of the restore chain.
    pub snapshot_url: Option<String>,
    /// Where the production-mode export file is written. Defaults to
    /// `<data_dir>/analytics.db` when unset.
    pub export_path: Option<String>,
    /// Minimum interval between successful snapshot persists. Calls inside
    /// the window are skipped, not queued.
    pub snapshot_throttle_ms: u64,
    /// Window applied when a summary caller passes no day count.
    pub default_window_days: u32,
    pub mode: DeployMode,
}

/// Production additionally writes the snapshot to the export file on every
/// persist, the stand-in for a manual upload to the static host. There is
/// no automated remote write-back in either mode.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployMode {
    Development,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            data_dir: std::env::var("SITEPULSE_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            snapshot_url: std::env::var("SITEPULSE_SNAPSHOT_URL").ok().filter(|v| !v.is_empty()),
            export_path: std::env::var("SITEPULSE_EXPORT_PATH").ok().filter(|v| !v.is_empty()),
            snapshot_throttle_ms: std::env::var("SITEPULSE_SNAPSHOT_THROTTLE_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .map_err(|e| format!("invalid snapshot throttle: {e}"))?,
            default_window_days: std::env::var("SITEPULSE_WINDOW_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            mode: {
                let raw = std::env::var("SITEPULSE_MODE")
                    .unwrap_or_else(|_| "development".to_string());
                match raw.as_str() {
                    "production" => DeployMode::Production,
                    _ => DeployMode::Development,
                }
            },
        })
    }

    pub fn snapshot_throttle(&self) -> Duration {
        Duration::from_millis(self.snapshot_throttle_ms)
    }

    /// Resolved export file path for production persists.
    pub fn resolved_export_path(&self) -> String {
        self.export_path
            .clone()
            .unwrap_or_else(|| format!("{}/analytics.db", self.data_dir))
    }
}

impl Default for Config {
    /// Development-mode defaults matching `from_env` with no vars set.
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            snapshot_url: None,
            export_path: None,
            snapshot_throttle_ms: 2000,
            default_window_days: 30,
            mode: DeployMode::Development,
        }
    }
}
