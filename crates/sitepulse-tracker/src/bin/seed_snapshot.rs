use anyhow::Result;
use tracing::info;

use sitepulse_store::SqliteStore;

/// `seed-snapshot` — publish an empty, schema-initialised snapshot image at
/// the configured export path (`SITEPULSE_EXPORT_PATH`, default
/// `<SITEPULSE_DATA_DIR>/analytics.db`) so the static host serves a
/// fetchable database file from day one.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse()?),
        )
        .init();

    let cfg = sitepulse_core::config::Config::from_env().map_err(anyhow::Error::msg)?;
    let out = cfg.resolved_export_path();

    let store = SqliteStore::open_in_memory()?;
    let image = store.export_snapshot().await?;

    if let Some(parent) = std::path::Path::new(&out).parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&out, &image)?;
    info!(path = %out, bytes = image.len(), "seed snapshot written");
    Ok(())
}
