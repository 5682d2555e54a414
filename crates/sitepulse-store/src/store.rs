use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rusqlite::{Connection, DatabaseName, OptionalExtension};
use tokio::sync::Mutex;
use tracing::info;

use sitepulse_core::event::{PageView, Visitor};

use crate::schema::INIT_SQL;

/// Generate a random hex string of `n` bytes (2n hex chars).
pub(crate) fn rand_hex(n: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Scratch file used to round-trip the in-memory database through SQLite's
/// backup API. Deleted immediately after the copy in both directions.
fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("sitepulse-snapshot-{}.db", rand_hex(8)))
}

/// An in-memory SQLite store for page analytics.
///
/// One instance per page load. SQLite connections are not `Sync`, so the
/// connection lives behind `Arc<tokio::sync::Mutex<_>>` and the async runtime
/// serialises interleaved record/summarize calls while the struct stays
/// cheaply cloneable. This is in-process serialisation only: instances in
/// concurrently running trackers never see each other's writes until a
/// snapshot/restore cycle happens to align.
pub struct SqliteStore {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a fresh, empty in-memory store and initialise the schema.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(INIT_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory store seeded from a SQLite database image.
    ///
    /// The schema init runs after the restore so snapshots written by older
    /// deployments pick up any tables or indexes they are missing. Fails if
    /// `bytes` is not a readable SQLite image; callers fall back to
    /// [`SqliteStore::open_in_memory`].
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self> {
        let path = scratch_path();
        std::fs::write(&path, bytes)?;
        let mut conn = Connection::open_in_memory()?;
        let restored = conn.restore(
            DatabaseName::Main,
            &path,
            None::<fn(rusqlite::backup::Progress)>,
        );
        let _ = std::fs::remove_file(&path);
        restored?;
        conn.execute_batch(INIT_SQL)?;
        info!(bytes = bytes.len(), "store restored from snapshot image");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Serialize the store to a SQLite database image.
    pub async fn export_snapshot(&self) -> Result<Vec<u8>> {
        let conn = self.conn.lock().await;
        let path = scratch_path();
        let result = (|| -> Result<Vec<u8>> {
            conn.backup(DatabaseName::Main, &path, None)?;
            Ok(std::fs::read(&path)?)
        })();
        let _ = std::fs::remove_file(&path);
        result
    }

    /// Delete all rows from both tables. The store stays open and writable.
    pub async fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("DELETE FROM page_views; DELETE FROM visitors;")?;
        info!("all analytics rows cleared");
        Ok(())
    }

    pub async fn page_view_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM page_views", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Most recently inserted page views, newest first.
    pub async fn recent_page_views(&self, limit: i64) -> Result<Vec<PageView>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, visitor_id, session_id, path, timestamp, referrer, user_agent, \
                    time_spent, bounced, is_new_session \
             FROM page_views ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![limit], |row| {
                Ok(PageView {
                    id: row.get(0)?,
                    visitor_id: row.get(1)?,
                    session_id: row.get(2)?,
                    path: row.get(3)?,
                    timestamp_ms: row.get(4)?,
                    referrer: row.get(5)?,
                    user_agent: row.get(6)?,
                    time_spent_ms: row.get(7)?,
                    bounced: row.get::<_, i64>(8)? != 0,
                    is_new_session: row.get::<_, i64>(9)? != 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub async fn get_visitor(&self, visitor_id: &str) -> Result<Option<Visitor>> {
        let conn = self.conn.lock().await;
        let visitor = conn
            .query_row(
                "SELECT visitor_id, first_visit, last_visit, total_page_views, total_sessions \
                 FROM visitors WHERE visitor_id = ?1",
                rusqlite::params![visitor_id],
                |row| {
                    Ok(Visitor {
                        visitor_id: row.get(0)?,
                        first_visit_ms: row.get(1)?,
                        last_visit_ms: row.get(2)?,
                        total_page_views: row.get(3)?,
                        total_sessions: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(visitor)
    }

    /// Acquire the connection lock for direct queries.
    ///
    /// Intended for integration tests that need to verify stored data.
    /// Production code should use the typed methods above.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
