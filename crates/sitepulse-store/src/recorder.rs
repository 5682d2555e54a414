use anyhow::Result;
use rusqlite::Connection;

use sitepulse_core::error::StoreError;
use sitepulse_core::event::{PageViewInput, BOUNCE_THRESHOLD_MS, DIRECT_REFERRER};

use crate::SqliteStore;

/// Insert one page view row, then upsert the visitor aggregate.
///
/// Returns the new row's id so the caller can amend this exact row at
/// unload time instead of re-deriving a match.
pub(crate) async fn record_page_view_inner(
    db: &SqliteStore,
    input: &PageViewInput,
) -> Result<i64> {
    if input.path.is_empty() {
        return Err(StoreError::Rejected("path is required".to_string()).into());
    }
    if input.visitor_id.is_empty() || input.session_id.is_empty() {
        return Err(StoreError::Rejected("visitor and session ids are required".to_string()).into());
    }

    let conn = db.conn.lock().await;
    let ts = input.timestamp_or_now();
    let referrer = input
        .referrer
        .clone()
        .unwrap_or_else(|| DIRECT_REFERRER.to_string());

    conn.execute(
        "INSERT INTO page_views \
         (visitor_id, session_id, path, timestamp, referrer, user_agent, \
          time_spent, bounced, is_new_session) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            input.visitor_id,
            input.session_id,
            input.path,
            ts,
            referrer,
            input.user_agent,
            input.time_spent_ms,
            input.bounced as i64,
            input.is_new_session as i64,
        ],
    )?;
    let id = conn.last_insert_rowid();

    upsert_visitor(&conn, &input.visitor_id, ts, input.is_new_session)?;

    Ok(id)
}

/// Insert-if-absent with totals of 1, else bump `last_visit` and
/// `total_page_views`. `total_sessions` advances only when the recorded view
/// opened a new tab session.
fn upsert_visitor(
    conn: &Connection,
    visitor_id: &str,
    timestamp_ms: i64,
    is_new_session: bool,
) -> Result<()> {
    conn.execute(
        "INSERT INTO visitors (visitor_id, first_visit, last_visit, total_page_views, total_sessions) \
         VALUES (?1, ?2, ?2, 1, 1) \
         ON CONFLICT(visitor_id) DO UPDATE SET \
             last_visit = excluded.last_visit, \
             total_page_views = total_page_views + 1, \
             total_sessions = total_sessions + ?3",
        rusqlite::params![visitor_id, timestamp_ms, is_new_session as i64],
    )?;
    Ok(())
}

/// Patch a row's dwell time by its own id and recompute the bounce flag.
pub(crate) async fn amend_page_view_inner(
    db: &SqliteStore,
    id: i64,
    time_spent_ms: i64,
) -> Result<bool> {
    let conn = db.conn.lock().await;
    let bounced = time_spent_ms < BOUNCE_THRESHOLD_MS;
    let updated = conn.execute(
        "UPDATE page_views SET time_spent = ?2, bounced = ?3 WHERE id = ?1",
        rusqlite::params![id, time_spent_ms, bounced as i64],
    )?;
    Ok(updated > 0)
}

/// Legacy amendment: patch the most recent row matching
/// (visitor, session, path).
///
/// Under rapid re-navigation to the same path this can patch a different
/// physical row than the one the caller recorded — callers that still hold
/// the inserted row id should use [`amend_page_view_inner`] instead.
pub(crate) async fn amend_latest_match_inner(
    db: &SqliteStore,
    visitor_id: &str,
    session_id: &str,
    path: &str,
    time_spent_ms: i64,
) -> Result<bool> {
    let conn = db.conn.lock().await;
    let bounced = time_spent_ms < BOUNCE_THRESHOLD_MS;
    let updated = conn.execute(
        "UPDATE page_views SET time_spent = ?4, bounced = ?5 \
         WHERE id = ( \
             SELECT id FROM page_views \
             WHERE visitor_id = ?1 AND session_id = ?2 AND path = ?3 \
             ORDER BY timestamp DESC, id DESC LIMIT 1 \
         )",
        rusqlite::params![visitor_id, session_id, path, time_spent_ms, bounced as i64],
    )?;
    Ok(updated > 0)
}
