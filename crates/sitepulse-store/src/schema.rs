/// SQLite initialization SQL.
///
/// Executed via `Connection::execute_batch` at open time and again after a
/// snapshot restore. All statements use `IF NOT EXISTS` so they are safe to
/// re-run (idempotent), including against snapshots produced before an index
/// was added.
///
/// Timestamps are integer milliseconds since epoch: the summary window
/// cutoff and the visitor first/last columns compare against
/// `Utc::now().timestamp_millis()` directly, never against SQLite's
/// `CURRENT_TIMESTAMP` text form. `created_at` exists only as a row audit
/// column and takes no part in any query.
pub const INIT_SQL: &str = r#"
-- ===========================================
-- PAGE VIEWS (main analytics table)
-- ===========================================
CREATE TABLE IF NOT EXISTS page_views (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    visitor_id      TEXT NOT NULL,
    session_id      TEXT NOT NULL,
    path            TEXT NOT NULL,
    timestamp       INTEGER NOT NULL,              -- epoch millis
    referrer        TEXT NOT NULL DEFAULT 'direct',
    user_agent      TEXT,
    time_spent      INTEGER NOT NULL DEFAULT 0,    -- millis, back-filled on unload
    bounced         INTEGER NOT NULL DEFAULT 0,    -- time_spent < 30s at amend time
    is_new_session  INTEGER NOT NULL DEFAULT 0,    -- first view of a tab session
    created_at      TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Primary query pattern: window cutoff scan
CREATE INDEX IF NOT EXISTS idx_page_views_timestamp ON page_views(timestamp);

-- Popular-pages grouping
CREATE INDEX IF NOT EXISTS idx_page_views_path ON page_views(path);

-- Legacy most-recent-match amendment lookup
CREATE INDEX IF NOT EXISTS idx_page_views_visit
    ON page_views(visitor_id, session_id, path, timestamp DESC);

-- ===========================================
-- VISITORS (aggregate, upserted on each view)
-- ===========================================
CREATE TABLE IF NOT EXISTS visitors (
    visitor_id      TEXT PRIMARY KEY,
    first_visit     INTEGER NOT NULL,              -- epoch millis
    last_visit      INTEGER NOT NULL,              -- epoch millis
    total_page_views INTEGER NOT NULL DEFAULT 1,   -- incremented on upsert
    total_sessions  INTEGER NOT NULL DEFAULT 1,    -- incremented on new-session views
    created_at      TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;
