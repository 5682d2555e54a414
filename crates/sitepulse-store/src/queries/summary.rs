use anyhow::Result;
use chrono::Utc;

use sitepulse_core::summary::{AnalyticsSummary, PopularPage};

use crate::SqliteStore;

/// Window-bounded summary over `page_views`.
///
/// Bounced sessions are counted only among new sessions; a view amended to
/// bounced=1 in a continuing session does not move the rate. The returning
/// figure is `total_page_views - new_sessions` clamped at zero, a looseness
/// inherited from the metric's definition rather than a distinct-visitor
/// count.
pub(crate) async fn summarize_inner(
    db: &SqliteStore,
    window_days: u32,
) -> Result<AnalyticsSummary> {
    let conn = db.conn.lock().await;
    let cutoff_ms = Utc::now().timestamp_millis() - i64::from(window_days) * 86_400_000;

    let (unique_visitors, total_page_views, total_sessions, new_sessions, bounced_new_sessions) =
        conn.query_row(
            "SELECT \
                 COUNT(DISTINCT visitor_id), \
                 COUNT(*), \
                 COUNT(DISTINCT session_id), \
                 COALESCE(SUM(CASE WHEN is_new_session = 1 THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(CASE WHEN bounced = 1 AND is_new_session = 1 THEN 1 ELSE 0 END), 0) \
             FROM page_views \
             WHERE timestamp > ?1",
            rusqlite::params![cutoff_ms],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )?;

    let mut stmt = conn.prepare(
        "SELECT path, COUNT(*) AS views \
         FROM page_views \
         WHERE timestamp > ?1 \
         GROUP BY path \
         ORDER BY views DESC \
         LIMIT 10",
    )?;
    let popular_pages = stmt
        .query_map(rusqlite::params![cutoff_ms], |row| {
            Ok(PopularPage {
                path: row.get(0)?,
                views: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let bounce_rate = if new_sessions > 0 {
        round1(bounced_new_sessions as f64 / new_sessions as f64 * 100.0)
    } else {
        0.0
    };

    Ok(AnalyticsSummary {
        unique_visitors,
        total_page_views,
        total_sessions,
        new_visitors: new_sessions,
        returning_visitors: (total_page_views - new_sessions).max(0),
        bounce_rate,
        popular_pages,
        window_days,
        generated_at: Utc::now(),
    })
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::round1;

    #[test]
    fn round1_keeps_one_decimal() {
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round1(50.0), 50.0);
    }
}
