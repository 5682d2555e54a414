//! Event store abstraction.

use anyhow::Result;

use crate::event::PageViewInput;
use crate::summary::AnalyticsSummary;

/// The embedded relational store behind the tracker.
///
/// One instance per page load; never shared across concurrently running
/// trackers. Implementations serialize interleaved calls internally but
/// provide no cross-instance coordination; divergence between instances
/// restored from the same snapshot is an accepted hazard of the design.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Insert one page view and upsert the visitor aggregate row.
    /// Returns the new row's store-assigned id.
    async fn record_page_view(&self, input: &PageViewInput) -> Result<i64>;

    /// Patch a previously inserted row's dwell time by its own id, and
    /// recompute its bounce flag. Returns whether a row matched.
    async fn amend_page_view(&self, id: i64, time_spent_ms: i64) -> Result<bool>;

    /// Legacy amendment for callers that lost the inserted row id: patches
    /// the most recent row matching (visitor, session, path). Unreliable
    /// under rapid re-navigation to the same path; prefer
    /// [`EventStore::amend_page_view`].
    async fn amend_latest_match(
        &self,
        visitor_id: &str,
        session_id: &str,
        path: &str,
        time_spent_ms: i64,
    ) -> Result<bool>;

    /// Summary metrics over page views newer than `now - window_days`.
    async fn summarize(&self, window_days: u32) -> Result<AnalyticsSummary>;

    /// Delete all rows from both tables.
    async fn clear(&self) -> Result<()>;

    /// Serialize the store to a SQLite database image.
    async fn export_snapshot(&self) -> Result<Vec<u8>>;
}
