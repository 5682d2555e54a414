use async_trait::async_trait;

use sitepulse_core::event::PageViewInput;
use sitepulse_core::store::EventStore;
use sitepulse_core::summary::AnalyticsSummary;

use crate::SqliteStore;

#[async_trait]
impl EventStore for SqliteStore {
    async fn record_page_view(&self, input: &PageViewInput) -> anyhow::Result<i64> {
        crate::recorder::record_page_view_inner(self, input).await
    }

    async fn amend_page_view(&self, id: i64, time_spent_ms: i64) -> anyhow::Result<bool> {
        crate::recorder::amend_page_view_inner(self, id, time_spent_ms).await
    }

    async fn amend_latest_match(
        &self,
        visitor_id: &str,
        session_id: &str,
        path: &str,
        time_spent_ms: i64,
    ) -> anyhow::Result<bool> {
        crate::recorder::amend_latest_match_inner(self, visitor_id, session_id, path, time_spent_ms)
            .await
    }

    async fn summarize(&self, window_days: u32) -> anyhow::Result<AnalyticsSummary> {
        crate::queries::summary::summarize_inner(self, window_days).await
    }

    async fn clear(&self) -> anyhow::Result<()> {
        SqliteStore::clear(self).await
    }

    async fn export_snapshot(&self) -> anyhow::Result<Vec<u8>> {
        SqliteStore::export_snapshot(self).await
    }
}
