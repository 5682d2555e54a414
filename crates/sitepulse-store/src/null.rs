use async_trait::async_trait;

use sitepulse_core::error::StoreError;
use sitepulse_core::event::PageViewInput;
use sitepulse_core::store::EventStore;
use sitepulse_core::summary::AnalyticsSummary;

/// [`EventStore`] that records nothing and reports empty summaries.
///
/// Installed by the tracker when even an in-memory engine cannot be opened,
/// so the facade keeps its never-fails contract while the page runs without
/// analytics. Writes surface as tagged failures; reads yield the documented
/// zero state.
pub struct NullStore;

#[async_trait]
impl EventStore for NullStore {
    async fn record_page_view(&self, _input: &PageViewInput) -> anyhow::Result<i64> {
        Err(StoreError::Unavailable("analytics engine failed to open".to_string()).into())
    }

    async fn amend_page_view(&self, _id: i64, _time_spent_ms: i64) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn amend_latest_match(
        &self,
        _visitor_id: &str,
        _session_id: &str,
        _path: &str,
        _time_spent_ms: i64,
    ) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn summarize(&self, window_days: u32) -> anyhow::Result<AnalyticsSummary> {
        Ok(AnalyticsSummary::empty(window_days))
    }

    async fn clear(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn export_snapshot(&self) -> anyhow::Result<Vec<u8>> {
        Err(StoreError::Unavailable("nothing to snapshot".to_string()).into())
    }
}
