use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularPage {
    pub path: String,
    pub views: i64,
}

/// Windowed summary returned to dashboard code.
///
/// Aggregation never surfaces an error: on any internal failure the facade
/// returns [`AnalyticsSummary::empty`] instead, so consumers have no
/// null/undefined case to guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub unique_visitors: i64,
    pub total_page_views: i64,
    pub total_sessions: i64,
    /// Count of page views flagged as the first of their session.
    pub new_visitors: i64,
    /// `total_page_views - new_visitors`, clamped at zero. An approximation
    /// of returning traffic, not a distinct-visitor count.
    pub returning_visitors: i64,
    /// Fraction of new sessions that bounced, 0–100, one decimal.
    pub bounce_rate: f64,
    /// Ten most-viewed paths by raw count, descending.
    pub popular_pages: Vec<PopularPage>,
    pub window_days: u32,
    pub generated_at: DateTime<Utc>,
}

impl AnalyticsSummary {
    /// The documented all-zero summary used whenever aggregation fails or the
    /// store is empty.
    pub fn empty(window_days: u32) -> Self {
        Self {
            unique_visitors: 0,
            total_page_views: 0,
            total_sessions: 0,
            new_visitors: 0,
            returning_visitors: 0,
            bounce_rate: 0.0,
            popular_pages: Vec::new(),
            window_days,
            generated_at: Utc::now(),
        }
    }
}
