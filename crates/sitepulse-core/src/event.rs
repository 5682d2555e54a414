use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Dwell time below this many milliseconds marks a page view as bounced.
pub const BOUNCE_THRESHOLD_MS: i64 = 30_000;

/// Sentinel referrer recorded when the client arrived with no referrer.
pub const DIRECT_REFERRER: &str = "direct";

/// The payload a page hands to the recorder for one page view.
///
/// `path` is the only required field. `timestamp_ms` defaults to now and
/// `referrer` to [`DIRECT_REFERRER`] at insert time. Visitor and session ids
/// are resolved by the tracker facade from tab-scoped storage before the
/// input reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageViewInput {
    pub path: String,
    pub visitor_id: String,
    pub session_id: String,
    pub timestamp_ms: Option<i64>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub time_spent_ms: i64,
    pub bounced: bool,
    /// True only for the first page view observed in a tab-lifetime session.
    pub is_new_session: bool,
}

impl PageViewInput {
    pub fn new(path: &str, visitor_id: &str, session_id: &str) -> Self {
        Self {
            path: path.to_string(),
            visitor_id: visitor_id.to_string(),
            session_id: session_id.to_string(),
            timestamp_ms: None,
            referrer: None,
            user_agent: None,
            time_spent_ms: 0,
            bounced: false,
            is_new_session: false,
        }
    }

    /// Event time, defaulting to now when the caller supplied none.
    pub fn timestamp_or_now(&self) -> i64 {
        self.timestamp_ms
            .unwrap_or_else(|| Utc::now().timestamp_millis())
    }
}

/// The stored version of a page view — mirrors the `page_views` table columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    pub id: i64,
    pub visitor_id: String,
    pub session_id: String,
    pub path: String,
    pub timestamp_ms: i64,
    pub referrer: String,
    pub user_agent: Option<String>,
    pub time_spent_ms: i64,
    pub bounced: bool,
    pub is_new_session: bool,
}

/// Mirror of a `visitors` aggregate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visitor {
    pub visitor_id: String,
    pub first_visit_ms: i64,
    pub last_visit_ms: i64,
    pub total_page_views: i64,
    pub total_sessions: i64,
}

/// Tagged result of a record attempt.
///
/// Write failures never cross the facade boundary as errors; callers branch
/// on `success` and, when recording worked, carry `id` forward for the
/// unload-time amendment.
#[derive(Debug, Clone, Serialize)]
pub struct RecordOutcome {
    pub success: bool,
    pub id: Option<i64>,
    pub error: Option<String>,
}

impl RecordOutcome {
    pub fn recorded(id: i64) -> Self {
        Self {
            success: true,
            id: Some(id),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_defaults_are_inert() {
        let input = PageViewInput::new("/about.html", "v_1", "s_1");
        assert_eq!(input.time_spent_ms, 0);
        assert!(!input.bounced);
        assert!(!input.is_new_session);
        assert!(input.referrer.is_none());
    }

    #[test]
    fn timestamp_or_now_prefers_explicit_value() {
        let mut input = PageViewInput::new("/", "v_1", "s_1");
        input.timestamp_ms = Some(1_700_000_000_000);
        assert_eq!(input.timestamp_or_now(), 1_700_000_000_000);
    }
}
