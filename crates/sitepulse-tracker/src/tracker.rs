use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use sitepulse_core::config::Config;
use sitepulse_core::event::{PageViewInput, RecordOutcome};
use sitepulse_core::identity::ClientEnv;
use sitepulse_core::store::EventStore;
use sitepulse_core::summary::AnalyticsSummary;

use crate::persistence::PersistenceBridge;
use crate::tab::TabStorage;

/// Route and referrer of the page being tracked.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub path: String,
    pub referrer: Option<String>,
}

impl PageContext {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            referrer: None,
        }
    }
}

/// The row recorded for the page currently on screen, retained so the
/// unload amendment patches exactly that row.
struct CurrentView {
    row_id: i64,
    opened_at: Instant,
}

/// Facade owning one page load's analytics lifecycle: restore the store,
/// resolve identity, record the entry view, amend it on unload, persist
/// snapshots, answer summary queries.
///
/// Every public method is safe to call at any point and never raises:
/// writes come back as tagged [`RecordOutcome`]s and reads degrade to the
/// documented zero state.
pub struct Tracker {
    store: Arc<dyn EventStore>,
    bridge: PersistenceBridge,
    tab: TabStorage,
    env: ClientEnv,
    visitor_id: String,
    session_id: String,
    current: Mutex<Option<CurrentView>>,
    default_window_days: u32,
}

impl Tracker {
    /// Drive Restoring → Ready, then record the entry page view.
    ///
    /// Never fails: restore degrades toward an empty (or, at worst, null)
    /// store, and an entry view that cannot be recorded is logged and
    /// dropped. The returned tracker is always usable.
    pub async fn init(config: &Config, env: ClientEnv, entry: PageContext) -> Self {
        let bridge = PersistenceBridge::new(config);
        let (store, source) = bridge.restore().await;
        info!(source = ?source, "analytics store ready");

        let tab = TabStorage::new();
        let visitor_id = tab.visitor_id(&env);
        let session_id = tab.session_id();

        let tracker = Self {
            store,
            bridge,
            tab,
            env,
            visitor_id,
            session_id,
            current: Mutex::new(None),
            default_window_days: config.default_window_days,
        };

        let outcome = tracker.track_page_view(entry).await;
        if !outcome.success {
            warn!(error = ?outcome.error, "entry page view was not recorded");
        }
        tracker
    }

    /// Record a page view for an in-tab navigation.
    ///
    /// The previous page's retained row is replaced; if the host never
    /// called [`Tracker::end_page_view`] for it, that row keeps its default
    /// dwell time, an accepted loss rather than an error.
    pub async fn track_page_view(&self, page: PageContext) -> RecordOutcome {
        let now_ms = Utc::now().timestamp_millis();
        let is_new_session = self.tab.begin_page_view(now_ms);

        let mut input = PageViewInput::new(&page.path, &self.visitor_id, &self.session_id);
        input.timestamp_ms = Some(now_ms);
        input.referrer = page.referrer;
        input.user_agent = Some(self.env.user_agent.clone()).filter(|ua| !ua.is_empty());
        input.is_new_session = is_new_session;

        match self.store.record_page_view(&input).await {
            Ok(id) => {
                *self.current.lock().await = Some(CurrentView {
                    row_id: id,
                    opened_at: Instant::now(),
                });
                self.bridge.snapshot(self.store.as_ref()).await;
                RecordOutcome::recorded(id)
            }
            Err(e) => {
                warn!(path = %input.path, error = %e, "page view not recorded");
                RecordOutcome::failed(e.to_string())
            }
        }
    }

    /// Best-effort unload hook: amend the retained row's dwell time and
    /// bounce flag, then persist a final (throttled) snapshot.
    ///
    /// The host environment may terminate the page before this completes;
    /// callers must not rely on it having run, and bounce figures are
    /// approximate for exactly that reason. Returns whether the amendment
    /// was applied.
    pub async fn end_page_view(&self) -> bool {
        let Some(view) = self.current.lock().await.take() else {
            return false;
        };
        let time_spent_ms = view.opened_at.elapsed().as_millis() as i64;
        match self.store.amend_page_view(view.row_id, time_spent_ms).await {
            Ok(true) => {
                self.bridge.snapshot(self.store.as_ref()).await;
                true
            }
            Ok(false) => {
                warn!(row_id = view.row_id, "unload amendment matched no row");
                false
            }
            Err(e) => {
                warn!(error = %e, "unload amendment failed");
                false
            }
        }
    }

    /// Summary over `window_days`, or the configured default when `None`.
    /// Returns the documented zero state on any internal failure.
    pub async fn summary(&self, window_days: Option<u32>) -> AnalyticsSummary {
        let days = window_days.unwrap_or(self.default_window_days);
        match self.store.summarize(days).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "summary failed, returning zero state");
                AnalyticsSummary::empty(days)
            }
        }
    }

    /// Wipe all analytics rows, persist the empty image (bypassing the
    /// throttle so the wipe is durable), and drop the tab identity markers.
    pub async fn clear_all_data(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "clear failed");
        }
        self.bridge.persist_now(self.store.as_ref()).await;
        *self.current.lock().await = None;
        self.tab.clear();
        info!("all analytics data cleared");
    }

    /// Identity resolved at init time. A storage clear during the page's
    /// lifetime does not retroactively change these; the next page load
    /// picks up fresh ids.
    pub fn visitor_id(&self) -> &str {
        &self.visitor_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
