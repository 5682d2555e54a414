use sitepulse_core::config::Config;
use sitepulse_core::identity::ClientEnv;
use sitepulse_tracker::{PageContext, Tracker};

/// Fresh per-test data directory under the system temp dir.
fn temp_data_dir(tag: &str) -> String {
    let dir = std::env::temp_dir().join(format!("sitepulse-trk-{}-{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir.to_string_lossy().into_owned()
}

fn config(tag: &str) -> Config {
    Config {
        data_dir: temp_data_dir(tag),
        // Tests drive several persists back to back.
        snapshot_throttle_ms: 0,
        ..Config::default()
    }
}

fn client_env() -> ClientEnv {
    ClientEnv {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) Chrome/120".to_string(),
        language: "en-US".to_string(),
        screen_width: 1920,
        screen_height: 1080,
        timezone_offset_minutes: 0,
        canvas_sample: "sample".to_string(),
    }
}

#[tokio::test]
async fn test_init_records_entry_page_view() {
    let tracker = Tracker::init(&config("entry"), client_env(), PageContext::new("/")).await;

    let summary = tracker.summary(None).await;
    assert_eq!(summary.total_page_views, 1);
    assert_eq!(summary.unique_visitors, 1);
    assert_eq!(summary.new_visitors, 1, "entry view opens the tab session");
    assert_eq!(summary.popular_pages[0].path, "/");
}

#[tokio::test]
async fn test_in_tab_navigation_is_not_a_new_session() {
    let tracker = Tracker::init(&config("navigation"), client_env(), PageContext::new("/")).await;

    let outcome = tracker.track_page_view(PageContext::new("/blog.html")).await;
    assert!(outcome.success);
    assert!(outcome.id.is_some());

    let summary = tracker.summary(None).await;
    assert_eq!(summary.total_page_views, 2);
    assert_eq!(summary.unique_visitors, 1);
    assert_eq!(summary.new_visitors, 1, "only the entry view is session-opening");
}

#[tokio::test]
async fn test_end_page_view_amends_dwell_and_bounce() {
    let tracker = Tracker::init(&config("unload"), client_env(), PageContext::new("/")).await;

    assert!(tracker.end_page_view().await);
    // Dwell was near-zero, far under the 30s bounce threshold.
    let summary = tracker.summary(None).await;
    assert_eq!(summary.bounce_rate, 100.0);

    // The retained row is consumed; a second unload is a no-op.
    assert!(!tracker.end_page_view().await);
}

#[tokio::test]
async fn test_summary_uses_configured_default_window() {
    let cfg = Config {
        default_window_days: 7,
        ..config("window")
    };
    let tracker = Tracker::init(&cfg, client_env(), PageContext::new("/")).await;

    assert_eq!(tracker.summary(None).await.window_days, 7);
    assert_eq!(tracker.summary(Some(90)).await.window_days, 90);
}

#[tokio::test]
async fn test_views_survive_into_the_next_page_load() {
    let cfg = config("next-load");

    // First page load: records its entry view and persists it.
    let first = Tracker::init(&cfg, client_env(), PageContext::new("/")).await;
    assert_eq!(first.summary(None).await.total_page_views, 1);
    drop(first);

    // Second page load restores the backup, then records its own entry.
    let second = Tracker::init(&cfg, client_env(), PageContext::new("/cv.html")).await;
    let summary = second.summary(None).await;
    assert_eq!(summary.total_page_views, 2);
    assert_eq!(
        summary.unique_visitors, 2,
        "each tab-lifetime storage mints its own visitor id"
    );
}

#[tokio::test]
async fn test_clear_all_data_zeroes_summary_and_backup() {
    let cfg = config("clear");

    let tracker = Tracker::init(&cfg, client_env(), PageContext::new("/")).await;
    assert_eq!(tracker.summary(None).await.total_page_views, 1);

    tracker.clear_all_data().await;
    let summary = tracker.summary(None).await;
    assert_eq!(summary.total_page_views, 0);
    assert_eq!(summary.unique_visitors, 0);
    assert_eq!(summary.bounce_rate, 0.0);
    assert!(summary.popular_pages.is_empty());

    // The wipe re-persisted an empty image: the next load starts from zero
    // plus its own entry view.
    let next = Tracker::init(&cfg, client_env(), PageContext::new("/about.html")).await;
    assert_eq!(next.summary(None).await.total_page_views, 1);
}

#[tokio::test]
async fn test_identity_accessors_expose_resolved_ids() {
    let tracker = Tracker::init(&config("identity"), client_env(), PageContext::new("/")).await;
    assert!(tracker.visitor_id().starts_with("v_"));
    assert!(tracker.session_id().starts_with("s_"));
}
