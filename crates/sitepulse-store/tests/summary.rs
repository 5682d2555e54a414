use chrono::Utc;

use sitepulse_core::event::PageViewInput;
use sitepulse_core::store::EventStore;
use sitepulse_store::SqliteStore;

fn view(path: &str, visitor: &str, session: &str, ts: i64) -> PageViewInput {
    let mut input = PageViewInput::new(path, visitor, session);
    input.timestamp_ms = Some(ts);
    input
}

fn new_session_view(path: &str, visitor: &str, session: &str, ts: i64) -> PageViewInput {
    let mut input = view(path, visitor, session, ts);
    input.is_new_session = true;
    input
}

#[tokio::test]
async fn test_unique_visitors_counts_distinct_ids() {
    let db = SqliteStore::open_in_memory().expect("db");
    let now = Utc::now().timestamp_millis();

    for i in 0..5 {
        db.record_page_view(&view("/", &format!("v_{i}"), &format!("s_{i}"), now + i))
            .await
            .expect("record");
    }

    let summary = db.summarize(30).await.expect("summary");
    assert_eq!(summary.unique_visitors, 5);
    assert_eq!(summary.total_page_views, 5);
    assert_eq!(summary.total_sessions, 5);
}

#[tokio::test]
async fn test_bounce_rate_is_zero_without_new_sessions() {
    let db = SqliteStore::open_in_memory().expect("db");
    let now = Utc::now().timestamp_millis();

    let mut bounced = view("/", "v_1", "s_1", now);
    bounced.time_spent_ms = 5_000;
    bounced.bounced = true;
    db.record_page_view(&bounced).await.expect("record");

    let summary = db.summarize(30).await.expect("summary");
    assert_eq!(summary.new_visitors, 0);
    assert_eq!(summary.bounce_rate, 0.0);
}

#[tokio::test]
async fn test_bounce_rate_splits_new_sessions() {
    let db = SqliteStore::open_in_memory().expect("db");
    let now = Utc::now().timestamp_millis();

    let mut short_stay = new_session_view("/index.html", "v_1", "s_1", now - 60_000);
    short_stay.time_spent_ms = 10_000;
    short_stay.bounced = true;
    db.record_page_view(&short_stay).await.expect("record");

    let mut long_stay = new_session_view("/about.html", "v_2", "s_2", now - 30_000);
    long_stay.time_spent_ms = 45_000;
    db.record_page_view(&long_stay).await.expect("record");

    let summary = db.summarize(30).await.expect("summary");
    assert_eq!(summary.new_visitors, 2);
    assert_eq!(summary.bounce_rate, 50.0);
}

#[tokio::test]
async fn test_bounce_rate_follows_unload_amendment() {
    let db = SqliteStore::open_in_memory().expect("db");
    let now = Utc::now().timestamp_millis();

    let id = db
        .record_page_view(&new_session_view("/", "v_1", "s_1", now))
        .await
        .expect("record");
    db.amend_page_view(id, 10_000).await.expect("amend");

    let summary = db.summarize(30).await.expect("summary");
    assert_eq!(summary.bounce_rate, 100.0);
}

#[tokio::test]
async fn test_popular_pages_never_exceed_ten() {
    let db = SqliteStore::open_in_memory().expect("db");
    let now = Utc::now().timestamp_millis();

    for i in 0..15 {
        db.record_page_view(&view(&format!("/post-{i}.html"), "v_1", "s_1", now + i))
            .await
            .expect("record");
    }
    // An extra hit so one page clearly leads.
    db.record_page_view(&view("/post-3.html", "v_1", "s_1", now + 100))
        .await
        .expect("record");

    let summary = db.summarize(30).await.expect("summary");
    assert_eq!(summary.popular_pages.len(), 10);
    assert_eq!(summary.popular_pages[0].path, "/post-3.html");
    assert_eq!(summary.popular_pages[0].views, 2);
}

#[tokio::test]
async fn test_window_excludes_old_views() {
    let db = SqliteStore::open_in_memory().expect("db");
    let now = Utc::now().timestamp_millis();
    let forty_days_ago = now - 40 * 86_400_000;

    db.record_page_view(&view("/old.html", "v_old", "s_old", forty_days_ago))
        .await
        .expect("record");
    db.record_page_view(&view("/new.html", "v_new", "s_new", now))
        .await
        .expect("record");

    let summary = db.summarize(30).await.expect("summary");
    assert_eq!(summary.total_page_views, 1);
    assert_eq!(summary.popular_pages.len(), 1);
    assert_eq!(summary.popular_pages[0].path, "/new.html");

    let wide = db.summarize(60).await.expect("summary");
    assert_eq!(wide.total_page_views, 2);
}

#[tokio::test]
async fn test_returning_visitors_clamped_at_zero() {
    let db = SqliteStore::open_in_memory().expect("db");
    let now = Utc::now().timestamp_millis();

    db.record_page_view(&new_session_view("/", "v_1", "s_1", now))
        .await
        .expect("record");

    let summary = db.summarize(30).await.expect("summary");
    assert_eq!(summary.total_page_views, 1);
    assert_eq!(summary.new_visitors, 1);
    assert_eq!(summary.returning_visitors, 0);
}

#[tokio::test]
async fn test_clear_yields_all_zero_summary() {
    let db = SqliteStore::open_in_memory().expect("db");
    let now = Utc::now().timestamp_millis();

    db.record_page_view(&new_session_view("/", "v_1", "s_1", now))
        .await
        .expect("record");
    db.clear().await.expect("clear");

    let summary = db.summarize(30).await.expect("summary");
    assert_eq!(summary.unique_visitors, 0);
    assert_eq!(summary.total_page_views, 0);
    assert_eq!(summary.total_sessions, 0);
    assert_eq!(summary.bounce_rate, 0.0);
    assert!(summary.popular_pages.is_empty());

    assert!(db.get_visitor("v_1").await.expect("query").is_none());
}
