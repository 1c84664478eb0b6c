use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use bbsarchive::browser::{App, MemoryPreferenceStore, ThemeManager, View};
use bbsarchive::config::Config;
use bbsarchive::source::{DataSource, MemoryTransport};
use serde_json::json;

/// 45 threads on `tuna`; thread N was last updated at minute N, so newest is 45
fn seeded_transport(config: &Config) -> MemoryTransport {
    let index: Vec<_> = (1..=45)
        .map(|i| json!({
            "threadId": i,
            "title": if i % 10 == 0 { format!("Foobar {}", i) } else { format!("Thread {}", i) },
            "username": "anon",
            "size": 2,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": format!("2024-01-02T00:{:02}:00Z", i),
        }))
        .collect();
    let thread = json!({
        "threadId": 42,
        "title": "Answer thread",
        "username": "deep",
        "size": 3,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-02T00:42:00Z",
        "responses": [
            { "sequence": 1, "username": "deep", "userId": "abc", "createdAt": "2024-01-01T00:00:00Z", "content": "first" },
            { "sequence": 2, "username": "<b>x</b>", "userId": "def", "createdAt": "2024-01-01T00:01:00Z", "content": "&gt;&gt;1 agreed" },
            { "sequence": 3, "username": "z", "createdAt": "2024-01-01T00:02:00Z", "content": "see https://example.com",
              "attachment": "cat.png", "youtube": "https://youtu.be/dQw4w9WgXcQ" }
        ]
    });

    let mut transport = MemoryTransport::new();
    transport.insert(config.index_url("tuna"), serde_json::to_string(&index).unwrap());
    transport.insert(config.thread_url("tuna", "42"), thread.to_string());
    transport
}

fn app_at(hash: &str) -> (App, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
    let config = Config::default();
    let transport = seeded_transport(&config);
    let requests = transport.request_counter();
    let source = DataSource::new(config.clone(), Box::new(transport));
    let theme = ThemeManager::init(Box::new(MemoryPreferenceStore::new()), false);
    (App::new(config, source, theme).with_location(hash), requests)
}

#[tokio::test]
async fn empty_location_lands_on_default_board() {
    let (mut app, _) = app_at("");
    app.start().await;
    assert_eq!(app.navigator().hash(), "#/tuna");
    let list = app.ui().list_view().expect("thread list");
    assert_eq!(list.board_id, "tuna");
    assert_eq!(list.page, 1);
    assert_eq!(list.total_pages, 3);
    assert_eq!(app.ui().title.as_deref(), Some("Tuna"));
    assert!(list.results_html.contains(r##"href="#/tuna/45""##));
}

#[tokio::test]
async fn second_page_shows_ranks_twenty_one_to_forty() {
    let (mut app, _) = app_at("#/tuna?page=2");
    app.start().await;
    let list = app.ui().list_view().expect("thread list");
    assert_eq!(list.page, 2);
    for id in 6..=25 {
        assert!(list.results_html.contains(&format!(r##"href="#/tuna/{}""##, id)), "missing {}", id);
    }
    assert!(!list.results_html.contains(r##"href="#/tuna/26""##));
    assert!(!list.results_html.contains(r##"href="#/tuna/5""##));
    assert!(list.results_html.contains(r#"<span class="pagination-current">2</span>"#));
}

#[tokio::test]
async fn page_past_the_end_is_empty_not_an_error() {
    let (mut app, _) = app_at("#/tuna?page=9");
    app.start().await;
    let list = app.ui().list_view().expect("thread list");
    assert!(list.results_html.contains("No threads found."));
}

#[tokio::test]
async fn board_query_parameter_filters_and_prefills() {
    let (mut app, _) = app_at("#/tuna?q=foobar");
    app.start().await;
    let list = app.ui().list_view().expect("thread list");
    assert_eq!(list.query, "foobar");
    assert_eq!(list.total_pages, 1);
    assert_eq!(list.results_html.matches(r#"class="thread-card""#).count(), 4);
    assert!(app.render_main().contains(r#"value="foobar""#));
}

#[tokio::test]
async fn unknown_location_redirects_home() {
    let (mut app, _) = app_at("#/a/b/c/d");
    app.start().await;
    assert_eq!(app.navigator().hash(), "#/tuna");
    assert!(app.ui().list_view().is_some());
}

#[tokio::test]
async fn thread_detail_links_highlights_and_embeds() {
    let (mut app, _) = app_at("#/tuna/42/2-3");
    app.start().await;
    let View::ThreadDetail(html) = &app.ui().view else {
        panic!("expected detail, got {:?}", app.ui().view);
    };
    assert_eq!(app.ui().title.as_deref(), Some("Answer thread"));
    assert_eq!(app.ui().highlight_seqs.iter().copied().collect::<Vec<_>>(), [2, 3]);
    assert_eq!(app.ui().scroll_target.as_deref(), Some("response-2"));
    assert!(html.contains(r#"<article class="response-card highlighted" id="response-2">"#));
    assert!(html.contains(r#"<article class="response-card" id="response-1">"#));
    assert!(html.contains(r##"<a href="#/tuna/42/1" class="anchor-link">&gt;&gt;1</a> agreed"##));
    assert!(html.contains(r#"target="_blank" rel="noopener noreferrer">https://example.com</a>"#));
    assert!(html.contains("/tuna/attachment/cat.png"));
    assert!(html.contains("https://www.youtube.com/embed/dQw4w9WgXcQ"));
    assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
}

#[tokio::test]
async fn huge_range_highlights_only_existing_responses() {
    let (mut app, _) = app_at("#/tuna/42/1-4294967295");
    app.start().await;
    assert!(matches!(app.ui().view, View::ThreadDetail(_)));
    assert_eq!(app.ui().highlight_seqs.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
    assert_eq!(app.ui().scroll_target.as_deref(), Some("response-1"));
}

#[tokio::test]
async fn reversed_range_highlights_nothing() {
    let (mut app, _) = app_at("#/tuna/42/3-1");
    app.start().await;
    assert!(app.ui().highlight_seqs.is_empty());
    assert_eq!(app.ui().scroll_target, None);
}

#[tokio::test]
async fn missing_sequence_highlights_nothing_visible() {
    let (mut app, _) = app_at("#/tuna/42/99");
    app.start().await;
    assert!(matches!(app.ui().view, View::ThreadDetail(_)));
    assert_eq!(app.ui().scroll_target, None);
}

#[tokio::test]
async fn fetch_failures_become_error_views() {
    let (mut app, _) = app_at("#/tuna/7");
    app.start().await;
    assert_eq!(app.ui().view, View::Error("Failed to load thread: HTTP 404: Not Found".into()));

    app.navigate("/nowhere");
    app.run_pending().await;
    assert_eq!(app.ui().view, View::Error("Failed to load threads: HTTP 404: Not Found".into()));
    assert!(app.render().contains(r#"<div class="error">Failed to load threads: HTTP 404: Not Found</div>"#));
}

#[tokio::test]
async fn revisits_are_served_from_cache() {
    let (mut app, requests) = app_at("#/tuna");
    app.start().await;
    app.navigate("/tuna/42");
    app.run_pending().await;
    app.navigate("/tuna?page=2");
    app.run_pending().await;
    app.navigate("/tuna/42/1");
    app.run_pending().await;
    assert_eq!(requests.load(Ordering::Relaxed), 2);
    assert_eq!(app.source().cached_len(), 2);
}

#[tokio::test]
async fn live_search_waits_for_the_pause_then_rewrites_location() {
    let (mut app, requests) = app_at("#/tuna?page=2");
    app.start().await;
    let t0 = Instant::now();

    app.search_input("foo", t0);
    app.search_input("foobar", t0 + Duration::from_millis(100));
    assert!(!app.tick(t0 + Duration::from_millis(200)));
    assert_eq!(app.ui().list_view().unwrap().page, 2);

    assert!(app.tick(t0 + Duration::from_millis(260)));
    let list = app.ui().list_view().unwrap();
    assert_eq!(list.page, 1);
    assert_eq!(list.query, "foobar");
    assert_eq!(list.results_html.matches(r#"class="thread-card""#).count(), 4);
    assert_eq!(app.navigator().hash(), "#/tuna?q=foobar");
    assert!(!app.navigator().has_pending());
    assert_eq!(requests.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn submitting_search_skips_the_delay_and_empty_query_restores_all() {
    let (mut app, _) = app_at("#/tuna");
    app.start().await;
    app.search_input("foo", Instant::now());
    assert!(app.submit_search("  foobar "));
    assert_eq!(app.ui().list_view().unwrap().query, "foobar");
    assert!(!app.tick(Instant::now() + Duration::from_secs(1)));

    assert!(app.submit_search(""));
    assert_eq!(app.ui().list_view().unwrap().total_pages, 3);
    assert_eq!(app.navigator().hash(), "#/tuna");
}

#[tokio::test]
async fn navigation_closes_the_sidebar_and_back_returns() {
    let (mut app, _) = app_at("#/tuna");
    app.start().await;
    app.toggle_sidebar();
    assert!(app.ui().sidebar_open);
    assert!(app.render().contains(r#"class="sidebar open""#));

    app.navigate("/tuna/42");
    app.run_pending().await;
    assert!(!app.ui().sidebar_open);

    assert!(app.go_back());
    app.run_pending().await;
    assert_eq!(app.navigator().hash(), "#/tuna");
    assert!(app.ui().list_view().is_some());
}

#[tokio::test]
async fn theme_choice_shows_in_page() {
    let (mut app, _) = app_at("#/tuna");
    app.start().await;
    assert!(app.render().contains(r#"data-theme="light""#));
    app.system_theme_changed(true);
    assert!(app.render().contains(r#"data-theme="dark""#));
    app.toggle_theme().unwrap();
    app.system_theme_changed(true);
    assert!(app.render().contains(r#"data-theme="light""#));
}
