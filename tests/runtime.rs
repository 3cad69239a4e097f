use feed_scanner::{Affordance, SnapshotPage};
use reply_popup::{MemoryClipboard, RecordingLauncher, RecordingSurface, ReplyBody};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};
use xbird::{ContentScript, PageEvent};
use xbird_core::{AppConfig, MemoryCredentialStore, PostId};

type Script = ContentScript<
    SnapshotPage,
    RecordingSurface,
    MemoryClipboard,
    RecordingLauncher,
    Arc<MemoryCredentialStore>,
>;

const FEED: &str = r#"<main>
  <article data-testid="tweet">
    <div lang="en">Tabs are better than spaces</div>
    <a href="/dev/status/100">1h</a>
    <div role="group" aria-label="3 replies, 12 reposts, 450 likes, 20 bookmarks, 75000 views"></div>
  </article>
  <article data-testid="tweet">
    <div lang="en">Hello world</div>
    <a href="/dev/status/200">2h</a>
    <div role="group" aria-label="1 reply, 0 reposts, 2 likes, 0 bookmarks, 900 views"></div>
  </article>
  <article data-testid="tweet">
    <div lang="en">Nobody sees this</div>
    <a href="/dev/status/300">3h</a>
    <div role="group" aria-label="0 replies, 0 reposts, 0 likes, 0 bookmarks, 12 views"></div>
  </article>
</main>"#;

fn config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.client.endpoint = format!("{}/models/test", server.uri());
    config.client.retry_base_ms = 1;
    config.scan.settle_ms = 50;
    config.scan.debounce_ms = 20;
    config
}

fn script(config: &AppConfig, key: Option<&str>) -> Script {
    ContentScript::new(
        config,
        SnapshotPage::parse("https://x.com/home", FEED),
        RecordingSurface::default(),
        MemoryClipboard::default(),
        RecordingLauncher::default(),
        Arc::new(MemoryCredentialStore::new(key.map(str::to_string))),
    )
    .unwrap()
}

fn attached(script: &Script, id: &str) -> Affordance {
    script.page().affordance(&PostId::new(id)).cloned().unwrap()
}

#[tokio::test]
async fn test_activation_renders_generated_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": "spaces gang rise up" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut script = script(&config(&server), Some("hf_test_key"));
    let report = script.start().unwrap();
    assert_eq!(report.attached, vec![PostId::new("100"), PostId::new("200")]);

    let (events, receiver) = mpsc::channel(8);
    events.send(PageEvent::Activate(attached(&script, "100"))).await.unwrap();
    events.send(PageEvent::Copy).await.unwrap();
    drop(events);

    let summary = script.run(receiver).await;

    assert_eq!(summary.generations_completed, 1);
    assert_eq!(
        script.controller().view().body,
        ReplyBody::Reply("spaces gang rise up".to_string())
    );
    assert_eq!(script.controller().view().score.as_ref().unwrap().score, 50);
}

#[tokio::test]
async fn test_rapid_reactivation_renders_only_latest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "generated_text": "reply" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut script = script(&config(&server), Some("hf_test_key"));
    script.start();

    let (events, receiver) = mpsc::channel(8);
    events.send(PageEvent::Activate(attached(&script, "100"))).await.unwrap();
    events.send(PageEvent::Activate(attached(&script, "200"))).await.unwrap();
    drop(events);

    let summary = script.run(receiver).await;

    assert_eq!(summary.generations_completed, 1);
    assert_eq!(summary.generations_discarded, 1);
    let active = script.controller().active().unwrap();
    assert_eq!(active.post.id, PostId::new("200"));
}

#[tokio::test]
async fn test_missing_key_shows_configuration_hint() {
    let server = MockServer::start().await;
    let mut script = script(&config(&server), None);
    script.start();

    let (events, receiver) = mpsc::channel(8);
    events.send(PageEvent::Activate(attached(&script, "100"))).await.unwrap();
    drop(events);
    script.run(receiver).await;

    assert_eq!(
        script.controller().view().body.text(),
        "⚠️ No API key found - Click the extension icon to configure your Hugging Face API key"
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_navigation_rescans_after_settling() {
    let server = MockServer::start().await;
    let mut script = script(&config(&server), None);

    let (events, receiver) = mpsc::channel(8);
    events
        .send(PageEvent::Mutation {
            location: "https://x.com/dev/status/100".to_string(),
        })
        .await
        .unwrap();
    events.send(PageEvent::Scroll).await.unwrap();
    drop(events);

    let summary = script.run(receiver).await;

    // Initial pass plus exactly one pass after the settle window.
    assert_eq!(summary.passes, 2);
    assert_eq!(script.scanner().arm_count(), 2);
    assert!(script.scanner().is_scroll_armed());
    assert_eq!(script.scanner().processed().len(), 2);
}

#[tokio::test]
async fn test_disabled_extension_does_not_scan() {
    let server = MockServer::start().await;
    let mut script = script(&config(&server), None);
    script.set_enabled(false);

    let (events, receiver) = mpsc::channel(8);
    events.send(PageEvent::Scroll).await.unwrap();
    drop(events);
    let summary = script.run(receiver).await;

    assert_eq!(summary.passes, 0);
    assert!(script.page().affordances().is_empty());
}

#[tokio::test]
async fn test_unload_stops_the_loop() {
    let server = MockServer::start().await;
    let mut script = script(&config(&server), None);

    let (events, receiver) = mpsc::channel(8);
    events.send(PageEvent::Unload).await.unwrap();
    let summary = script.run(receiver).await;

    assert_eq!(summary.passes, 1);
    assert!(script.scanner().processed().is_empty());
    assert!(!script.scanner().is_scroll_armed());
    drop(events);
}
