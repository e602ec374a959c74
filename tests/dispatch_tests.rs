mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use newswatch::digest::{build_digest, DigestConfig, DispatchOutcome, NotificationDispatcher};
use newswatch::store::{ArticleStore, SubscriptionStore};
use newswatch::{MemoryStore, Result};

use common::{article, article_at, subscription, MockTransport};

fn dispatcher_for(
    store: Arc<MemoryStore>,
    transport: Arc<MockTransport>,
    window: Duration,
) -> NotificationDispatcher {
    NotificationDispatcher::new(
        store.clone(),
        store,
        transport,
        DigestConfig {
            window,
            ..DigestConfig::default()
        },
    )
}

#[tokio::test]
async fn dispatch_without_qualifying_articles_is_a_noop() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.upsert(&subscription("https://push.example.com/1")).await?;

    // One article exists, but it was fetched well outside the window.
    let now = Utc::now();
    store
        .insert(&article_at(
            "https://example.com/old",
            "Old news",
            &["loc"],
            now - chrono::Duration::hours(3),
            now - chrono::Duration::hours(2),
        ))
        .await?;

    let transport = Arc::new(MockTransport::new());
    let dispatcher = dispatcher_for(store, transport.clone(), Duration::from_secs(300));

    assert_eq!(dispatcher.dispatch().await?, DispatchOutcome::NothingToSend);
    assert_eq!(transport.sent_count(), 0);

    Ok(())
}

#[tokio::test]
async fn dispatch_delivers_one_digest_to_every_subscription() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.insert(&article("https://example.com/1", "Shelling at the LoC", &["loc"])).await?;
    store.insert(&article("https://example.com/2", "Flag meeting held", &["loc"])).await?;
    store.upsert(&subscription("https://push.example.com/a")).await?;
    store.upsert(&subscription("https://push.example.com/b")).await?;

    let transport = Arc::new(MockTransport::new());
    let dispatcher = dispatcher_for(store, transport.clone(), Duration::from_secs(300));

    let outcome = dispatcher.dispatch().await?;
    assert_eq!(
        outcome,
        DispatchOutcome::Sent {
            notified: 2,
            articles: 2,
        }
    );

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    let (_, payload) = &sent[0];
    assert_eq!(payload.title, "Latest News Update");
    assert!(payload.body.contains("\u{2022} Shelling at the LoC"));
    assert!(payload.body.contains("\u{2022} Flag meeting held"));
    assert_eq!(payload.url, "/");

    Ok(())
}

#[tokio::test]
async fn digest_caps_article_list_at_configured_maximum() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    for i in 0..7 {
        store
            .insert(&article(
                &format!("https://example.com/{i}"),
                &format!("Article {i}"),
                &["loc"],
            ))
            .await?;
    }
    store.upsert(&subscription("https://push.example.com/a")).await?;

    let transport = Arc::new(MockTransport::new());
    let dispatcher = dispatcher_for(store, transport.clone(), Duration::from_secs(300));

    match dispatcher.dispatch().await? {
        DispatchOutcome::Sent { articles, .. } => assert_eq!(articles, 5),
        other => panic!("expected a send, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn gone_endpoint_is_pruned_and_excluded_from_later_dispatches() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.insert(&article("https://example.com/1", "Shelling at the LoC", &["loc"])).await?;
    store.upsert(&subscription("https://push.example.com/dead")).await?;
    store.upsert(&subscription("https://push.example.com/live")).await?;

    let transport = Arc::new(MockTransport::with_gone(&["https://push.example.com/dead"]));
    let dispatcher = dispatcher_for(store.clone(), transport.clone(), Duration::from_secs(300));

    let outcome = dispatcher.dispatch().await?;
    assert_eq!(
        outcome,
        DispatchOutcome::Sent {
            notified: 1,
            articles: 1,
        }
    );

    let remaining = store.list().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].endpoint, "https://push.example.com/live");

    // The pruned endpoint never sees another attempt.
    dispatcher.dispatch().await?;
    assert_eq!(
        transport.sent_endpoints(),
        vec![
            "https://push.example.com/live".to_string(),
            "https://push.example.com/live".to_string(),
        ]
    );

    Ok(())
}

#[test]
fn digest_body_lists_titles_as_bullets() {
    let articles = vec![
        article("https://example.com/1", "First headline", &["loc"]),
        article("https://example.com/2", "Second headline", &["loc"]),
    ];
    let payload = build_digest(&articles, &DigestConfig::default());

    assert_eq!(
        payload.body,
        "Here are the latest 2 articles:\n\n\u{2022} First headline\n\u{2022} Second headline"
    );
}
