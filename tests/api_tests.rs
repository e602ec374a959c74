mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration as ChronoDuration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use newswatch::api::{create_router, AppState};
use newswatch::classifier::PolicyKind;
use newswatch::digest::{DigestConfig, NotificationDispatcher};
use newswatch::fetcher::{FetchConfig, Fetcher};
use newswatch::pipeline::{IngestGuard, IngestionPipeline};
use newswatch::store::{ArticleStore, SubscriptionStore};
use newswatch::MemoryStore;

use common::{article_at, MockTransport};

fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Arc::new(IngestionPipeline::new(
        Vec::new(),
        Fetcher::new(FetchConfig::default()).expect("fetcher"),
        PolicyKind::Any.policy(),
        store.clone(),
        IngestGuard::new(Duration::from_secs(300)),
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        store.clone(),
        store.clone(),
        Arc::new(MockTransport::new()),
        DigestConfig::default(),
    ));

    let state = AppState {
        articles: store.clone(),
        subscriptions: store.clone(),
        feedback: store.clone(),
        pipeline,
        dispatcher,
    };
    (create_router(state), store)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn seed_articles(store: &MemoryStore, count: usize) {
    let now = Utc::now();
    for i in 0..count {
        store
            .insert(&article_at(
                &format!("https://example.com/{i}"),
                &format!("Article {i}"),
                &["loc"],
                now - ChronoDuration::minutes(i as i64),
                now - ChronoDuration::minutes(i as i64),
            ))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn articles_endpoint_paginates_with_camel_case_shape() {
    let (app, store) = test_app();
    seed_articles(&store, 5).await;

    let (status, body) = get_json(&app, "/api/articles?page=2&pageSize=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pageSize"], 2);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["articles"].as_array().unwrap().len(), 2);

    let first = &body["articles"][0];
    assert!(first["pubDate"].is_string());
    assert!(first["fetchedAt"].is_string());
    assert_eq!(first["title"], "Article 2");

    // Beyond the last page: empty page, total still reported.
    let (_, beyond) = get_json(&app, "/api/articles?page=9&pageSize=2").await;
    assert_eq!(beyond["total"], 5);
    assert!(beyond["articles"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn articles_endpoint_applies_keyword_and_search_filters() {
    let (app, store) = test_app();
    let now = Utc::now();
    store
        .insert(&article_at("https://example.com/a", "Shelling update", &["shelling"], now, now))
        .await
        .unwrap();
    store
        .insert(&article_at("https://example.com/b", "Dialogue resumes", &["dialogue"], now, now))
        .await
        .unwrap();

    let (_, by_keyword) = get_json(&app, "/api/articles?keywords=shelling,unused").await;
    assert_eq!(by_keyword["total"], 1);
    assert_eq!(by_keyword["articles"][0]["link"], "https://example.com/a");

    let (_, by_search) = get_json(&app, "/api/articles?search=dialogue").await;
    assert_eq!(by_search["total"], 1);
    assert_eq!(by_search["articles"][0]["link"], "https://example.com/b");
}

#[tokio::test]
async fn count_and_recent_endpoints() {
    let (app, store) = test_app();
    seed_articles(&store, 7).await;

    let (status, count) = get_json(&app, "/api/articles/count").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["count"], 7);

    let (status, recent) = get_json(&app, "/api/articles/recent").await;
    assert_eq!(status, StatusCode::OK);
    let recent = recent.as_array().unwrap().clone();
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0]["title"], "Article 0");
    assert!(recent[0]["pubDate"].is_string());
    assert!(recent[0].get("description").is_none());
}

#[tokio::test]
async fn keywords_endpoint_returns_sorted_counts() {
    let (app, store) = test_app();
    let now = Utc::now();
    for (i, keywords) in [vec!["loc"], vec!["loc", "border"], vec!["border"]]
        .iter()
        .enumerate()
    {
        store
            .insert(&article_at(
                &format!("https://example.com/{i}"),
                &format!("Article {i}"),
                keywords,
                now,
                now,
            ))
            .await
            .unwrap();
    }

    let (status, body) = get_json(&app, "/api/keywords").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["keywords"],
        json!([
            { "keyword": "border", "count": 2 },
            { "keyword": "loc", "count": 2 },
        ])
    );
}

#[tokio::test]
async fn feedback_requires_type_and_message() {
    let (app, _) = test_app();

    let (status, body) = post_json(&app, "/api/feedback", json!({ "type": "bug" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Type and message are required.");

    let (status, _) =
        post_json(&app, "/api/feedback", json!({ "type": "mystery", "message": "hi" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &app,
        "/api/feedback",
        json!({ "type": "add_keyword", "message": "please track skirmish" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Feedback submitted successfully");
    assert_eq!(body["feedback"]["type"], "add_keyword");
}

#[tokio::test]
async fn subscribe_and_unsubscribe_round_trip() {
    let (app, store) = test_app();

    let (status, _) = post_json(
        &app,
        "/api/push/subscribe",
        json!({
            "endpoint": "https://push.example.com/1",
            "keys": { "p256dh": "key", "auth": "secret" },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.list().await.unwrap().len(), 1);

    let (status, _) = post_json(
        &app,
        "/api/push/unsubscribe",
        json!({ "endpoint": "https://push.example.com/1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn worker_initialize_is_guarded_against_rapid_reruns() {
    let (app, _) = test_app();

    let (status, first) = post_json(&app, "/api/worker/initialize", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert!(first.get("skipped").is_none());
    assert_eq!(first["stats"]["sourcesConfigured"], 0);

    let (status, second) = post_json(&app, "/api/worker/initialize", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["skipped"], true);
    assert!(second["nextFetchIn"].as_str().unwrap().ends_with("seconds"));
}

#[tokio::test]
async fn push_send_reports_nothing_to_send() {
    let (app, _) = test_app();

    let (status, body) = post_json(&app, "/api/push/send", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No new articles to send");
}
