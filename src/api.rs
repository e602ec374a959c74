use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use crate::digest::{DispatchOutcome, NotificationDispatcher};
use crate::pipeline::{IngestOutcome, IngestionPipeline};
use crate::store::{ArticleQuery, ArticleStore, FeedbackStore, SubscriptionStore};
use crate::types::{Feedback, FeedbackKind, KeywordCount, NewswatchError, Subscription};

const DEFAULT_PAGE_SIZE: u32 = 24;
const MAX_PAGE_SIZE: u32 = 100;
const RECENT_LIMIT: u32 = 5;

#[derive(Clone)]
pub struct AppState {
    pub articles: Arc<dyn ArticleStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub pipeline: Arc<IngestionPipeline>,
    pub dispatcher: Arc<NotificationDispatcher>,
}

/// Request-level failures. Validation problems surface with their message;
/// everything else is logged and collapsed into a generic 500 so internal
/// detail never reaches the caller.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Internal(NewswatchError),
}

impl From<NewswatchError> for ApiError {
    fn from(err: NewswatchError) -> Self {
        match err {
            NewswatchError::Validation(message) => ApiError::Validation(message),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": message })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/articles", get(list_articles))
        .route("/api/articles/count", get(article_count))
        .route("/api/articles/recent", get(recent_articles))
        .route("/api/keywords", get(keyword_counts))
        .route("/api/feedback", post(submit_feedback))
        .route("/api/push/subscribe", post(subscribe))
        .route("/api/push/unsubscribe", post(unsubscribe))
        .route("/api/push/send", post(send_notifications))
        .route("/api/worker/initialize", post(initialize_worker))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticlesParams {
    page: Option<u32>,
    page_size: Option<u32>,
    /// Comma-separated keyword filter.
    keywords: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArticlesResponse {
    articles: Vec<crate::types::Article>,
    total: u64,
    page: u32,
    page_size: u32,
    total_pages: u64,
}

async fn list_articles(
    State(state): State<AppState>,
    Query(params): Query<ArticlesParams>,
) -> ApiResult<Json<ArticlesResponse>> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let keywords = params
        .keywords
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();
    let search = params.search.filter(|s| !s.trim().is_empty());

    let query = ArticleQuery {
        keywords,
        search,
        page,
        page_size,
    };
    let result = state.articles.query(&query).await?;

    Ok(Json(ArticlesResponse {
        total_pages: result.total.div_ceil(u64::from(page_size)),
        articles: result.articles,
        total: result.total,
        page,
        page_size,
    }))
}

async fn article_count(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let count = state.articles.count().await?;
    Ok(Json(json!({ "count": count })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecentArticle {
    title: String,
    link: String,
    pub_date: DateTime<Utc>,
}

async fn recent_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<RecentArticle>>> {
    let articles = state.articles.recent(RECENT_LIMIT).await?;
    let recent = articles
        .into_iter()
        .map(|a| RecentArticle {
            title: a.title,
            link: a.link,
            pub_date: a.pub_date,
        })
        .collect();
    Ok(Json(recent))
}

#[derive(Debug, Serialize)]
struct KeywordsResponse {
    keywords: Vec<KeywordCount>,
}

async fn keyword_counts(State(state): State<AppState>) -> ApiResult<Json<KeywordsResponse>> {
    let keywords = state.articles.keyword_counts().await?;
    Ok(Json(KeywordsResponse { keywords }))
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let (kind, message) = match (
        request.kind.filter(|k| !k.is_empty()),
        request.message.filter(|m| !m.trim().is_empty()),
    ) {
        (Some(kind), Some(message)) => (kind, message),
        _ => {
            return Err(ApiError::Validation(
                "Type and message are required.".to_string(),
            ))
        }
    };

    let kind = FeedbackKind::parse(&kind)
        .ok_or_else(|| ApiError::Validation(format!("unknown feedback type: {kind}")))?;

    let feedback = Feedback {
        id: Uuid::new_v4(),
        kind,
        message,
        created_at: Utc::now(),
    };
    state.feedback.append(&feedback).await?;

    Ok(Json(json!({
        "message": "Feedback submitted successfully",
        "feedback": feedback,
    })))
}

#[derive(Debug, Deserialize)]
struct SubscriptionKeys {
    p256dh: String,
    auth: String,
}

#[derive(Debug, Deserialize)]
struct SubscribeRequest {
    endpoint: String,
    keys: SubscriptionKeys,
}

async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if request.endpoint.is_empty() || request.keys.p256dh.is_empty() || request.keys.auth.is_empty()
    {
        return Err(ApiError::Validation(
            "endpoint and keys are required".to_string(),
        ));
    }
    if url::Url::parse(&request.endpoint).is_err() {
        return Err(ApiError::Validation(
            "endpoint must be a valid URL".to_string(),
        ));
    }

    let subscription = Subscription {
        endpoint: request.endpoint,
        p256dh: request.keys.p256dh,
        auth: request.keys.auth,
        created_at: Utc::now(),
    };
    state.subscriptions.upsert(&subscription).await?;

    Ok(Json(json!({ "message": "Subscription added successfully" })))
}

#[derive(Debug, Deserialize)]
struct UnsubscribeRequest {
    endpoint: String,
}

async fn unsubscribe(
    State(state): State<AppState>,
    Json(request): Json<UnsubscribeRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if request.endpoint.is_empty() {
        return Err(ApiError::Validation("endpoint is required".to_string()));
    }

    let removed = state.subscriptions.delete(&request.endpoint).await?;
    let message = if removed {
        "Subscription removed successfully"
    } else {
        "Subscription was not registered"
    };
    Ok(Json(json!({ "message": message })))
}

async fn send_notifications(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    match state.dispatcher.dispatch().await? {
        DispatchOutcome::NothingToSend => {
            Ok(Json(json!({ "message": "No new articles to send" })))
        }
        DispatchOutcome::Sent { notified, articles } => Ok(Json(json!({
            "message": format!("Sent notifications to {notified} subscribers"),
            "articlesCount": articles,
        }))),
    }
}

async fn initialize_worker(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    match state.pipeline.run().await? {
        IngestOutcome::Skipped { retry_in } => Ok(Json(json!({
            "success": true,
            "skipped": true,
            "message": "Worker already running, skipping initialization",
            "nextFetchIn": format!("{} seconds", retry_in.as_secs()),
        }))),
        IngestOutcome::Run(stats) => Ok(Json(json!({
            "success": true,
            "newArticlesCount": stats.items_stored,
            "message": format!("Successfully processed {} new articles", stats.items_stored),
            "partialFailure": stats.partially_failed(),
            "stats": stats,
        }))),
    }
}
