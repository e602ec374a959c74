use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ingested, accepted news item. Articles are immutable once stored;
/// `link` is the natural dedup key and unique across the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    /// Publication timestamp reported by the source.
    pub pub_date: DateTime<Utc>,
    /// System clock at ingestion.
    pub fetched_at: DateTime<Utc>,
    pub source: String,
    /// Keywords that matched during classification, source-list order,
    /// duplicates removed.
    pub keywords: Vec<String>,
    pub image_url: Option<String>,
}

/// A registered push-notification endpoint with its transport keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    AddKeyword,
    RemoveKeyword,
    Bug,
    General,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::AddKeyword => "add_keyword",
            FeedbackKind::RemoveKeyword => "remove_keyword",
            FeedbackKind::Bug => "bug",
            FeedbackKind::General => "general",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add_keyword" => Some(FeedbackKind::AddKeyword),
            "remove_keyword" => Some(FeedbackKind::RemoveKeyword),
            "bug" => Some(FeedbackKind::Bug),
            "general" => Some(FeedbackKind::General),
            _ => None,
        }
    }
}

/// Free-form user-submitted record. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Number of stored articles containing a given keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum NewswatchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("push delivery error: {0}")]
    Delivery(String),

    #[error("{0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, NewswatchError>;
