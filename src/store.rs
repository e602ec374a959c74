use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Article, Feedback, KeywordCount, Result, Subscription};

/// Composable article filter: keyword "has any of" plus case-insensitive
/// substring search over title/description, paginated.
#[derive(Debug, Clone)]
pub struct ArticleQuery {
    pub keywords: Vec<String>,
    pub search: Option<String>,
    /// 1-based page number; values below 1 are treated as 1.
    pub page: u32,
    pub page_size: u32,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            search: None,
            page: 1,
            page_size: 24,
        }
    }
}

impl ArticleQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size)
    }
}

/// One page of query results plus the total count of matching articles.
#[derive(Debug, Clone, Serialize)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub total: u64,
}

/// Persisted collection of accepted articles. Implementations must keep
/// `link` unique; `insert` reports whether a row was actually written so
/// callers can count conflict skips.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Returns false when an article with the same link already exists.
    async fn insert(&self, article: &Article) -> Result<bool>;

    async fn find_by_link(&self, link: &str) -> Result<Option<Article>>;

    /// Filtered, newest-publication-first, paginated query.
    async fn query(&self, query: &ArticleQuery) -> Result<ArticlePage>;

    async fn count(&self) -> Result<u64>;

    /// Most recent articles by creation (fetch) time.
    async fn recent(&self, limit: u32) -> Result<Vec<Article>>;

    /// Articles created at or after `cutoff`, newest first.
    async fn created_since(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<Vec<Article>>;

    /// Count of articles containing each keyword, descending by count,
    /// alphabetical ascending on ties.
    async fn keyword_counts(&self) -> Result<Vec<KeywordCount>>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert or refresh a subscription keyed by endpoint.
    async fn upsert(&self, subscription: &Subscription) -> Result<()>;

    /// Returns false when no subscription had the endpoint.
    async fn delete(&self, endpoint: &str) -> Result<bool>;

    async fn list(&self) -> Result<Vec<Subscription>>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn append(&self, feedback: &Feedback) -> Result<()>;
}
