use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::store::{ArticlePage, ArticleQuery, ArticleStore, FeedbackStore, SubscriptionStore};
use crate::types::{Article, Feedback, KeywordCount, Result, Subscription};

/// In-process store backend. Used by the test suite and as the fallback
/// when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    articles: RwLock<Vec<Article>>,
    subscriptions: RwLock<Vec<Subscription>>,
    feedback: RwLock<Vec<Feedback>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_query(article: &Article, query: &ArticleQuery) -> bool {
    if !query.keywords.is_empty()
        && !query.keywords.iter().any(|k| article.keywords.contains(k))
    {
        return false;
    }
    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        let in_title = article.title.to_lowercase().contains(&needle);
        let in_description = article
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(&needle))
            .unwrap_or(false);
        if !in_title && !in_description {
            return false;
        }
    }
    true
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn insert(&self, article: &Article) -> Result<bool> {
        let mut articles = self.articles.write().await;
        if articles.iter().any(|a| a.link == article.link) {
            return Ok(false);
        }
        articles.push(article.clone());
        Ok(true)
    }

    async fn find_by_link(&self, link: &str) -> Result<Option<Article>> {
        let articles = self.articles.read().await;
        Ok(articles.iter().find(|a| a.link == link).cloned())
    }

    async fn query(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let articles = self.articles.read().await;
        let mut matching: Vec<Article> = articles
            .iter()
            .filter(|a| matches_query(a, query))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));

        let total = matching.len() as u64;
        let page: Vec<Article> = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();

        Ok(ArticlePage {
            articles: page,
            total,
        })
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.articles.read().await.len() as u64)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<Article>> {
        let articles = self.articles.read().await;
        let mut all: Vec<Article> = articles.clone();
        all.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn created_since(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<Vec<Article>> {
        let articles = self.articles.read().await;
        let mut recent: Vec<Article> = articles
            .iter()
            .filter(|a| a.fetched_at >= cutoff)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));
        recent.truncate(limit as usize);
        Ok(recent)
    }

    async fn keyword_counts(&self) -> Result<Vec<KeywordCount>> {
        let articles = self.articles.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for article in articles.iter() {
            for keyword in &article.keywords {
                *counts.entry(keyword.clone()).or_insert(0) += 1;
            }
        }
        let mut counts: Vec<KeywordCount> = counts
            .into_iter()
            .map(|(keyword, count)| KeywordCount { keyword, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
        Ok(counts)
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn upsert(&self, subscription: &Subscription) -> Result<()> {
        let mut subscriptions = self.subscriptions.write().await;
        if let Some(existing) = subscriptions
            .iter_mut()
            .find(|s| s.endpoint == subscription.endpoint)
        {
            existing.p256dh = subscription.p256dh.clone();
            existing.auth = subscription.auth.clone();
        } else {
            subscriptions.push(subscription.clone());
        }
        Ok(())
    }

    async fn delete(&self, endpoint: &str) -> Result<bool> {
        let mut subscriptions = self.subscriptions.write().await;
        let before = subscriptions.len();
        subscriptions.retain(|s| s.endpoint != endpoint);
        Ok(subscriptions.len() < before)
    }

    async fn list(&self) -> Result<Vec<Subscription>> {
        Ok(self.subscriptions.read().await.clone())
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn append(&self, feedback: &Feedback) -> Result<()> {
        self.feedback.write().await.push(feedback.clone());
        Ok(())
    }
}
