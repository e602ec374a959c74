use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::push::{PushError, PushTransport};
use crate::store::{ArticleStore, SubscriptionStore};
use crate::types::{Article, Result};

#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Trailing window an article must have been stored within to qualify.
    pub window: Duration,
    /// Cap on how many article titles one digest carries.
    pub max_articles: u32,
    pub title: String,
    /// Where the notification points the client.
    pub target_url: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(5 * 60),
            max_articles: 5,
            title: "Latest News Update".to_string(),
            target_url: "/".to_string(),
        }
    }
}

/// The JSON document delivered to every subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

/// One digest summarizing the given articles as a bulleted title list.
pub fn build_digest(articles: &[Article], config: &DigestConfig) -> NotificationPayload {
    let bullets = articles
        .iter()
        .map(|article| format!("\u{2022} {}", article.title))
        .collect::<Vec<_>>()
        .join("\n");

    NotificationPayload {
        title: config.title.clone(),
        body: format!(
            "Here are the latest {} articles:\n\n{}",
            articles.len(),
            bullets
        ),
        url: config.target_url.clone(),
        timestamp: Utc::now(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No article qualified; no delivery was attempted.
    NothingToSend,
    Sent {
        /// Subscriptions that accepted the digest.
        notified: usize,
        /// Articles included in the digest.
        articles: usize,
    },
}

/// Scans recently stored articles and pushes a single digest to every
/// registered subscription, pruning endpoints the push service reports
/// permanently gone. Failures are per-subscription; there is no retry and
/// no delivery guarantee.
pub struct NotificationDispatcher {
    articles: Arc<dyn ArticleStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    transport: Arc<dyn PushTransport>,
    config: DigestConfig,
}

impl NotificationDispatcher {
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        transport: Arc<dyn PushTransport>,
        config: DigestConfig,
    ) -> Self {
        Self {
            articles,
            subscriptions,
            transport,
            config,
        }
    }

    pub async fn dispatch(&self) -> Result<DispatchOutcome> {
        let cutoff = Utc::now() - chrono::Duration::seconds(self.config.window.as_secs() as i64);
        let recent = self
            .articles
            .created_since(cutoff, self.config.max_articles)
            .await?;

        if recent.is_empty() {
            debug!("no new articles within the window, nothing to send");
            return Ok(DispatchOutcome::NothingToSend);
        }

        let payload = build_digest(&recent, &self.config);
        let subscriptions = self.subscriptions.list().await?;
        let mut notified = 0;

        for subscription in &subscriptions {
            match self.transport.send(subscription, &payload).await {
                Ok(()) => notified += 1,
                Err(PushError::Gone) => {
                    warn!(endpoint = %subscription.endpoint, "endpoint gone, pruning subscription");
                    self.subscriptions.delete(&subscription.endpoint).await?;
                }
                Err(err) => {
                    warn!(endpoint = %subscription.endpoint, error = %err, "push delivery failed");
                }
            }
        }

        info!(
            notified,
            subscriptions = subscriptions.len(),
            articles = recent.len(),
            "dispatched news digest"
        );

        Ok(DispatchOutcome::Sent {
            notified,
            articles: recent.len(),
        })
    }
}
