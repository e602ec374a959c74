#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use newswatch::digest::NotificationPayload;
use newswatch::push::{PushError, PushTransport};
use newswatch::types::{Article, Subscription};

pub fn article(link: &str, title: &str, keywords: &[&str]) -> Article {
    let now = Utc::now();
    article_at(link, title, keywords, now, now)
}

pub fn article_at(
    link: &str,
    title: &str,
    keywords: &[&str],
    pub_date: DateTime<Utc>,
    fetched_at: DateTime<Utc>,
) -> Article {
    Article {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: Some(format!("{title} description")),
        link: link.to_string(),
        pub_date,
        fetched_at,
        source: "Test Source".to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        image_url: None,
    }
}

pub fn subscription(endpoint: &str) -> Subscription {
    Subscription {
        endpoint: endpoint.to_string(),
        p256dh: "p256dh-key".to_string(),
        auth: "auth-secret".to_string(),
        created_at: Utc::now(),
    }
}

/// Minimal RSS 2.0 document over (title, link, description) triples.
pub fn rss_feed(items: &[(&str, &str, &str)]) -> String {
    let items_xml: String = items
        .iter()
        .map(|(title, link, description)| {
            format!(
                "<item><title>{title}</title><link>{link}</link>\
                 <description>{description}</description>\
                 <pubDate>Mon, 21 Oct 2024 07:28:00 GMT</pubDate></item>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>Test Feed</title><link>http://example.com/</link><description>Test</description>
{items_xml}
</channel></rss>"#
    )
}

/// Recording push transport. Endpoints listed in `gone` answer every
/// delivery with the permanently-gone error.
pub struct MockTransport {
    pub sent: Mutex<Vec<(String, NotificationPayload)>>,
    gone: HashSet<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_gone(&[])
    }

    pub fn with_gone(endpoints: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            gone: endpoints.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn sent_endpoints(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl PushTransport for MockTransport {
    async fn send(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError> {
        if self.gone.contains(&subscription.endpoint) {
            return Err(PushError::Gone);
        }
        self.sent
            .lock()
            .unwrap()
            .push((subscription.endpoint.clone(), payload.clone()));
        Ok(())
    }
}
