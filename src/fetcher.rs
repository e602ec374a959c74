use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, MediaObject};
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};

use crate::types::{NewswatchError, Result};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept: String,
    pub timeout: Duration,
    /// Retries after the first attempt fails; the failure only propagates
    /// once these are exhausted.
    pub max_retries: u32,
    /// Fixed delay between attempts. Injectable so tests run without
    /// wall-clock waits.
    pub retry_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            accept: "application/rss+xml, application/xml, application/atom+xml, \
                     text/xml;q=0.9, */*;q=0.8"
                .to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// One item as parsed out of a feed, before classification. Optional fields
/// stay optional here; the pipeline substitutes defaults at persist time.
#[derive(Debug, Clone)]
pub struct RawItem {
    pub title: String,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

impl RawItem {
    /// Title plus summary-or-content, the text relevance is judged on.
    pub fn combined_text(&self) -> String {
        let body = self
            .summary
            .as_deref()
            .or(self.content.as_deref())
            .unwrap_or("");
        format!("{} {}", self.title, body)
    }

    /// Stored description: summary, falling back to full content.
    pub fn description(&self) -> Option<String> {
        self.summary.clone().or_else(|| self.content.clone())
    }
}

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch and parse one feed URL, retrying failed attempts with a fixed
    /// delay. A failure after the last retry propagates to the caller.
    pub async fn fetch(&self, url: &str) -> Result<Vec<RawItem>> {
        let mut attempt = 0;
        loop {
            match self.try_fetch(url).await {
                Ok(items) => {
                    debug!(url, items = items.len(), "fetched feed");
                    return Ok(items);
                }
                Err(err) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(url, attempt, error = %err, "feed fetch failed, retrying");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<Vec<RawItem>> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, self.config.accept.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewswatchError::General(format!(
                "HTTP {} fetching {}",
                status, url
            )));
        }

        let body = response.bytes().await?;
        let feed = feed_rs::parser::parse(&body[..])
            .map_err(|e| NewswatchError::Parse(format!("failed to parse feed {}: {}", url, e)))?;

        Ok(feed.entries.into_iter().map(raw_item_from_entry).collect())
    }
}

fn raw_item_from_entry(entry: Entry) -> RawItem {
    let title = entry.title.map(|t| t.content).unwrap_or_default();
    let link = entry.links.first().map(|l| l.href.clone());
    let summary = entry.summary.map(|s| s.content);
    let content = entry.content.and_then(|c| c.body);
    let published_at = entry.published.or(entry.updated);
    let image_url = extract_image_url(&entry.media, content.as_deref(), summary.as_deref());

    RawItem {
        title,
        link,
        summary,
        content,
        published_at,
        image_url,
    }
}

/// Fallback order: media content (covers RSS enclosures and media:content)
/// -> media thumbnail -> first `<img src=...>` in content, then summary.
fn extract_image_url(media: &[MediaObject], content: Option<&str>, summary: Option<&str>) -> Option<String> {
    if let Some(url) = media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref().map(|u| u.to_string()))
    {
        return Some(url);
    }

    if let Some(url) = media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .next()
    {
        return Some(url);
    }

    content
        .and_then(first_img_src)
        .or_else(|| summary.and_then(first_img_src))
}

fn first_img_src(html: &str) -> Option<String> {
    static IMG_SRC: OnceLock<Regex> = OnceLock::new();
    let re = IMG_SRC
        .get_or_init(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"'>]+)["']"#).expect("img regex"));
    re.captures(html).map(|caps| caps[1].to_string())
}
