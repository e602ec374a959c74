use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::classifier::{Classification, ClassifierPolicy};
use crate::fetcher::Fetcher;
use crate::sources::FeedSource;
use crate::store::ArticleStore;
use crate::types::{Article, Result};

/// Re-entrancy guard for ingestion runs. Holds the start time of the last
/// run; a new run is refused while less than the minimum interval has
/// elapsed. The slot is claimed *before* any fetch I/O begins so a slow run
/// cannot be re-triggered by an overlapping timer tick. Process-local only:
/// this is not a distributed lock.
pub struct IngestGuard {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl IngestGuard {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    /// Claim the run slot, or report how long until the next run is allowed.
    pub fn try_start(&self) -> std::result::Result<(), Duration> {
        let mut last_start = self.last_start.lock().expect("ingest guard poisoned");
        if let Some(last) = *last_start {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                return Err(self.min_interval - elapsed);
            }
        }
        *last_start = Some(Instant::now());
        Ok(())
    }

    /// Forget the last run. Lets tests re-run without waiting out the
    /// interval.
    pub fn reset(&self) {
        *self.last_start.lock().expect("ingest guard poisoned") = None;
    }
}

/// Aggregate statistics for one ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    pub sources_configured: usize,
    pub sources_processed: usize,
    pub items_seen: usize,
    pub items_relevant: usize,
    pub items_stored: usize,
    pub errors: usize,
    pub duration_ms: u64,
}

impl IngestStats {
    /// A run completed but some sources failed.
    pub fn partially_failed(&self) -> bool {
        self.errors > 0
    }
}

/// Outcome of asking the pipeline to run.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// The minimum-interval guard refused the run. Not an error.
    Skipped { retry_in: Duration },
    /// The run went through every source; `stats.errors` counts the ones
    /// that failed.
    Run(IngestStats),
}

/// Orchestrates Source Registry x Feed Fetcher x Relevance Classifier x
/// store dedup/persist. Sources are processed sequentially; per-source
/// failures are counted and logged without stopping the run.
pub struct IngestionPipeline {
    sources: Vec<FeedSource>,
    fetcher: Fetcher,
    classifier: Arc<dyn ClassifierPolicy>,
    store: Arc<dyn ArticleStore>,
    guard: IngestGuard,
}

impl IngestionPipeline {
    pub fn new(
        sources: Vec<FeedSource>,
        fetcher: Fetcher,
        classifier: Arc<dyn ClassifierPolicy>,
        store: Arc<dyn ArticleStore>,
        guard: IngestGuard,
    ) -> Self {
        Self {
            sources,
            fetcher,
            classifier,
            store,
            guard,
        }
    }

    pub async fn run(&self) -> Result<IngestOutcome> {
        if let Err(retry_in) = self.guard.try_start() {
            info!(
                retry_in_secs = retry_in.as_secs(),
                "skipping ingestion run, too soon since last start"
            );
            return Ok(IngestOutcome::Skipped { retry_in });
        }

        let started = Instant::now();
        let mut stats = IngestStats {
            sources_configured: self.sources.len(),
            ..Default::default()
        };

        info!(
            sources = self.sources.len(),
            policy = self.classifier.name(),
            "starting ingestion run"
        );

        for source in &self.sources {
            match self.ingest_source(source, &mut stats).await {
                Ok(()) => stats.sources_processed += 1,
                Err(err) => {
                    stats.errors += 1;
                    error!(source = %source.name, url = %source.url, error = %err, "source ingestion failed");
                }
            }
        }

        stats.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            processed = stats.sources_processed,
            seen = stats.items_seen,
            relevant = stats.items_relevant,
            stored = stats.items_stored,
            errors = stats.errors,
            duration_ms = stats.duration_ms,
            "ingestion run finished"
        );

        Ok(IngestOutcome::Run(stats))
    }

    async fn ingest_source(&self, source: &FeedSource, stats: &mut IngestStats) -> Result<()> {
        let items = self.fetcher.fetch(&source.url).await?;
        stats.items_seen += items.len();

        for item in items {
            let text = item.combined_text();
            let matched = match self.classifier.classify(&text, &source.keywords) {
                Classification::Relevant { matched } => matched,
                Classification::NotRelevant => continue,
            };
            stats.items_relevant += 1;

            let Some(link) = item.link.clone() else {
                debug!(source = %source.name, title = %item.title, "relevant item has no link, skipping");
                continue;
            };
            if self.store.find_by_link(&link).await?.is_some() {
                // Duplicate link: already stored, silently ignored.
                continue;
            }

            let article = Article {
                id: Uuid::new_v4(),
                title: item.title.clone(),
                description: item.description(),
                link,
                pub_date: item.published_at.unwrap_or_else(Utc::now),
                fetched_at: Utc::now(),
                source: source.name.clone(),
                keywords: matched,
                image_url: item.image_url.clone(),
            };

            if self.store.insert(&article).await? {
                stats.items_stored += 1;
                debug!(source = %source.name, title = %article.title, "stored new article");
            }
        }

        Ok(())
    }
}
