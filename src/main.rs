use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use newswatch::api::{create_router, AppState};
use newswatch::config::Config;
use newswatch::digest::{DigestConfig, NotificationDispatcher};
use newswatch::fetcher::{FetchConfig, Fetcher};
use newswatch::memory_store::MemoryStore;
use newswatch::pg_store::PgStore;
use newswatch::pipeline::{IngestGuard, IngestionPipeline};
use newswatch::push::{DisabledPushTransport, PushTransport, WebPushTransport};
use newswatch::sources::default_sources;
use newswatch::store::{ArticleStore, FeedbackStore, SubscriptionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    info!(policy = ?config.policy, "starting newswatch");

    let (articles, subscriptions, feedback): (
        Arc<dyn ArticleStore>,
        Arc<dyn SubscriptionStore>,
        Arc<dyn FeedbackStore>,
    ) = match &config.database_url {
        Some(url) => {
            let store = Arc::new(PgStore::connect(url).await?);
            (store.clone(), store.clone(), store)
        }
        None => {
            warn!("DATABASE_URL not set, articles will not survive a restart");
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store.clone(), store)
        }
    };

    let transport: Arc<dyn PushTransport> = match &config.vapid_private_key_pem {
        Some(path) => {
            let pem = std::fs::read(path)?;
            Arc::new(WebPushTransport::new(pem, &config.vapid_email)?)
        }
        None => {
            warn!("VAPID private key not configured, push delivery is disabled");
            Arc::new(DisabledPushTransport)
        }
    };

    let fetcher = Fetcher::new(FetchConfig::default())?;
    let guard = IngestGuard::new(Duration::from_secs(config.fetch_interval_secs));
    let pipeline = Arc::new(IngestionPipeline::new(
        default_sources(),
        fetcher,
        config.policy.policy(),
        articles.clone(),
        guard,
    ));

    let dispatcher = Arc::new(NotificationDispatcher::new(
        articles.clone(),
        subscriptions.clone(),
        transport,
        DigestConfig {
            window: Duration::from_secs(config.notify_window_secs),
            ..DigestConfig::default()
        },
    ));

    spawn_ingest_ticker(pipeline.clone(), config.fetch_interval_secs);
    spawn_notify_ticker(dispatcher.clone(), config.notify_interval_secs());

    let state = AppState {
        articles,
        subscriptions,
        feedback,
        pipeline,
        dispatcher,
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_ingest_ticker(pipeline: Arc<IngestionPipeline>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(err) = pipeline.run().await {
                error!(error = %err, "scheduled ingestion run failed");
            }
        }
    });
}

fn spawn_notify_ticker(dispatcher: Arc<NotificationDispatcher>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Skip the immediate first tick; there is nothing to announce at
        // startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(err) = dispatcher.dispatch().await {
                error!(error = %err, "scheduled digest dispatch failed");
            }
        }
    });
}
