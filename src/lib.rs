pub mod api;
pub mod classifier;
pub mod config;
pub mod digest;
pub mod fetcher;
pub mod memory_store;
pub mod pg_store;
pub mod pipeline;
pub mod push;
pub mod sources;
pub mod store;
pub mod types;

pub use classifier::{
    matched_keywords, AnyKeywordPolicy, Classification, ClassifierPolicy, PolicyKind,
    StrictContextPolicy,
};
pub use digest::{build_digest, DigestConfig, DispatchOutcome, NotificationDispatcher, NotificationPayload};
pub use fetcher::{FetchConfig, Fetcher, RawItem};
pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
pub use pipeline::{IngestGuard, IngestOutcome, IngestStats, IngestionPipeline};
pub use push::{DisabledPushTransport, PushError, PushTransport, WebPushTransport};
pub use sources::{default_sources, FeedSource, NEWS_KEYWORDS};
pub use store::{ArticlePage, ArticleQuery, ArticleStore, FeedbackStore, SubscriptionStore};
pub use types::{
    Article, Feedback, FeedbackKind, KeywordCount, NewswatchError, Result, Subscription,
};
