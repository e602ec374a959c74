use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::info;

use crate::store::{ArticlePage, ArticleQuery, ArticleStore, FeedbackStore, SubscriptionStore};
use crate::types::{Article, Feedback, KeywordCount, Result, Subscription};

/// PostgreSQL store backend. Holds one long-lived pool; every call borrows
/// a connection from it.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("connected to database and applied migrations");
        Ok(Self { pool })
    }
}

fn article_from_row(row: &PgRow) -> Result<Article> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        link: row.try_get("link")?,
        pub_date: row.try_get("pub_date")?,
        fetched_at: row.try_get("fetched_at")?,
        source: row.try_get("source")?,
        keywords: row.try_get("keywords")?,
        image_url: row.try_get("image_url")?,
    })
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_filters(qb: &mut QueryBuilder<Postgres>, query: &ArticleQuery) {
    let mut prefix = " WHERE ";
    if !query.keywords.is_empty() {
        qb.push(prefix)
            .push("keywords && ")
            .push_bind(query.keywords.clone());
        prefix = " AND ";
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(prefix)
            .push("(title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl ArticleStore for PgStore {
    async fn insert(&self, article: &Article) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles (id, title, description, link, pub_date, fetched_at, source, keywords, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (link) DO NOTHING
            "#,
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.link)
        .bind(article.pub_date)
        .bind(article.fetched_at)
        .bind(&article.source)
        .bind(&article.keywords)
        .bind(&article.image_url)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_link(&self, link: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE link = $1")
            .bind(link)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(article_from_row).transpose()
    }

    async fn query(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM articles");
        push_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM articles");
        push_filters(&mut qb, query);
        qb.push(" ORDER BY pub_date DESC LIMIT ")
            .push_bind(i64::from(query.page_size))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);
        let rows = qb.build().fetch_all(&self.pool).await?;

        let articles = rows
            .iter()
            .map(article_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(ArticlePage {
            articles,
            total: total as u64,
        })
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY fetched_at DESC LIMIT $1")
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(article_from_row).collect()
    }

    async fn created_since(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            "SELECT * FROM articles WHERE fetched_at >= $1 ORDER BY fetched_at DESC LIMIT $2",
        )
        .bind(cutoff)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(article_from_row).collect()
    }

    async fn keyword_counts(&self) -> Result<Vec<KeywordCount>> {
        let rows = sqlx::query(
            r#"
            SELECT keyword, COUNT(*) AS total
            FROM articles, UNNEST(keywords) AS keyword
            GROUP BY keyword
            ORDER BY total DESC, keyword ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let count: i64 = row.try_get("total")?;
                Ok(KeywordCount {
                    keyword: row.try_get("keyword")?,
                    count: count as u64,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn upsert(&self, subscription: &Subscription) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO push_subscriptions (endpoint, p256dh, auth, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (endpoint) DO UPDATE SET p256dh = EXCLUDED.p256dh, auth = EXCLUDED.auth
            "#,
        )
        .bind(&subscription.endpoint)
        .bind(&subscription.p256dh)
        .bind(&subscription.auth)
        .bind(subscription.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, endpoint: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1")
            .bind(endpoint)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Subscription>> {
        let rows = sqlx::query("SELECT * FROM push_subscriptions ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Subscription {
                    endpoint: row.try_get("endpoint")?,
                    p256dh: row.try_get("p256dh")?,
                    auth: row.try_get("auth")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl FeedbackStore for PgStore {
    async fn append(&self, feedback: &Feedback) -> Result<()> {
        sqlx::query(
            "INSERT INTO feedback (id, kind, message, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(feedback.id)
        .bind(feedback.kind.as_str())
        .bind(&feedback.message)
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
