use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::models::{ClickEvent, ShortLink};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("slug already taken")]
    UniquenessViolation,
    #[error("not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::UniquenessViolation
            }
            sqlx::Error::RowNotFound => StoreError::NotFound,
            _ => StoreError::Database(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for links and their clicks.
///
/// Slug uniqueness is enforced by the backing store on `insert`; callers must
/// not rely on `exists_by_slug` for correctness.
#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn exists_by_slug(&self, slug: &str) -> StoreResult<bool>;

    /// Fails with [`StoreError::UniquenessViolation`] when the slug is taken.
    async fn insert(&self, link: ShortLink) -> StoreResult<ShortLink>;

    /// Fails with [`StoreError::NotFound`] for unknown slugs.
    async fn find_by_slug(&self, slug: &str) -> StoreResult<ShortLink>;

    /// Links owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<ShortLink>>;

    /// Clicks whose `short_link_id` is in `ids`, newest first.
    ///
    /// The SQLite backend binds one variable per id, so a set larger than
    /// SQLite's variable limit (32766) fails with a database error.
    async fn list_clicks_for_links(&self, ids: &HashSet<Uuid>) -> StoreResult<Vec<ClickEvent>>;

    async fn record_click(&self, click: ClickEvent) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct SqliteLinkStore {
    db: SqlitePool,
}

impl SqliteLinkStore {
    /// Opens the pool, creating the database file if needed, and applies migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options: SqliteConnectOptions = database_url
            .parse::<SqliteConnectOptions>()?
            .create_if_missing(true)
            .foreign_keys(true);

        let db = SqlitePoolOptions::new()
            .max_connections(max_connections)
            // in-memory databases live only as long as their connection
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&db).await?;

        Ok(Self { db })
    }
}

#[async_trait]
impl LinkStore for SqliteLinkStore {
    async fn exists_by_slug(&self, slug: &str) -> StoreResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM short_links WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.is_some())
    }

    async fn insert(&self, link: ShortLink) -> StoreResult<ShortLink> {
        sqlx::query(
            r#"
            INSERT INTO short_links (id, slug, target_url, owner_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(link.id)
        .bind(&link.slug)
        .bind(&link.target_url)
        .bind(&link.owner_id)
        .bind(link.created_at)
        .execute(&self.db)
        .await?;

        Ok(link)
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<ShortLink> {
        let link = sqlx::query_as::<_, ShortLink>("SELECT * FROM short_links WHERE slug = ?")
            .bind(slug)
            .fetch_one(&self.db)
            .await?;

        Ok(link)
    }

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<ShortLink>> {
        let links = sqlx::query_as::<_, ShortLink>(
            "SELECT * FROM short_links WHERE owner_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(links)
    }

    async fn list_clicks_for_links(&self, ids: &HashSet<Uuid>) -> StoreResult<Vec<ClickEvent>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM link_clicks WHERE short_link_id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY clicked_at DESC, rowid DESC");

        let clicks = query
            .build_query_as::<ClickEvent>()
            .fetch_all(&self.db)
            .await?;

        Ok(clicks)
    }

    async fn record_click(&self, click: ClickEvent) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO link_clicks (id, short_link_id, user_agent, referrer, clicked_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(click.id)
        .bind(click.short_link_id)
        .bind(&click.user_agent)
        .bind(&click.referrer)
        .bind(click.clicked_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    pub(crate) async fn memory_store() -> SqliteLinkStore {
        SqliteLinkStore::connect("sqlite::memory:", 1).await.unwrap()
    }

    fn click_for(link: &ShortLink, minutes_ago: i64) -> ClickEvent {
        ClickEvent {
            id: Uuid::new_v4(),
            short_link_id: link.id,
            user_agent: "test-agent".into(),
            referrer: None,
            clicked_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = memory_store().await;
        let link = ShortLink::new("abc123".into(), "https://example.com".into(), "u1".into());
        store.insert(link.clone()).await.unwrap();

        assert!(store.exists_by_slug("abc123").await.unwrap());
        assert!(!store.exists_by_slug("zzz999").await.unwrap());
        assert_eq!(store.find_by_slug("abc123").await.unwrap(), link);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_uniqueness_violation() {
        let store = memory_store().await;
        let first = ShortLink::new("dup".into(), "https://a.example".into(), "u1".into());
        let second = ShortLink::new("dup".into(), "https://b.example".into(), "u2".into());

        store.insert(first).await.unwrap();
        let err = store.insert(second).await.unwrap_err();

        assert!(matches!(err, StoreError::UniquenessViolation));
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found() {
        let store = memory_store().await;
        let err = store.find_by_slug("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_list_by_owner_is_scoped_and_newest_first() {
        let store = memory_store().await;
        let mut older = ShortLink::new("old".into(), "https://a.example".into(), "u1".into());
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = ShortLink::new("new".into(), "https://b.example".into(), "u1".into());
        let foreign = ShortLink::new("other".into(), "https://c.example".into(), "u2".into());

        store.insert(older).await.unwrap();
        store.insert(newer).await.unwrap();
        store.insert(foreign).await.unwrap();

        let slugs: Vec<String> = store
            .list_by_owner("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.slug)
            .collect();
        assert_eq!(slugs, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_list_clicks_filters_by_id_set() {
        let store = memory_store().await;
        let a = ShortLink::new("a".into(), "https://a.example".into(), "u1".into());
        let b = ShortLink::new("b".into(), "https://b.example".into(), "u1".into());
        store.insert(a.clone()).await.unwrap();
        store.insert(b.clone()).await.unwrap();

        store.record_click(click_for(&a, 10)).await.unwrap();
        store.record_click(click_for(&a, 1)).await.unwrap();
        store.record_click(click_for(&b, 5)).await.unwrap();

        let clicks = store
            .list_clicks_for_links(&HashSet::from([a.id]))
            .await
            .unwrap();
        assert_eq!(clicks.len(), 2);
        assert!(clicks.iter().all(|c| c.short_link_id == a.id));
        assert!(clicks[0].clicked_at > clicks[1].clicked_at);

        let none = store.list_clicks_for_links(&HashSet::new()).await.unwrap();
        assert!(none.is_empty());
    }
}
