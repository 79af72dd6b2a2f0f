use crate::types::{Entry, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Fields of an entry at insert time; the store assigns the id and the
/// posted flag defaults to false.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub fingerprint: String,
    pub source: String,
    pub url: String,
    pub headline: String,
    pub summary: String,
    pub published: String,
}

/// Durable collection of entries keyed by fingerprint. Append-only except
/// for the posted flag; nothing in this crate deletes rows.
pub struct EntryStore {
    db: SqlitePool,
}

impl EntryStore {
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))?
            .create_if_missing(true);
        let db = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    /// In-memory store, used by tests. A single connection keeps every
    /// handle on the same database.
    pub async fn open_in_memory() -> Result<Self> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fingerprint TEXT NOT NULL UNIQUE,
                source TEXT NOT NULL,
                url TEXT NOT NULL,
                headline TEXT NOT NULL,
                summary TEXT NOT NULL DEFAULT '',
                published TEXT NOT NULL,
                posted INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Insert an entry unless its fingerprint already exists. Returns
    /// whether a new row was created; a fingerprint collision is a no-op,
    /// not an error, and never overwrites existing fields. The unique
    /// constraint makes the check-and-insert atomic under concurrent use.
    pub async fn insert_if_absent(&self, entry: &NewEntry) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO entries (fingerprint, source, url, headline, summary, published)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(fingerprint) DO NOTHING
            "#,
        )
        .bind(&entry.fingerprint)
        .bind(&entry.source)
        .bind(&entry.url)
        .bind(&entry.headline)
        .bind(&entry.summary)
        .bind(&entry.published)
        .execute(&self.db)
        .await?;

        let created = result.rows_affected() > 0;
        if !created {
            debug!("Duplicate fingerprint, skipped: {}", entry.url);
        }
        Ok(created)
    }

    /// Unposted entries, newest first: published descending, ties broken by
    /// id descending. Block lists are applied by the selector afterwards,
    /// so no LIMIT happens here.
    pub async fn fetch_unposted(&self, source: Option<&str>) -> Result<Vec<Entry>> {
        let rows = if let Some(source) = source {
            sqlx::query(
                "SELECT id, fingerprint, source, url, headline, summary, published, posted \
                 FROM entries WHERE posted = 0 AND source = $1 \
                 ORDER BY published DESC, id DESC",
            )
            .bind(source)
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query(
                "SELECT id, fingerprint, source, url, headline, summary, published, posted \
                 FROM entries WHERE posted = 0 \
                 ORDER BY published DESC, id DESC",
            )
            .fetch_all(&self.db)
            .await?
        };

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(Entry {
                id: row.try_get("id")?,
                fingerprint: row.try_get("fingerprint")?,
                source: row.try_get("source")?,
                url: row.try_get("url")?,
                headline: row.try_get("headline")?,
                summary: row.try_get("summary")?,
                published: row.try_get("published")?,
                posted: row.try_get("posted")?,
            });
        }

        Ok(entries)
    }

    /// Flip the posted flag for one entry. Called only by the publish
    /// driver after a confirmed successful submission; there is no way to
    /// flip it back.
    pub async fn mark_posted(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE entries SET posted = 1 WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        info!("Marked entry {} as posted", id);
        Ok(())
    }

    pub async fn stats(&self) -> Result<HashMap<String, i64>> {
        let mut stats = HashMap::new();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.db)
            .await?;
        stats.insert("total_entries".to_string(), total);

        let unposted: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE posted = 0")
            .fetch_one(&self.db)
            .await?;
        stats.insert("unposted_entries".to_string(), unposted);

        let sources: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT source) FROM entries")
            .fetch_one(&self.db)
            .await?;
        stats.insert("distinct_sources".to_string(), sources);

        Ok(stats)
    }
}
