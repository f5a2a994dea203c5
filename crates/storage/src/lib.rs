use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tracing::debug;

mod memory;

pub use memory::MemoryStore;

/// Set-algebra operations a pipeline needs from its backing store.
///
/// Every method is a single atomic step against the store. A key that was
/// never written, or whose set was emptied, reads as an empty set.
#[async_trait]
pub trait SetStore: Send + Sync {
    async fn add_member(&self, key: &str, value: &str) -> Result<()>;
    async fn members(&self, key: &str) -> Result<Vec<String>>;
    /// Returns `false` when `value` was not a member of `source`.
    async fn move_member(&self, source: &str, dest: &str, value: &str) -> Result<bool>;
    /// Adds every member of `sources` to `dest`; `sources` are left untouched.
    async fn union_into(&self, dest: &str, sources: &[String]) -> Result<()>;
    async fn delete_key(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<T: SetStore + ?Sized> SetStore for Arc<T> {
    async fn add_member(&self, key: &str, value: &str) -> Result<()> {
        (**self).add_member(key, value).await
    }

    async fn members(&self, key: &str) -> Result<Vec<String>> {
        (**self).members(key).await
    }

    async fn move_member(&self, source: &str, dest: &str, value: &str) -> Result<bool> {
        (**self).move_member(source, dest, value).await
    }

    async fn union_into(&self, dest: &str, sources: &[String]) -> Result<()> {
        (**self).union_into(dest, sources).await
    }

    async fn delete_key(&self, key: &str) -> Result<()> {
        (**self).delete_key(key).await
    }
}

#[derive(Clone)]
pub struct SqliteSetStore {
    pool: Pool<Sqlite>,
}

impl SqliteSetStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);

        // Every pooled connection to a memory url would otherwise see its own database.
        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;

        let store = Self { pool };
        store.ensure_set_table().await?;
        debug!(database_url, "sqlite set store ready");
        Ok(store)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_set_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS set_members (
                set_key TEXT NOT NULL,
                member  TEXT NOT NULL,
                PRIMARY KEY (set_key, member)
            ) WITHOUT ROWID
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure set_members table exists")?;
        Ok(())
    }
}

#[async_trait]
impl SetStore for SqliteSetStore {
    async fn add_member(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO set_members (set_key, member) VALUES (?1, ?2)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to add member to '{key}'"))?;
        Ok(())
    }

    async fn members(&self, key: &str) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT member FROM set_members WHERE set_key = ?1")
            .bind(key)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to read members of '{key}'"))?;
        Ok(rows.into_iter().map(|r| r.get::<String, _>(0)).collect())
    }

    async fn move_member(&self, source: &str, dest: &str, value: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM set_members WHERE set_key = ?1 AND member = ?2")
            .bind(source)
            .bind(value)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to remove member from '{source}'"))?
            .rows_affected();

        if removed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("INSERT OR IGNORE INTO set_members (set_key, member) VALUES (?1, ?2)")
            .bind(dest)
            .bind(value)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to add member to '{dest}'"))?;

        tx.commit().await?;
        Ok(true)
    }

    async fn union_into(&self, dest: &str, sources: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for source in sources {
            sqlx::query(
                "INSERT OR IGNORE INTO set_members (set_key, member)
                 SELECT ?1, member FROM set_members WHERE set_key = ?2",
            )
            .bind(dest)
            .bind(source)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to merge '{source}' into '{dest}'"))?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM set_members WHERE set_key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete '{key}'"))?;
        Ok(())
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_in_memory(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
