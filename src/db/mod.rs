//! Store abstraction: a narrow interface over the relational database.
//! No ORM semantics leak past this module — every other component talks
//! to `Database`, never to `sqlx` directly.
//!
//! The embedded-migration runner tracks applied versions in a manual
//! `_migrations` table rather than relying on `sqlx migrate`, so
//! migrations ship inside the binary via `rust-embed`.

pub mod assignments;
pub mod channels;
pub mod event_log;
pub mod events;
pub mod leagues;
pub mod sources;

use anyhow::Result;
use rust_embed::RustEmbed;
use sqlx::{migrate::MigrateDatabase, Pool, Sqlite, SqlitePool};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::info;

use crate::config::DatabaseConfig;

#[derive(RustEmbed)]
#[folder = "migrations/"]
struct MigrationAssets;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if !Sqlite::database_exists(&config.url).await.unwrap_or(false) {
            Sqlite::create_database(&config.url).await?;
        }

        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version TEXT PRIMARY KEY,
                checksum TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let mut names: Vec<_> = MigrationAssets::iter().collect();
        names.sort();

        for name in names {
            let file = MigrationAssets::get(&name).expect("embedded migration must exist");
            let sql = std::str::from_utf8(file.data.as_ref())?.to_string();
            let checksum = Self::checksum(&sql);

            let already_applied: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM _migrations WHERE version = ?")
                    .bind(name.as_ref())
                    .fetch_one(&self.pool)
                    .await?;
            if already_applied > 0 {
                continue;
            }

            let mut tx = self.pool.begin().await?;
            for statement in sql.split(';') {
                let trimmed = statement.trim();
                if trimmed.is_empty() {
                    continue;
                }
                sqlx::query(trimmed).execute(&mut *tx).await?;
            }
            sqlx::query("INSERT INTO _migrations (version, checksum) VALUES (?, ?)")
                .bind(name.as_ref())
                .bind(&checksum)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            info!("applied migration {}", name);
        }

        Ok(())
    }

    fn checksum(sql: &str) -> String {
        let mut hasher = DefaultHasher::new();
        sql.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }

    /// Run a closure inside a single serializable transaction, committing
    /// on success and rolling back on error. Used whenever two or more
    /// writes must be observed atomically (e.g. `reassign_active`).
    pub async fn with_tx<F, T>(&self, f: F) -> Result<T>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, Sqlite>,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<T>> + Send + 'c>,
        >,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }
}
