use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::{HealthStatus, Source, SourceKind};

fn row_to_source(row: &sqlx::sqlite::SqliteRow) -> Result<Source> {
    Ok(Source {
        id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
        name: row.try_get("name")?,
        kind: SourceKind::from_str(row.try_get::<String, _>("kind")?.as_str())
            .unwrap_or(SourceKind::Manual),
        m3u_url: row.try_get("m3u_url")?,
        contributor_id: row.try_get("contributor_id")?,
        enabled: row.try_get("enabled")?,
        health_status: HealthStatus::from_str(row.try_get::<String, _>("health_status")?.as_str()),
        last_probe_at: row.try_get("last_probe_at")?,
        last_healthy_at: row.try_get("last_healthy_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const SOURCE_COLUMNS: &str = "id, name, kind, m3u_url, contributor_id, enabled, health_status, \
     last_probe_at, last_healthy_at, created_at, updated_at";

impl Database {
    pub async fn create_source(
        &self,
        name: &str,
        kind: SourceKind,
        m3u_url: Option<&str>,
        contributor_id: Option<&str>,
    ) -> Result<Source> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO sources (id, name, kind, m3u_url, contributor_id, enabled, \
             health_status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 1, 'unknown', ?, ?)",
        )
        .bind(id.to_string())
        .bind(name)
        .bind(kind.as_str())
        .bind(m3u_url)
        .bind(contributor_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Source {
            id,
            name: name.to_string(),
            kind,
            m3u_url: m3u_url.map(str::to_string),
            contributor_id: contributor_id.map(str::to_string),
            enabled: true,
            health_status: HealthStatus::Unknown,
            last_probe_at: None,
            last_healthy_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_source(&self, id: Uuid) -> Result<Option<Source>> {
        let row = sqlx::query(&format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_source).transpose()
    }

    pub async fn list_sources(&self, enabled_only: Option<bool>) -> Result<Vec<Source>> {
        let rows = match enabled_only {
            Some(enabled) => {
                sqlx::query(&format!(
                    "SELECT {SOURCE_COLUMNS} FROM sources WHERE enabled = ? ORDER BY name"
                ))
                .bind(enabled)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!("SELECT {SOURCE_COLUMNS} FROM sources ORDER BY name"))
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(row_to_source).collect()
    }

    /// Soft-delete: sets `enabled = false`. Channels are never removed —
    /// the Router filters by the source's enabled flag instead.
    pub async fn disable_source(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE sources SET enabled = 0, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_source_health(
        &self,
        id: Uuid,
        status: HealthStatus,
        became_healthy: bool,
    ) -> Result<()> {
        let now = Utc::now();
        if became_healthy {
            sqlx::query(
                "UPDATE sources SET health_status = ?, last_probe_at = ?, last_healthy_at = ? \
                 WHERE id = ?",
            )
            .bind(status.as_str())
            .bind(now)
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query("UPDATE sources SET health_status = ?, last_probe_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(now)
                .bind(id.to_string())
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    pub async fn source_channel_count(&self, source_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM channels WHERE source_id = ?")
            .bind(source_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
