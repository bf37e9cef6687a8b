use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::EventLog;

fn row_to_event_log(row: &sqlx::sqlite::SqliteRow) -> Result<EventLog> {
    Ok(EventLog {
        id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
        event_id: row
            .try_get::<Option<String>, _>("event_id")?
            .map(|s| Uuid::parse_str(&s))
            .transpose()?,
        source_id: row
            .try_get::<Option<String>, _>("source_id")?
            .map(|s| Uuid::parse_str(&s))
            .transpose()?,
        kind: row.try_get("kind")?,
        payload: serde_json::from_str(&row.try_get::<String, _>("payload")?)
            .unwrap_or(serde_json::Value::Null),
        created_at: row.try_get("created_at")?,
    })
}

const EVENT_LOG_COLUMNS: &str = "id, event_id, source_id, kind, payload, created_at";

impl Database {
    pub async fn append_event_log(
        &self,
        event_id: Option<Uuid>,
        source_id: Option<Uuid>,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Result<EventLog> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let payload_text = payload.to_string();

        sqlx::query(
            "INSERT INTO event_log (id, event_id, source_id, kind, payload, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(event_id.map(|u| u.to_string()))
        .bind(source_id.map(|u| u.to_string()))
        .bind(kind)
        .bind(&payload_text)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(EventLog {
            id,
            event_id,
            source_id,
            kind: kind.to_string(),
            payload: payload.clone(),
            created_at: now,
        })
    }

    pub async fn list_event_log_for_event(&self, event_id: Uuid) -> Result<Vec<EventLog>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_LOG_COLUMNS} FROM event_log WHERE event_id = ? ORDER BY created_at"
        ))
        .bind(event_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_event_log).collect()
    }
}
