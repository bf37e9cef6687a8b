use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::{Assignment, AssignedBy};

fn row_to_assignment(row: &sqlx::sqlite::SqliteRow) -> Result<Assignment> {
    Ok(Assignment {
        id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
        event_id: Uuid::parse_str(row.try_get::<String, _>("event_id")?.as_str())?,
        channel_id: Uuid::parse_str(row.try_get::<String, _>("channel_id")?.as_str())?,
        is_active: row.try_get("is_active")?,
        assigned_by: match row.try_get::<String, _>("assigned_by")?.as_str() {
            "admin" => AssignedBy::Admin,
            _ => AssignedBy::Auto,
        },
        created_at: row.try_get("created_at")?,
    })
}

const ASSIGNMENT_COLUMNS: &str = "id, event_id, channel_id, is_active, assigned_by, created_at";

const ASSIGNMENT_COLUMNS_PREFIXED: &str =
    "a.id, a.event_id, a.channel_id, a.is_active, a.assigned_by, a.created_at";

impl Database {
    pub async fn get_active_assignment(&self, event_id: Uuid) -> Result<Option<Assignment>> {
        let row = sqlx::query(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE event_id = ? AND is_active = 1"
        ))
        .bind(event_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_assignment).transpose()
    }

    /// Atomically replace the active assignment for an event: deactivate
    /// whatever is currently active, then insert the new one. Both writes
    /// happen in one transaction so the partial unique index on
    /// `assignments(event_id) WHERE is_active = 1` never sees two active
    /// rows for the same event, even under concurrent failovers.
    pub async fn reassign_active(
        &self,
        event_id: Uuid,
        new_channel_id: Uuid,
        assigned_by: AssignedBy,
    ) -> Result<Assignment> {
        self.with_tx(move |tx| {
            Box::pin(async move {
                sqlx::query(
                    "UPDATE assignments SET is_active = 0 WHERE event_id = ? AND is_active = 1",
                )
                .bind(event_id.to_string())
                .execute(&mut **tx)
                .await?;

                let id = Uuid::new_v4();
                let now = Utc::now();
                sqlx::query(
                    "INSERT INTO assignments (id, event_id, channel_id, is_active, \
                     assigned_by, created_at) VALUES (?, ?, ?, 1, ?, ?)",
                )
                .bind(id.to_string())
                .bind(event_id.to_string())
                .bind(new_channel_id.to_string())
                .bind(assigned_by.as_str())
                .bind(now)
                .execute(&mut **tx)
                .await?;

                Ok(Assignment {
                    id,
                    event_id,
                    channel_id: new_channel_id,
                    is_active: true,
                    assigned_by,
                    created_at: now,
                })
            })
        })
        .await
    }

    /// Active assignments whose channel belongs to `source_id` — the
    /// candidate set the Router's failover hook re-homes.
    pub async fn list_assignments_for_source(&self, source_id: Uuid) -> Result<Vec<Assignment>> {
        let rows = sqlx::query(&format!(
            "SELECT {ASSIGNMENT_COLUMNS_PREFIXED} FROM assignments a \
             JOIN channels c ON c.id = a.channel_id \
             WHERE c.source_id = ? AND a.is_active = 1"
        ))
        .bind(source_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_assignment).collect()
    }

    /// Deactivate the active assignment without installing a replacement
    /// — used when failover finds no healthy candidate left; the Router
    /// then reports "no stream available" rather than serving a dead one.
    pub async fn clear_active_assignment(&self, event_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE assignments SET is_active = 0 WHERE event_id = ? AND is_active = 1")
            .bind(event_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
