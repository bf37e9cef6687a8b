use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::{Event, EventStatus};

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<Event> {
    Ok(Event {
        id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
        league_id: Uuid::parse_str(row.try_get::<String, _>("league_id")?.as_str())?,
        external_id: row.try_get("external_id")?,
        home_team: row.try_get("home_team")?,
        away_team: row.try_get("away_team")?,
        scheduled_start: row.try_get("scheduled_start")?,
        status: EventStatus::from_str(row.try_get::<String, _>("status")?.as_str())
            .unwrap_or(EventStatus::Scheduled),
        home_score: row.try_get("home_score")?,
        away_score: row.try_get("away_score")?,
        period: row.try_get("period")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const EVENT_COLUMNS: &str = "id, league_id, external_id, home_team, away_team, \
     scheduled_start, status, home_score, away_score, period, created_at, updated_at";

impl Database {
    /// Upsert keyed on (league_id, external_id): Schedule Sync creates new
    /// fixtures and refreshes metadata for known ones without touching
    /// score/status fields, which only the live score poller owns.
    pub async fn upsert_scheduled_event(
        &self,
        league_id: Uuid,
        external_id: &str,
        home_team: Option<&str>,
        away_team: Option<&str>,
        scheduled_start: chrono::DateTime<Utc>,
    ) -> Result<Event> {
        let now = Utc::now();
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM events WHERE league_id = ? AND external_id = ?",
        )
        .bind(league_id.to_string())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        let (id, status) = match existing {
            Some(id_str) => {
                let id = Uuid::parse_str(&id_str)?;
                sqlx::query(
                    "UPDATE events SET home_team = ?, away_team = ?, scheduled_start = ?, \
                     updated_at = ? WHERE id = ?",
                )
                .bind(home_team)
                .bind(away_team)
                .bind(scheduled_start)
                .bind(now)
                .bind(&id_str)
                .execute(&self.pool)
                .await?;
                let status: String =
                    sqlx::query_scalar("SELECT status FROM events WHERE id = ?")
                        .bind(&id_str)
                        .fetch_one(&self.pool)
                        .await?;
                (id, EventStatus::from_str(&status).unwrap_or(EventStatus::Scheduled))
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    "INSERT INTO events (id, league_id, external_id, home_team, away_team, \
                     scheduled_start, status, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, 'scheduled', ?, ?)",
                )
                .bind(id.to_string())
                .bind(league_id.to_string())
                .bind(external_id)
                .bind(home_team)
                .bind(away_team)
                .bind(scheduled_start)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await?;
                (id, EventStatus::Scheduled)
            }
        };

        Ok(Event {
            id,
            league_id,
            external_id: external_id.to_string(),
            home_team: home_team.map(str::to_string),
            away_team: away_team.map(str::to_string),
            scheduled_start,
            status,
            home_score: None,
            away_score: None,
            period: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_event_by_external_id(
        &self,
        league_id: Uuid,
        external_id: &str,
    ) -> Result<Option<Event>> {
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE league_id = ? AND external_id = ?"
        ))
        .bind(league_id.to_string())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_event).transpose()
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_event).transpose()
    }

    /// Events in exactly one status — used by the Live Score Poller,
    /// which only ever polls `live` events.
    pub async fn list_events_with_status(&self, status: EventStatus) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE status = ? ORDER BY scheduled_start"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_event).collect()
    }

    pub async fn list_live_events(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE status IN ('live', 'halftime') \
             ORDER BY scheduled_start"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_event).collect()
    }

    /// Ticker snapshot: live, halftime, or final events
    /// whose last update fell within the last 3 hours, capped at `limit`
    /// and ordered by scheduled time.
    pub async fn list_ticker_events(&self, limit: i64) -> Result<Vec<Event>> {
        let cutoff = Utc::now() - chrono::Duration::hours(3);
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE status IN ('live', 'halftime') \
                OR (status = 'final' AND updated_at >= ?) \
             ORDER BY scheduled_start LIMIT ?"
        ))
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_event).collect()
    }

    /// Events currently eligible for score polling: anything not yet in a
    /// terminal state (the poller only touches scheduled/live/halftime events).
    pub async fn list_active_events_by_league(&self, league_id: Uuid) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE league_id = ? \
             AND status NOT IN ('final', 'cancelled') ORDER BY scheduled_start"
        ))
        .bind(league_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_event).collect()
    }

    pub async fn list_events(&self, upcoming_only: bool) -> Result<Vec<Event>> {
        let rows = if upcoming_only {
            sqlx::query(&format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE status NOT IN ('final', 'cancelled') \
                 ORDER BY scheduled_start"
            ))
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY scheduled_start"))
                .fetch_all(&self.pool)
                .await?
        };
        rows.iter().map(row_to_event).collect()
    }

    /// Apply an upstream status/score update, rejecting any transition the
    /// state machine forbids. Returns `Ok(None)` when the
    /// transition is rejected so the caller can log and move on instead of
    /// treating it as an error.
    pub async fn apply_score_update(
        &self,
        id: Uuid,
        new_status: EventStatus,
        home_score: Option<i32>,
        away_score: Option<i32>,
        period: Option<&str>,
    ) -> Result<Option<Event>> {
        let current = match self.get_event(id).await? {
            Some(event) => event,
            None => return Ok(None),
        };

        if !current.status.can_transition_to(new_status) {
            return Ok(None);
        }

        let now = Utc::now();
        sqlx::query(
            "UPDATE events SET status = ?, home_score = ?, away_score = ?, period = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(new_status.as_str())
        .bind(home_score)
        .bind(away_score)
        .bind(period)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(Some(Event {
            status: new_status,
            home_score,
            away_score,
            period: period.map(str::to_string),
            updated_at: now,
            ..current
        }))
    }
}
