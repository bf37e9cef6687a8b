use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::Channel;

fn row_to_channel(row: &sqlx::sqlite::SqliteRow) -> Result<Channel> {
    Ok(Channel {
        id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
        source_id: Uuid::parse_str(row.try_get::<String, _>("source_id")?.as_str())?,
        name: row.try_get("name")?,
        stream_url: row.try_get("stream_url")?,
        group_title: row.try_get("group_title")?,
        external_id: row.try_get("external_id")?,
        matched_league_id: row
            .try_get::<Option<String>, _>("matched_league_id")?
            .map(|s| Uuid::parse_str(&s))
            .transpose()?,
        match_confidence: row.try_get("match_confidence")?,
        match_confirmed: row.try_get("match_confirmed")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const CHANNEL_COLUMNS: &str = "id, source_id, name, stream_url, group_title, external_id, \
     matched_league_id, match_confidence, match_confirmed, created_at, updated_at";

const CHANNEL_COLUMNS_PREFIXED: &str = "c.id, c.source_id, c.name, c.stream_url, \
     c.group_title, c.external_id, c.matched_league_id, c.match_confidence, \
     c.match_confirmed, c.created_at, c.updated_at";

impl Database {
    /// Idempotent upsert keyed on (source_id, stream_url): re-ingesting the
    /// same playlist updates metadata and match results in place rather
    /// than creating duplicate channel rows.
    pub async fn upsert_channel(
        &self,
        source_id: Uuid,
        name: &str,
        stream_url: &str,
        group_title: Option<&str>,
        external_id: Option<&str>,
        matched_league_id: Option<Uuid>,
        match_confidence: f64,
        match_confirmed: bool,
    ) -> Result<Channel> {
        let now = Utc::now();
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM channels WHERE source_id = ? AND stream_url = ?",
        )
        .bind(source_id.to_string())
        .bind(stream_url)
        .fetch_optional(&self.pool)
        .await?;

        let id = match existing {
            Some(id_str) => {
                let id = Uuid::parse_str(&id_str)?;

                // Insert-or-replace of name/group/external-id is
                // unconditional; a re-ingest must never regress an
                // already-confirmed match down to a lower-confidence or
                // unmatched result.
                let prior_confirmed: bool =
                    sqlx::query_scalar("SELECT match_confirmed FROM channels WHERE id = ?")
                        .bind(&id_str)
                        .fetch_one(&self.pool)
                        .await?;

                if prior_confirmed && !match_confirmed {
                    sqlx::query(
                        "UPDATE channels SET name = ?, group_title = ?, external_id = ?, \
                         updated_at = ? WHERE id = ?",
                    )
                    .bind(name)
                    .bind(group_title)
                    .bind(external_id)
                    .bind(now)
                    .bind(&id_str)
                    .execute(&self.pool)
                    .await?;
                } else {
                    sqlx::query(
                        "UPDATE channels SET name = ?, group_title = ?, external_id = ?, \
                         matched_league_id = ?, match_confidence = ?, match_confirmed = ?, \
                         updated_at = ? WHERE id = ?",
                    )
                    .bind(name)
                    .bind(group_title)
                    .bind(external_id)
                    .bind(matched_league_id.map(|u| u.to_string()))
                    .bind(match_confidence)
                    .bind(match_confirmed)
                    .bind(now)
                    .bind(&id_str)
                    .execute(&self.pool)
                    .await?;
                }
                id
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    "INSERT INTO channels (id, source_id, name, stream_url, group_title, \
                     external_id, matched_league_id, match_confidence, match_confirmed, \
                     created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(id.to_string())
                .bind(source_id.to_string())
                .bind(name)
                .bind(stream_url)
                .bind(group_title)
                .bind(external_id)
                .bind(matched_league_id.map(|u| u.to_string()))
                .bind(match_confidence)
                .bind(match_confirmed)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await?;
                id
            }
        };

        // Re-fetch rather than echo the caller's inputs: the
        // regression guard above may have kept the prior match fields
        // instead of applying the ones passed in.
        let row = sqlx::query(&format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = ?"))
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        row_to_channel(&row)
    }

    pub async fn get_channel(&self, id: Uuid) -> Result<Option<Channel>> {
        let row = sqlx::query(&format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_channel).transpose()
    }

    pub async fn list_channels_by_source(&self, source_id: Uuid) -> Result<Vec<Channel>> {
        let rows = sqlx::query(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels WHERE source_id = ? ORDER BY name"
        ))
        .bind(source_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_channel).collect()
    }

    /// Channels matched against a league (confirmed or merely candidate —
    /// the auto-match tier keys only on `matched_league_id`, not on
    /// `match_confirmed`), joined through enabled sources only.
    /// This is the candidate pool `select_best_source` ranks over.
    pub async fn list_channels_for_league(&self, league_id: Uuid) -> Result<Vec<Channel>> {
        let rows = sqlx::query(&format!(
            "SELECT {CHANNEL_COLUMNS_PREFIXED} FROM channels c \
             JOIN sources s ON s.id = c.source_id \
             WHERE c.matched_league_id = ? AND s.enabled = 1"
        ))
        .bind(league_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_channel).collect()
    }
}
