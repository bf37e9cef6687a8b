use anyhow::Result;
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::League;

fn row_to_league(row: &sqlx::sqlite::SqliteRow) -> Result<League> {
    Ok(League {
        id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
        canonical_name: row.try_get("canonical_name")?,
        sport_keywords: row.try_get("sport_keywords")?,
        remote_feed_id: row.try_get("remote_feed_id")?,
    })
}

const LEAGUE_COLUMNS: &str = "id, canonical_name, sport_keywords, remote_feed_id";

impl Database {
    /// Leagues are seeded out-of-band: the core reads
    /// the catalog but never creates or mutates a league's name here.
    pub async fn list_leagues(&self) -> Result<Vec<League>> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAGUE_COLUMNS} FROM leagues ORDER BY canonical_name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_league).collect()
    }

    pub async fn get_league(&self, id: Uuid) -> Result<Option<League>> {
        let row = sqlx::query(&format!("SELECT {LEAGUE_COLUMNS} FROM leagues WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_league).transpose()
    }
}
