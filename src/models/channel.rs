use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry within a Source's playlist.
///
/// Unique on (source_id, stream_url); deleting a source cascades to its
/// channels.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Channel {
    pub id: Uuid,
    pub source_id: Uuid,
    pub name: String,
    pub stream_url: String,
    pub group_title: Option<String>,
    pub external_id: Option<String>,
    pub matched_league_id: Option<Uuid>,
    pub match_confidence: f64,
    pub match_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A channel entry as produced by the Playlist Parser, before it has been
/// persisted or matched against a league.
#[derive(Debug, Clone)]
pub struct RawChannel {
    pub name: String,
    pub stream_url: String,
    pub group_title: Option<String>,
    pub external_id: Option<String>,
    #[allow(dead_code)]
    pub logo_url: Option<String>,
}
