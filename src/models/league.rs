use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sports competition. Externally owned — the core only reads it, and
/// never mutates a league's name or keyword set.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct League {
    pub id: Uuid,
    pub canonical_name: String,
    /// Comma-separated sport keywords used to gate matching (e.g. "NFL,ESPN").
    pub sport_keywords: String,
    /// Optional external feed identifier consumed by Schedule Sync (§4.G).
    pub remote_feed_id: Option<String>,
}

impl League {
    pub fn keywords(&self) -> Vec<&str> {
        self.sport_keywords
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}
