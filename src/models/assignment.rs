use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The binding (event, channel) the Router uses to answer "where do I
/// watch this?". At most one row per event has `is_active = true`,
/// enforced by a partial unique index — see `db::assignments`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assignment {
    pub id: Uuid,
    pub event_id: Uuid,
    pub channel_id: Uuid,
    pub is_active: bool,
    pub assigned_by: AssignedBy,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignedBy {
    Auto,
    Admin,
}

impl AssignedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignedBy::Auto => "auto",
            AssignedBy::Admin => "admin",
        }
    }
}
