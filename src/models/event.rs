use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single game/match. Created by Schedule Sync, mutated by the Live
/// Score Poller; terminal once `final` or `cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub league_id: Uuid,
    pub external_id: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub scheduled_start: DateTime<Utc>,
    pub status: EventStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub period: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Live,
    Halftime,
    Final,
    Postponed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Live => "live",
            EventStatus::Halftime => "halftime",
            EventStatus::Final => "final",
            EventStatus::Postponed => "postponed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "scheduled" => EventStatus::Scheduled,
            "live" => EventStatus::Live,
            "halftime" => EventStatus::Halftime,
            "final" => EventStatus::Final,
            "postponed" => EventStatus::Postponed,
            "cancelled" => EventStatus::Cancelled,
            _ => return None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Final | EventStatus::Cancelled)
    }

    /// State machine transitions used by Schedule Sync and the Live Score
    /// Poller to reject regressive upstream updates — in particular,
    /// `final` never regresses back to `live`.
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        use EventStatus::*;
        if *self == next {
            return true;
        }
        match self {
            Scheduled => matches!(next, Live | Postponed | Cancelled),
            Live => matches!(next, Halftime | Final | Cancelled),
            Halftime => matches!(next, Live | Final),
            Final | Cancelled => false,
        }
    }
}
