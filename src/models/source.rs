use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A third-party IPTV playlist registered with the system.
///
/// A disabled source is never selected by the Router nor probed by the
/// Health Worker.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub kind: SourceKind,
    pub m3u_url: Option<String>,
    pub contributor_id: Option<String>,
    pub enabled: bool,
    pub health_status: HealthStatus,
    pub last_probe_at: Option<DateTime<Utc>>,
    pub last_healthy_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Contributor,
    Manual,
    RemoteUrl,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Contributor => "contributor",
            SourceKind::Manual => "manual",
            SourceKind::RemoteUrl => "remote_url",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "contributor" => Some(SourceKind::Contributor),
            "manual" => Some(SourceKind::Manual),
            "remote_url" => Some(SourceKind::RemoteUrl),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Down,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Down => "down",
            HealthStatus::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "healthy" => HealthStatus::Healthy,
            "degraded" => HealthStatus::Degraded,
            "down" => HealthStatus::Down,
            _ => HealthStatus::Unknown,
        }
    }

    /// A source is usable by the Router when its status is one of these.
    pub fn is_usable(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Request body for `POST /sports/sources`.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceCreateRequest {
    pub name: String,
    pub kind: SourceKind,
    pub m3u_url: Option<String>,
    pub contributor_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceHealthView {
    pub source_id: Uuid,
    pub health_status: HealthStatus,
    pub last_probe_at: Option<DateTime<Utc>>,
    pub last_healthy_at: Option<DateTime<Utc>>,
    pub channel_count: i64,
}
