//! Stream Router: resolves an event to a playable stream through a
//! three-tier lookup, and re-homes assignments away from a source that
//! just went down.

use chrono::{Duration as ChronoDuration, Utc};
use tracing::{error, warn};
use uuid::Uuid;

use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{AssignedBy, Channel, HealthStatus};

const FAILOVER_HORIZON: ChronoDuration = ChronoDuration::hours(4);

#[derive(Debug, Clone, serde::Serialize)]
pub struct StreamDescriptor {
    pub channel_id: Uuid,
    pub stream_url: String,
}

pub struct StreamRouter {
    db: Database,
}

impl StreamRouter {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Three-tier selection: assignment cache, then auto-match, then
    /// miss. Persistence of a fresh auto-match happens
    /// asynchronously after the descriptor is already determined — a
    /// persistence failure must never affect what is returned.
    pub async fn select_best_source(&self, event_id: Uuid) -> AppResult<StreamDescriptor> {
        if let Some(descriptor) = self.from_assignment_cache(event_id).await? {
            return Ok(descriptor);
        }

        if let Some(descriptor) = self.auto_match(event_id).await? {
            return Ok(descriptor);
        }

        Err(AppError::NoStreamAvailable {
            event_id: event_id.to_string(),
        })
    }

    async fn from_assignment_cache(&self, event_id: Uuid) -> AppResult<Option<StreamDescriptor>> {
        let Some(assignment) = self.db.get_active_assignment(event_id).await? else {
            return Ok(None);
        };
        let Some(channel) = self.db.get_channel(assignment.channel_id).await? else {
            return Ok(None);
        };
        let Some(source) = self.db.get_source(channel.source_id).await? else {
            return Ok(None);
        };

        if source.health_status == HealthStatus::Down {
            // Cache-miss: bypassed but not deactivated here. Deactivation
            // happens only once a replacement is actually bound.
            return Ok(None);
        }

        Ok(Some(StreamDescriptor {
            channel_id: channel.id,
            stream_url: channel.stream_url,
        }))
    }

    async fn auto_match(&self, event_id: Uuid) -> AppResult<Option<StreamDescriptor>> {
        let event = self
            .db
            .get_event(event_id)
            .await?
            .ok_or_else(|| AppError::not_found("event", event_id.to_string()))?;

        let candidates = self
            .db
            .list_channels_for_league(event.league_id)
            .await?;

        let Some(best) = self.rank_candidates(candidates).await? else {
            return Ok(None);
        };

        let descriptor = StreamDescriptor {
            channel_id: best.id,
            stream_url: best.stream_url.clone(),
        };

        let db = self.db.clone();
        let channel_id = best.id;
        tokio::spawn(async move {
            if let Err(e) = db.reassign_active(event_id, channel_id, AssignedBy::Auto).await {
                warn!("failed to persist auto-match assignment for event {event_id}: {e}");
            }
        });

        Ok(Some(descriptor))
    }

    /// Orders candidates by source health (healthy before degraded), then
    /// match confidence descending, then smallest source id for stable
    /// tie-breaking.
    async fn rank_candidates(&self, candidates: Vec<Channel>) -> AppResult<Option<Channel>> {
        let mut ranked: Vec<(Channel, HealthStatus)> = Vec::with_capacity(candidates.len());
        for channel in candidates {
            let Some(source) = self.db.get_source(channel.source_id).await? else {
                continue;
            };
            if !source.enabled || !source.health_status.is_usable() {
                continue;
            }
            ranked.push((channel, source.health_status));
        }

        ranked.sort_by(|(a_chan, a_health), (b_chan, b_health)| {
            let health_rank = |h: HealthStatus| if h == HealthStatus::Healthy { 0 } else { 1 };
            health_rank(*a_health)
                .cmp(&health_rank(*b_health))
                .then(
                    b_chan
                        .match_confidence
                        .partial_cmp(&a_chan.match_confidence)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(a_chan.source_id.cmp(&b_chan.source_id))
        });

        Ok(ranked.into_iter().next().map(|(channel, _)| channel))
    }

    /// Re-homes every live-or-imminent event assigned to a source that
    /// just went down. Runs best-effort: a failure to re-home one event
    /// never aborts the sweep for the rest.
    pub async fn failover_source(&self, source_id: Uuid) {
        let affected = match self.db.list_assignments_for_source(source_id).await {
            Ok(assignments) => assignments,
            Err(e) => {
                error!("failed to list assignments for failover of source {source_id}: {e}");
                return;
            }
        };

        let horizon = Utc::now() + FAILOVER_HORIZON;

        for assignment in affected {
            let event = match self.db.get_event(assignment.event_id).await {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) => {
                    warn!("failed to load event {} during failover: {e}", assignment.event_id);
                    continue;
                }
            };

            let is_live_or_imminent =
                matches!(event.status, crate::models::EventStatus::Live | crate::models::EventStatus::Halftime)
                    || event.scheduled_start <= horizon;
            if !is_live_or_imminent {
                continue;
            }

            let candidates = match self.db.list_channels_for_league(event.league_id).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("failed to list failover candidates for event {}: {e}", event.id);
                    continue;
                }
            };
            let ranked = match self.rank_candidates(candidates).await {
                Ok(ranked) => ranked,
                Err(e) => {
                    warn!("failed to rank failover candidates for event {}: {e}", event.id);
                    continue;
                }
            };

            // Failover has no caller awaiting a response, unlike the
            // request-path auto-match: deactivate, insert, and log the
            // new assignment atomically before moving to the next event.
            match ranked {
                Some(best) => {
                    if let Err(e) = self
                        .db
                        .reassign_active(event.id, best.id, AssignedBy::Auto)
                        .await
                    {
                        warn!("failed to persist failover reassignment for event {}: {e}", event.id);
                        continue;
                    }
                    let _ = self
                        .db
                        .append_event_log(
                            Some(event.id),
                            Some(source_id),
                            "stream.failover",
                            &serde_json::json!({
                                "from_source": source_id,
                                "to_source": best.source_id,
                                "reason": "source_down",
                            }),
                        )
                        .await;
                }
                None => {
                    if let Err(e) = self.db.clear_active_assignment(event.id).await {
                        warn!("failed to clear stale assignment for event {}: {e}", event.id);
                    }
                    let _ = self
                        .db
                        .append_event_log(
                            Some(event.id),
                            Some(source_id),
                            "stream.failover_failed",
                            &serde_json::json!({ "event": event.id }),
                        )
                        .await;
                }
            }
        }
    }
}
