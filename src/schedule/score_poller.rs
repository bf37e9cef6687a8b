//! Live Score Poller: polls every live event's league once per tick
//! (never per-event, to minimise upstream requests) and publishes a
//! `ScoreChange` whenever score or status moves.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::broadcast::{ScoreChange, ScoreChangeBus};
use crate::config::UpstreamConfig;
use crate::db::Database;
use crate::errors::AppResult;
use crate::models::EventStatus;
use crate::schedule::upstream::{map_upstream_status, UpstreamFixture};

pub struct LiveScorePoller {
    db: Database,
    http: reqwest::Client,
    upstream: UpstreamConfig,
    bus: ScoreChangeBus,
    poll_interval_seconds: u64,
}

impl LiveScorePoller {
    pub fn new(
        db: Database,
        upstream: UpstreamConfig,
        bus: ScoreChangeBus,
        poll_interval_seconds: u64,
    ) -> Self {
        Self {
            db,
            http: reqwest::Client::new(),
            upstream,
            bus,
            poll_interval_seconds,
        }
    }

    pub async fn run(self: Arc<Self>, cancellation_token: CancellationToken) {
        info!("live score poller starting, interval {}s", self.poll_interval_seconds);
        let mut tick = interval(Duration::from_secs(self.poll_interval_seconds.max(1)));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.poll_once().await {
                        error!("score poll failed: {}", e);
                    }
                }
                _ = cancellation_token.cancelled() => {
                    info!("live score poller shutting down");
                    break;
                }
            }
        }
    }

    async fn poll_once(&self) -> AppResult<()> {
        let live_events = self.db.list_events_with_status(EventStatus::Live).await?;
        if live_events.is_empty() {
            return Ok(());
        }

        let mut by_league: HashMap<Uuid, Vec<String>> = HashMap::new();
        for event in &live_events {
            by_league.entry(event.league_id).or_default().push(event.external_id.clone());
        }

        for (league_id, external_ids) in by_league {
            if let Err(e) = self.poll_league(league_id, &external_ids).await {
                warn!("failed to poll live scores for league {}: {}", league_id, e);
            }
        }

        Ok(())
    }

    async fn poll_league(&self, league_id: Uuid, external_ids: &[String]) -> AppResult<()> {
        let Some(league) = self.db.get_league(league_id).await? else {
            return Ok(());
        };
        let Some(feed_id) = league.remote_feed_id else {
            return Ok(());
        };

        let url = format!(
            "{}/eventslive.php?id={}",
            self.upstream.sports_api_base_url, feed_id
        );
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(crate::errors::AppError::internal(format!(
                "live score feed returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        let fixtures = body
            .get("events")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let by_external_id: HashMap<String, UpstreamFixture> = fixtures
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<UpstreamFixture>(raw).ok())
            .map(|f| (f.external_id.clone(), f))
            .collect();

        for external_id in external_ids {
            let Some(fixture) = by_external_id.get(external_id) else {
                continue;
            };
            self.apply_fixture(league_id, external_id, fixture).await?;
        }

        Ok(())
    }

    async fn apply_fixture(
        &self,
        league_id: Uuid,
        external_id: &str,
        fixture: &UpstreamFixture,
    ) -> AppResult<()> {
        let Some(current) = self.db.get_event_by_external_id(league_id, external_id).await? else {
            return Ok(());
        };

        let new_status = fixture
            .status
            .as_deref()
            .and_then(map_upstream_status)
            .unwrap_or(current.status);

        let changed = new_status != current.status
            || fixture.home_score != current.home_score
            || fixture.away_score != current.away_score;

        if !changed {
            return Ok(());
        }

        if let Some(updated) = self
            .db
            .apply_score_update(
                current.id,
                new_status,
                fixture.home_score,
                fixture.away_score,
                fixture.period.as_deref(),
            )
            .await?
        {
            self.bus.publish(ScoreChange {
                event_id: updated.id,
                home_score: updated.home_score,
                away_score: updated.away_score,
                status: updated.status,
                scoring_team: None,
            });
        }

        Ok(())
    }
}
