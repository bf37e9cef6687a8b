//! Schedule Sync Worker: pulls upcoming fixtures for every league with a
//! remote feed id and upserts them as `Event` rows.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::UpstreamConfig;
use crate::db::Database;
use crate::errors::AppResult;
use crate::schedule::upstream::{map_upstream_status, UpstreamFixture};

pub struct ScheduleSyncWorker {
    db: Database,
    http: reqwest::Client,
    upstream: UpstreamConfig,
    interval_hours: u64,
}

impl ScheduleSyncWorker {
    pub fn new(db: Database, upstream: UpstreamConfig, interval_hours: u64) -> Self {
        Self {
            db,
            http: reqwest::Client::new(),
            upstream,
            interval_hours,
        }
    }

    pub async fn run(self: Arc<Self>, cancellation_token: CancellationToken) {
        info!("schedule sync worker starting, interval {}h", self.interval_hours);

        if let Err(e) = self.sync_all_leagues().await {
            error!("initial schedule sync failed: {}", e);
        }

        let mut tick = interval(Duration::from_secs(self.interval_hours.max(1) * 3600));
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    // Network errors are retried on the next tick only —
                    // no in-tick retry.
                    if let Err(e) = self.sync_all_leagues().await {
                        error!("schedule sync failed: {}", e);
                    }
                }
                _ = cancellation_token.cancelled() => {
                    info!("schedule sync worker shutting down");
                    break;
                }
            }
        }
    }

    async fn sync_all_leagues(&self) -> AppResult<()> {
        let leagues = self.db.list_leagues().await?;
        for league in leagues {
            let Some(feed_id) = league.remote_feed_id.clone() else {
                continue;
            };
            if let Err(e) = self.sync_league(league.id, &feed_id).await {
                warn!("schedule sync failed for league {}: {}", league.id, e);
            }
        }
        Ok(())
    }

    async fn sync_league(&self, league_id: uuid::Uuid, feed_id: &str) -> AppResult<()> {
        let url = format!(
            "{}/eventsnextleague.php?id={}",
            self.upstream.sports_api_base_url, feed_id
        );
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(crate::errors::AppError::internal(format!(
                "schedule feed returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        let fixtures = body
            .get("events")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        for raw in fixtures {
            let fixture: UpstreamFixture = match serde_json::from_value(raw) {
                Ok(f) => f,
                Err(e) => {
                    warn!("skipping malformed schedule entry for league {league_id}: {e}");
                    continue;
                }
            };

            if fixture.external_id.trim().is_empty() {
                continue;
            }
            let Some(date_str) = fixture.date_event.as_deref() else {
                continue;
            };
            let Some(scheduled_start) = parse_scheduled_start(date_str, fixture.time_event.as_deref())
            else {
                warn!(
                    "skipping schedule entry {} with unparseable date for league {league_id}",
                    fixture.external_id
                );
                continue;
            };

            let event = self
                .db
                .upsert_scheduled_event(
                    league_id,
                    &fixture.external_id,
                    fixture.home_team.as_deref(),
                    fixture.away_team.as_deref(),
                    scheduled_start,
                )
                .await?;

            // The same feed that carries metadata also carries status and
            // scores; apply them through the state machine so a conflict
            // never regresses a final result back to live (spec's update
            // rule, not just the live score poller's).
            if let Some(new_status) = fixture.status.as_deref().and_then(map_upstream_status) {
                if new_status != event.status
                    || fixture.home_score != event.home_score
                    || fixture.away_score != event.away_score
                {
                    self.db
                        .apply_score_update(
                            event.id,
                            new_status,
                            fixture.home_score,
                            fixture.away_score,
                            fixture.period.as_deref(),
                        )
                        .await?;
                }
            }
        }

        Ok(())
    }
}

fn parse_scheduled_start(date: &str, time: Option<&str>) -> Option<chrono::DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = time
        .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").ok())
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is always valid"));
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_date_and_time() {
        let parsed = parse_scheduled_start("2026-07-28", Some("19:30:00")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-07-28T19:30:00+00:00");
    }

    #[test]
    fn missing_time_defaults_to_midnight() {
        let parsed = parse_scheduled_start("2026-07-28", None).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-07-28T00:00:00+00:00");
    }

    #[test]
    fn malformed_date_yields_none() {
        assert!(parse_scheduled_start("not-a-date", None).is_none());
    }
}
