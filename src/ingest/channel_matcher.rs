//! Channel Matcher Worker: re-parses one source's playlist and reconciles
//! it against the channel table, running the Fuzzy Matcher over every raw
//! entry. Also runs as a periodic background worker (every
//! `channel_matcher_interval_hours`), using a tick-and-select loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::db::Database;
use crate::errors::AppResult;
use crate::ingest::m3u::PlaylistParser;
use crate::matching::LeagueMatcher;
use uuid::Uuid;

pub struct ChannelMatcherWorker {
    db: Database,
    parser: PlaylistParser,
    matcher: LeagueMatcher,
    interval_hours: u64,
}

impl ChannelMatcherWorker {
    pub fn new(
        db: Database,
        max_channels_per_source: usize,
        index_threshold: f64,
        store_threshold: f64,
        interval_hours: u64,
    ) -> Self {
        Self {
            db,
            parser: PlaylistParser::new(max_channels_per_source),
            matcher: LeagueMatcher::new(index_threshold, store_threshold),
            interval_hours,
        }
    }

    /// Re-parse and re-match a single source. Called on create/refresh and
    /// by the periodic loop below. Idempotent: running twice on an
    /// unchanged playlist yields the same final state.
    pub async fn run_for_source(&self, source_id: Uuid) -> AppResult<usize> {
        let source = self
            .db
            .get_source(source_id)
            .await?
            .ok_or_else(|| crate::errors::AppError::not_found("source", source_id.to_string()))?;

        let Some(m3u_url) = source.m3u_url.as_deref() else {
            return Ok(0);
        };

        let raw_channels = self.parser.fetch_and_parse(m3u_url).await?;
        let leagues = self.db.list_leagues().await?;
        let mut matched = 0;

        for raw in &raw_channels {
            let outcome = self
                .matcher
                .match_channel(&raw.name, raw.group_title.as_deref(), &leagues);

            if outcome.is_confirmed() {
                matched += 1;
            }

            self.db
                .upsert_channel(
                    source_id,
                    &raw.name,
                    &raw.stream_url,
                    raw.group_title.as_deref(),
                    raw.external_id.as_deref(),
                    outcome.league_id(),
                    outcome.confidence(),
                    outcome.is_confirmed(),
                )
                .await?;
        }

        info!(
            "matched {matched}/{} channels for source {source_id}",
            raw_channels.len()
        );

        Ok(raw_channels.len())
    }

    pub async fn run(self: Arc<Self>, cancellation_token: CancellationToken) {
        info!("channel matcher worker starting, interval {}h", self.interval_hours);
        let mut tick = interval(Duration::from_secs(self.interval_hours.max(1) * 3600));
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.run_all_sources().await {
                        error!("channel matcher sweep failed: {}", e);
                    }
                }
                _ = cancellation_token.cancelled() => {
                    info!("channel matcher worker shutting down");
                    break;
                }
            }
        }
    }

    async fn run_all_sources(&self) -> AppResult<()> {
        let sources = self.db.list_sources(Some(true)).await?;
        for source in sources {
            if source.m3u_url.is_none() {
                continue;
            }
            if let Err(e) = self.run_for_source(source.id).await {
                warn!("failed to re-match source {}: {}", source.id, e);
            }
        }
        Ok(())
    }
}
