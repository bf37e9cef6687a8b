//! Health Worker: periodically samples each enabled
//! source's channels with ranged GET probes and aggregates the result
//! into a health status, triggering failover on a down-transition.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::db::Database;
use crate::errors::AppResult;
use crate::models::{HealthStatus, Source};
use crate::router::StreamRouter;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_RANGE: &str = "bytes=0-4095";

pub struct HealthWorker {
    db: Database,
    router: Arc<StreamRouter>,
    http: reqwest::Client,
    interval_seconds: u64,
    concurrency: usize,
    samples_per_source: usize,
}

impl HealthWorker {
    pub fn new(
        db: Database,
        router: Arc<StreamRouter>,
        interval_seconds: u64,
        concurrency: usize,
        samples_per_source: usize,
    ) -> Self {
        Self {
            db,
            router,
            http: reqwest::Client::new(),
            interval_seconds,
            concurrency,
            samples_per_source,
        }
    }

    pub async fn run(self: Arc<Self>, cancellation_token: CancellationToken) {
        info!("health worker starting, interval {}s", self.interval_seconds);
        let mut tick = interval(Duration::from_secs(self.interval_seconds.max(1)));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!("health sweep failed: {}", e);
                    }
                }
                _ = cancellation_token.cancelled() => {
                    info!("health worker shutting down");
                    break;
                }
            }
        }
    }

    /// Runs a single probe sweep across all enabled sources. Exposed as
    /// `pub` (rather than test-only) so integration tests can drive one
    /// sweep deterministically without waiting on the tick interval.
    pub async fn run_once(&self) -> AppResult<()> {
        let sources = self.db.list_sources(Some(true)).await?;
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(sources.len());

        for source in sources {
            let semaphore = semaphore.clone();
            let db = self.db.clone();
            let http = self.http.clone();
            let samples_per_source = self.samples_per_source;
            handles.push(tokio::spawn(async move {
                probe_source(&db, &http, &source, samples_per_source, &semaphore).await
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(Ok(Some((source_id, became_down)))) => {
                    if became_down {
                        self.router.failover_source(source_id).await;
                    }
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => warn!("source health probe failed: {}", e),
                Err(e) => warn!("health probe task panicked: {}", e),
            }
        }

        Ok(())
    }
}

/// Samples up to `samples_per_source` channels for one source, aggregates
/// the result, and persists the transition. Returns `Some((source_id,
/// became_down))` when the status changed, so the caller can trigger
/// failover exactly once per down-transition.
async fn probe_source(
    db: &Database,
    http: &reqwest::Client,
    source: &Source,
    samples_per_source: usize,
    semaphore: &Semaphore,
) -> AppResult<Option<(uuid::Uuid, bool)>> {
    let channels = db.list_channels_by_source(source.id).await?;
    if channels.is_empty() {
        return Ok(None);
    }

    let sample_count = samples_per_source.min(channels.len());
    let mut indices: Vec<usize> = (0..channels.len()).collect();
    fastrand::shuffle(&mut indices);
    let sampled = &indices[..sample_count];

    // All samples for one source run concurrently, but each acquires its
    // own permit first: the global semaphore bounds total in-flight
    // channel probes across the whole sweep, not just per-source fan-out.
    let probes = sampled.iter().map(|&idx| async move {
        let _permit = semaphore.acquire().await.expect("semaphore never closed");
        probe_channel(http, &channels[idx].stream_url).await
    });
    let results = futures::future::join_all(probes).await;
    let ok = results.into_iter().filter(|&r| r).count();

    let new_status = aggregate_status(ok, sample_count);

    let previously_down = source.health_status == HealthStatus::Down;
    let became_healthy =
        new_status == HealthStatus::Healthy && source.health_status != HealthStatus::Healthy;
    let became_down = new_status == HealthStatus::Down && !previously_down;

    db.update_source_health(source.id, new_status, became_healthy).await?;

    if new_status != source.health_status {
        db.append_event_log(
            None,
            Some(source.id),
            "source.health_transition",
            &serde_json::json!({
                "from": source.health_status.as_str(),
                "to": new_status.as_str(),
            }),
        )
        .await?;
    }

    Ok(Some((source.id, became_down)))
}

async fn probe_channel(http: &reqwest::Client, stream_url: &str) -> bool {
    let result = http
        .get(stream_url)
        .header("Range", PROBE_RANGE)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await;

    match result {
        Ok(response) => {
            let status = response.status().as_u16();
            (200..=206).contains(&status)
        }
        Err(_) => false,
    }
}

/// Fraction-of-ok-samples aggregation rule (boundary
/// behaviours): exactly 0.90 is healthy, exactly 0.50 is degraded, zero
/// samples is unknown rather than down.
fn aggregate_status(ok: usize, sample_count: usize) -> HealthStatus {
    if sample_count == 0 {
        return HealthStatus::Unknown;
    }
    let fraction = ok as f64 / sample_count as f64;
    if fraction >= 0.90 {
        HealthStatus::Healthy
    } else if fraction >= 0.50 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_ninety_percent_is_healthy() {
        assert_eq!(aggregate_status(9, 10), HealthStatus::Healthy);
    }

    #[test]
    fn exactly_fifty_percent_is_degraded() {
        assert_eq!(aggregate_status(5, 10), HealthStatus::Degraded);
    }

    #[test]
    fn just_under_fifty_percent_is_down() {
        assert_eq!(aggregate_status(4, 10), HealthStatus::Down);
    }

    #[test]
    fn zero_samples_is_unknown() {
        assert_eq!(aggregate_status(0, 0), HealthStatus::Unknown);
    }

    #[test]
    fn zero_ok_out_of_some_samples_is_down() {
        assert_eq!(aggregate_status(0, 5), HealthStatus::Down);
    }
}
