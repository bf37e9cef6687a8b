//! Source Registry: the admin-facing lifecycle for
//! playlist sources. Thin orchestration over `db::sources` plus the
//! create-time reachability probe and the refresh hook into the Channel
//! Matcher Worker.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::ingest::channel_matcher::ChannelMatcherWorker;
use crate::models::{Source, SourceKind};

const CREATE_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SourceRegistry {
    db: Database,
    http: reqwest::Client,
    matcher: Arc<ChannelMatcherWorker>,
}

impl SourceRegistry {
    pub fn new(db: Database, matcher: Arc<ChannelMatcherWorker>) -> Self {
        Self {
            db,
            http: reqwest::Client::new(),
            matcher,
        }
    }

    /// Validates kind-vs-URL consistency, probes a playlist URL with a 5s
    /// HEAD request when present, then persists the source and kicks off
    /// an initial match pass. Concurrent creates with the
    /// same URL are allowed — deduplication belongs to the matcher, not
    /// the registry.
    pub async fn create(
        &self,
        name: &str,
        kind: SourceKind,
        m3u_url: Option<&str>,
        contributor_id: Option<&str>,
    ) -> AppResult<Source> {
        self.validate_kind(kind, m3u_url, contributor_id)?;

        if let Some(url) = m3u_url {
            self.probe(url).await?;
        }

        let source = self.db.create_source(name, kind, m3u_url, contributor_id).await?;

        if m3u_url.is_some() {
            let worker = self.matcher.clone();
            let source_id = source.id;
            tokio::spawn(async move {
                if let Err(e) = worker.run_for_source(source_id).await {
                    warn!("initial match pass failed for source {source_id}: {e}");
                }
            });
        }

        Ok(source)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Source> {
        self.db
            .get_source(id)
            .await?
            .ok_or_else(|| AppError::not_found("source", id.to_string()))
    }

    pub async fn list(&self, enabled_only: Option<bool>) -> AppResult<Vec<Source>> {
        Ok(self.db.list_sources(enabled_only).await?)
    }

    /// Soft-delete: never removes channels, the Router filters by the
    /// source's enabled flag instead.
    pub async fn disable(&self, id: Uuid) -> AppResult<()> {
        if !self.db.disable_source(id).await? {
            return Err(AppError::not_found("source", id.to_string()));
        }
        Ok(())
    }

    pub async fn refresh(&self, id: Uuid) -> AppResult<usize> {
        self.get(id).await?;
        self.matcher.run_for_source(id).await
    }

    pub async fn health_view(&self, id: Uuid) -> AppResult<Source> {
        self.get(id).await
    }

    fn validate_kind(
        &self,
        kind: SourceKind,
        m3u_url: Option<&str>,
        contributor_id: Option<&str>,
    ) -> AppResult<()> {
        match kind {
            SourceKind::Contributor if contributor_id.is_none() => Err(AppError::InvalidSourceType {
                message: "contributor sources require a contributor_id".to_string(),
            }),
            SourceKind::Manual if contributor_id.is_some() => Err(AppError::InvalidSourceType {
                message: "manual sources must not carry a contributor_id".to_string(),
            }),
            SourceKind::RemoteUrl if m3u_url.is_none() => Err(AppError::InvalidSourceType {
                message: "remote_url sources require an m3u_url".to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn probe(&self, url: &str) -> AppResult<()> {
        let response = self
            .http
            .head(url)
            .timeout(CREATE_PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|_| AppError::M3uUnreachable { url: url.to_string() })?;

        if !(response.status().is_success() || response.status().is_redirection()) {
            return Err(AppError::M3uUnreachable { url: url.to_string() });
        }
        Ok(())
    }
}
