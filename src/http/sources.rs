//! Admin-facing Source Registry handlers (`/sports/sources*`). Every
//! route in this module is gated by `AdminAuthn`.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{Channel, Source, SourceCreateRequest};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListSourcesQuery {
    pub enabled: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SourceDetailResponse {
    #[serde(flatten)]
    pub source: Source,
    pub channels: Vec<Channel>,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SourceCreateRequest>,
) -> AppResult<(StatusCode, Json<Source>)> {
    state.admin_authn.verify_admin(&headers).await?;

    let source = state
        .registry
        .create(
            &body.name,
            body.kind,
            body.m3u_url.as_deref(),
            body.contributor_id.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(source)))
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListSourcesQuery>,
) -> AppResult<Json<Vec<Source>>> {
    state.admin_authn.verify_admin(&headers).await?;
    let sources = state.registry.list(query.enabled).await?;
    Ok(Json(sources))
}

pub async fn detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SourceDetailResponse>> {
    state.admin_authn.verify_admin(&headers).await?;
    let source = state.registry.get(id).await?;
    let channels = state.db.list_channels_by_source(id).await?;
    Ok(Json(SourceDetailResponse { source, channels }))
}

pub async fn disable(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.admin_authn.verify_admin(&headers).await?;
    state.registry.disable(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.admin_authn.verify_admin(&headers).await?;
    state.registry.get(id).await?;

    let registry = state.registry.clone();
    tokio::spawn(async move {
        if let Err(e) = registry.refresh(id).await {
            tracing::warn!("refresh failed for source {id}: {e}");
        }
    });

    Ok(StatusCode::ACCEPTED)
}

pub async fn health_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<Json<crate::models::SourceHealthView>> {
    state.admin_authn.verify_admin(&headers).await?;
    let source = state.registry.health_view(id).await?;
    let channel_count = state.db.source_channel_count(id).await?;

    Ok(Json(crate::models::SourceHealthView {
        source_id: source.id,
        health_status: source.health_status,
        last_probe_at: source.last_probe_at,
        last_healthy_at: source.last_healthy_at,
        channel_count,
    }))
}
