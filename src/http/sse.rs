//! Live-Event SSE Fan-out: the ticker stream and the per-event status
//! stream, built on `async_stream::stream!` yielding
//! `axum::response::sse::Event`s, with `Sse::keep_alive` for idle
//! comments.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::header::{HeaderName, HeaderValue},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    response::{IntoResponse, Response},
    Error as AxumError,
};
use tokio::time::interval;
use uuid::Uuid;

use crate::models::EventStatus;

use super::AppState;

/// `axum::response::sse::Sse` only sets `Content-Type: text/event-stream`;
/// spec.md §4.I also calls for an explicit no-cache directive and a
/// buffering-disabled hint so reverse proxies don't batch frames.
fn with_sse_headers(sse: impl IntoResponse) -> Response {
    let mut response = sse.into_response();
    response
        .headers_mut()
        .insert(axum::http::header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response.headers_mut().insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    response
}

const TICKER_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
const TICKER_LIMIT: i64 = 50;
const STATUS_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// `GET /sports/ticker`: snapshot on connect, then a fresh snapshot every
/// 30s or immediately when a score change touches a currently-included
/// event, whichever comes first.
pub async fn ticker(State(state): State<AppState>) -> Response {
    let db = state.db.clone();
    let mut changes = state.score_bus.subscribe();

    let stream = async_stream::stream! {
        let mut included: std::collections::HashSet<Uuid> = std::collections::HashSet::new();

        match db.list_ticker_events(TICKER_LIMIT).await {
            Ok(events) => {
                included = events.iter().map(|e| e.id).collect();
                if let Ok(payload) = serde_json::to_string(&events) {
                    yield Ok::<SseEvent, AxumError>(SseEvent::default().event("snapshot").data(payload));
                }
            }
            Err(e) => {
                tracing::warn!("ticker snapshot query failed: {e}");
            }
        }

        let mut tick = interval(TICKER_REFRESH_INTERVAL);
        tick.tick().await; // first tick fires immediately; the snapshot above already covers it

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                change = changes.recv() => {
                    match change {
                        Ok(change) if included.contains(&change.event_id) => {}
                        Ok(_) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            }

            match db.list_ticker_events(TICKER_LIMIT).await {
                Ok(events) => {
                    included = events.iter().map(|e| e.id).collect();
                    if let Ok(payload) = serde_json::to_string(&events) {
                        yield Ok::<SseEvent, AxumError>(SseEvent::default().event("snapshot").data(payload));
                    }
                }
                Err(e) => {
                    tracing::warn!("ticker refresh query failed: {e}");
                }
            }
        }
    };

    with_sse_headers(Sse::new(stream))
}

/// `GET /sports/events/{id}/status-stream`: initial status, then a
/// `status_change` frame whenever the database value actually transitions
/// (de-duplicated against the last emitted status).
pub async fn status_stream(State(state): State<AppState>, Path(event_id): Path<Uuid>) -> Response {
    let db = state.db.clone();
    let mut changes = state.score_bus.subscribe();

    let stream = async_stream::stream! {
        let mut last_status: Option<EventStatus> = None;

        match db.get_event(event_id).await {
            Ok(Some(event)) => {
                last_status = Some(event.status);
                if let Ok(payload) = serde_json::to_string(&event) {
                    yield Ok::<SseEvent, AxumError>(SseEvent::default().event("status").data(payload));
                }
            }
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("status-stream initial lookup failed for event {event_id}: {e}");
                return;
            }
        }

        loop {
            match changes.recv().await {
                Ok(change) if change.event_id == event_id => {
                    if Some(change.status) != last_status {
                        last_status = Some(change.status);
                        if let Ok(payload) = serde_json::to_string(&change) {
                            yield Ok::<SseEvent, AxumError>(SseEvent::default().event("status_change").data(payload));
                        }
                    }
                }
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    with_sse_headers(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(STATUS_KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    ))
}
