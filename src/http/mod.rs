//! HTTP surface: thin axum handlers delegating to the Source Registry,
//! Stream Router and Store — no business logic lives here.

pub mod authn;
pub mod events;
pub mod sources;
pub mod sse;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::broadcast::ScoreChangeBus;
use crate::config::Config;
use crate::db::Database;
use crate::ingest::channel_matcher::ChannelMatcherWorker;
use crate::router::StreamRouter;
use authn::{AdminAuthn, SubjectAuthn};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub registry: Arc<crate::registry::SourceRegistry>,
    pub router: Arc<StreamRouter>,
    pub matcher: Arc<ChannelMatcherWorker>,
    pub score_bus: ScoreChangeBus,
    pub admin_authn: Arc<dyn AdminAuthn>,
    pub subject_authn: Arc<dyn SubjectAuthn>,
    pub config: Config,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/sports/sources", get(sources::list).post(sources::create))
        .route("/sports/sources/:id", get(sources::detail).delete(sources::disable))
        .route("/sports/sources/:id/refresh", post(sources::refresh))
        .route("/sports/sources/:id/health", get(sources::health_view))
        .route("/sports/events", get(events::list))
        .route("/sports/events/:id", get(events::detail))
        .route("/sports/events/:id/stream", get(events::stream))
        .route("/sports/events/:id/status-stream", get(sse::status_stream))
        .route("/sports/live", get(events::live))
        .route("/sports/ticker", get(sse::ticker))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
