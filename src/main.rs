use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roost_sports_routing::{
    broadcast::ScoreChangeBus,
    config::Config,
    db::Database,
    health::HealthWorker,
    http::{
        authn::{AdminAuthn, NoopAuthn, SubjectAuthn},
        build_router, AppState,
    },
    ingest::channel_matcher::ChannelMatcherWorker,
    registry::SourceRegistry,
    router::StreamRouter,
    schedule::{score_poller::LiveScorePoller, sync::ScheduleSyncWorker},
};

#[derive(Parser)]
#[command(name = "roost-sports-routing")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sports stream routing and source federation service")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("roost_sports_routing={},tower_http=info", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "starting Roost sports stream routing service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut config = Config::load(&cli.config)?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }
    info!("configuration loaded from {}", cli.config);

    let db = Database::connect(&config.database).await?;
    db.migrate().await?;
    info!("database connected and migrations applied: {}", config.database.url);

    let cancellation_token = CancellationToken::new();
    let score_bus = ScoreChangeBus::new();

    let matcher = Arc::new(ChannelMatcherWorker::new(
        db.clone(),
        config.ingestion.max_channels_per_source,
        config.matching.index_threshold,
        config.matching.store_threshold,
        config.ingestion.channel_matcher_interval_hours,
    ));
    let router = Arc::new(StreamRouter::new(db.clone()));
    let registry = Arc::new(SourceRegistry::new(db.clone(), matcher.clone()));

    let health_worker = Arc::new(HealthWorker::new(
        db.clone(),
        router.clone(),
        config.health.interval_seconds,
        config.health.concurrency,
        config.health.samples_per_source,
    ));
    let schedule_sync = Arc::new(ScheduleSyncWorker::new(
        db.clone(),
        config.upstream.clone(),
        config.schedule.schedule_sync_interval_hours,
    ));
    let score_poller = Arc::new(LiveScorePoller::new(
        db.clone(),
        config.upstream.clone(),
        score_bus.clone(),
        config.schedule.score_poll_interval_seconds,
    ));

    let mut worker_handles = Vec::new();
    {
        let worker = matcher.clone();
        let token = cancellation_token.clone();
        worker_handles.push(tokio::spawn(async move { worker.run(token).await }));
    }
    {
        let worker = health_worker.clone();
        let token = cancellation_token.clone();
        worker_handles.push(tokio::spawn(async move { worker.run(token).await }));
    }
    {
        let worker = schedule_sync.clone();
        let token = cancellation_token.clone();
        worker_handles.push(tokio::spawn(async move { worker.run(token).await }));
    }
    {
        let worker = score_poller.clone();
        let token = cancellation_token.clone();
        worker_handles.push(tokio::spawn(async move { worker.run(token).await }));
    }
    info!("background workers started: channel matcher, health, schedule sync, live score poller");

    let admin_authn: Arc<dyn AdminAuthn> = Arc::new(NoopAuthn);
    let subject_authn: Arc<dyn SubjectAuthn> = Arc::new(NoopAuthn);

    let state = AppState {
        db: db.clone(),
        registry,
        router,
        matcher,
        score_bus,
        admin_authn,
        subject_authn,
        config: config.clone(),
    };

    let app = build_router(state);
    let addr: std::net::SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");

    {
        let signal_token = cancellation_token.clone();
        tokio::spawn(async move {
            await_shutdown_signal(signal_token).await;
        });
    }

    let server_token = cancellation_token.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            server_token.cancelled().await;
        })
        .await?;

    cancellation_token.cancel();
    for handle in worker_handles {
        let _ = handle.await;
    }
    info!("all background workers stopped, exiting");

    Ok(())
}

async fn await_shutdown_signal(cancellation_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received, cancelling background workers");
    cancellation_token.cancel();
}
