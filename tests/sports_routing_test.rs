//! Integration tests for the sports stream routing core, exercising the
//! scenarios against a real (in-memory) SQLite database.
//! Network-facing pieces (M3U fetch, HEAD/ranged-GET probes, upstream
//! score feed) are exercised at the pure-function layer elsewhere; these
//! tests drive the Store, Fuzzy Matcher, Stream Router and Health
//! aggregation together the way a live deployment would.

use std::sync::Arc;

use chrono::{Duration, Utc};
use roost_sports_routing::config::DatabaseConfig;
use roost_sports_routing::db::Database;
use roost_sports_routing::health::HealthWorker;
use roost_sports_routing::ingest::m3u::PlaylistParser;
use roost_sports_routing::matching::LeagueMatcher;
use roost_sports_routing::models::{AssignedBy, EventStatus, HealthStatus, SourceKind};
use roost_sports_routing::router::StreamRouter;
use uuid::Uuid;

async fn test_db() -> Database {
    let db = Database::connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
    .expect("connect to in-memory sqlite");
    db.migrate().await.expect("run migrations");
    db
}

async fn seed_league(db: &Database, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO leagues (id, canonical_name, sport_keywords) VALUES (?, ?, '')")
        .bind(id.to_string())
        .bind(name)
        .execute(db.pool())
        .await
        .unwrap();
    id
}

async fn seed_event(db: &Database, league_id: Uuid, status: EventStatus, start: chrono::DateTime<Utc>) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO events (id, league_id, external_id, scheduled_start, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(league_id.to_string())
    .bind(id.to_string())
    .bind(start)
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .execute(db.pool())
    .await
    .unwrap();
    id
}

async fn seed_source(db: &Database, health: HealthStatus) -> Uuid {
    let source = db
        .create_source("Test Source", SourceKind::Manual, None, None)
        .await
        .unwrap();
    db.update_source_health(source.id, health, health == HealthStatus::Healthy)
        .await
        .unwrap();
    source.id
}

async fn seed_channel(db: &Database, source_id: Uuid, league_id: Uuid, confidence: f64) -> Uuid {
    let channel = db
        .upsert_channel(
            source_id,
            "ESPN",
            &format!("https://ex/{}.m3u8", Uuid::new_v4()),
            Some("Sports"),
            None,
            Some(league_id),
            confidence,
            confidence >= 0.82,
        )
        .await
        .unwrap();
    channel.id
}

// S1 — playlist parse + fuzzy match: ESPN lands matched (confidence > 0),
// a non-sports channel lands unmatched with confidence 0.
#[tokio::test]
async fn s1_create_and_match_playlist() {
    let db = test_db().await;
    let nfl = seed_league(&db, "National Football League").await;
    let _nba = seed_league(&db, "National Basketball Association").await;

    let body = "#EXTM3U\n#EXTINF:-1 tvg-name=\"ESPN\" group-title=\"Sports\",ESPN\n\
                https://ex/espn.m3u8\n#EXTINF:-1 tvg-name=\"Kids\",Kids\nhttps://ex/kids.m3u8\n";
    let raw_channels = PlaylistParser::parse(body, 10_000).unwrap();
    assert_eq!(raw_channels.len(), 2);

    let source_id = seed_source(&db, HealthStatus::Unknown).await;
    let matcher = LeagueMatcher::new(0.70, 0.82);
    let leagues = db.list_leagues().await.unwrap();

    for raw in &raw_channels {
        let outcome = matcher.match_channel(&raw.name, raw.group_title.as_deref(), &leagues);
        db.upsert_channel(
            source_id,
            &raw.name,
            &raw.stream_url,
            raw.group_title.as_deref(),
            raw.external_id.as_deref(),
            outcome.league_id(),
            outcome.confidence(),
            outcome.is_confirmed(),
        )
        .await
        .unwrap();
    }

    let channels = db.list_channels_by_source(source_id).await.unwrap();
    let espn = channels.iter().find(|c| c.name == "ESPN").unwrap();
    let kids = channels.iter().find(|c| c.name == "Kids").unwrap();

    assert!(espn.match_confidence > 0.0, "ESPN should score against some league");
    assert_eq!(kids.match_confidence, 0.0, "non-sports channel must stay unmatched");
    assert!(kids.matched_league_id.is_none());
    let _ = nfl; // league catalog used implicitly through list_leagues()
}

// S2 — active assignment with a healthy source short-circuits through the
// cache tier with no persistence side effect.
#[tokio::test]
async fn s2_router_healthy_cache_hit() {
    let db = test_db().await;
    let league_id = seed_league(&db, "National Football League").await;
    let event_id = seed_event(&db, league_id, EventStatus::Live, Utc::now()).await;
    let source_id = seed_source(&db, HealthStatus::Healthy).await;
    let channel_id = seed_channel(&db, source_id, league_id, 0.9).await;

    db.reassign_active(event_id, channel_id, AssignedBy::Auto)
        .await
        .unwrap();

    let router = StreamRouter::new(db.clone());
    let descriptor = router.select_best_source(event_id).await.unwrap();
    assert_eq!(descriptor.channel_id, channel_id);

    let assignment = db.get_active_assignment(event_id).await.unwrap().unwrap();
    assert_eq!(assignment.channel_id, channel_id);
}

// S3 — the cached assignment's source is down, a healthier alternative
// exists: the router falls through to auto-match and rebinds.
#[tokio::test]
async fn s3_router_stale_cache_falls_back_to_auto_match() {
    let db = test_db().await;
    let league_id = seed_league(&db, "National Football League").await;
    let event_id = seed_event(&db, league_id, EventStatus::Live, Utc::now()).await;

    let down_source = seed_source(&db, HealthStatus::Down).await;
    let c1 = seed_channel(&db, down_source, league_id, 0.9).await;
    db.reassign_active(event_id, c1, AssignedBy::Auto).await.unwrap();

    let healthy_source = seed_source(&db, HealthStatus::Healthy).await;
    let c2 = seed_channel(&db, healthy_source, league_id, 0.85).await;

    let router = StreamRouter::new(db.clone());
    let descriptor = router.select_best_source(event_id).await.unwrap();
    assert_eq!(descriptor.channel_id, c2);

    // Async persistence of the new assignment happens on a spawned task;
    // give it a moment to land before asserting the DB state.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let assignment = db.get_active_assignment(event_id).await.unwrap().unwrap();
    assert_eq!(assignment.channel_id, c2);
}

// S4 — a down-transition triggers failover for every imminent/live event
// bound to that source, and leaves an EventLog trail.
#[tokio::test]
async fn s4_failover_rehomes_imminent_events() {
    let db = test_db().await;
    let league_id = seed_league(&db, "National Football League").await;
    let event_id = seed_event(&db, league_id, EventStatus::Live, Utc::now()).await;

    let down_source = seed_source(&db, HealthStatus::Down).await;
    let c1 = seed_channel(&db, down_source, league_id, 0.9).await;
    db.reassign_active(event_id, c1, AssignedBy::Auto).await.unwrap();

    let healthy_source = seed_source(&db, HealthStatus::Healthy).await;
    let c2 = seed_channel(&db, healthy_source, league_id, 0.85).await;

    let router = StreamRouter::new(db.clone());
    router.failover_source(down_source).await;

    // The replacement assignment is persisted asynchronously after the
    // failover hook already logged the transition (failover must not
    // block on the write); give the spawned task a moment.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let assignment = db.get_active_assignment(event_id).await.unwrap().unwrap();
    assert_eq!(assignment.channel_id, c2);

    let log = db.list_event_log_for_event(event_id).await.unwrap();
    assert!(log.iter().any(|entry| entry.kind == "stream.failover"));
}

// S4b — failover with no alternative clears the stale assignment and logs
// a failure rather than leaving a dead URL active.
#[tokio::test]
async fn s4b_failover_with_no_alternative_clears_assignment() {
    let db = test_db().await;
    let league_id = seed_league(&db, "National Football League").await;
    let event_id = seed_event(&db, league_id, EventStatus::Live, Utc::now()).await;

    let down_source = seed_source(&db, HealthStatus::Down).await;
    let c1 = seed_channel(&db, down_source, league_id, 0.9).await;
    db.reassign_active(event_id, c1, AssignedBy::Auto).await.unwrap();

    let router = StreamRouter::new(db.clone());
    router.failover_source(down_source).await;

    assert!(db.get_active_assignment(event_id).await.unwrap().is_none());
    let log = db.list_event_log_for_event(event_id).await.unwrap();
    assert!(log.iter().any(|entry| entry.kind == "stream.failover_failed"));
}

// A disabled source's channels must never be selected, even when
// confidence and health would otherwise win.
#[tokio::test]
async fn disabled_source_never_selected() {
    let db = test_db().await;
    let league_id = seed_league(&db, "National Football League").await;
    let event_id = seed_event(&db, league_id, EventStatus::Scheduled, Utc::now() + Duration::hours(1)).await;

    let source_id = seed_source(&db, HealthStatus::Healthy).await;
    let _channel_id = seed_channel(&db, source_id, league_id, 0.95).await;
    db.disable_source(source_id).await.unwrap();

    let router = StreamRouter::new(db.clone());
    let result = router.select_best_source(event_id).await;
    assert!(result.is_err(), "disabled source must never be returned");
}

// Health sweep wiring: the worker must complete a full sweep cleanly
// even with no sources registered (the aggregation boundary behaviours
// themselves are covered by health::mod's own unit tests).
#[tokio::test]
async fn health_worker_run_once_skips_sourceless_channels_without_panicking() {
    let db = test_db().await;
    let router = Arc::new(StreamRouter::new(db.clone()));
    let worker = Arc::new(HealthWorker::new(db.clone(), router, 300, 20, 5));
    // No sources registered at all: the sweep must complete cleanly.
    worker.run_once().await.unwrap();
}

// S6 — re-running schedule upsert against the same fixture twice must not
// duplicate the event nor regress its terminal state.
#[tokio::test]
async fn s6_schedule_upsert_is_idempotent_and_never_regresses_final() {
    let db = test_db().await;
    let league_id = seed_league(&db, "National Football League").await;

    let start = Utc::now() + Duration::days(1);
    let first = db
        .upsert_scheduled_event(league_id, "ext-1", Some("Home"), Some("Away"), start)
        .await
        .unwrap();
    let second = db
        .upsert_scheduled_event(league_id, "ext-1", Some("Home"), Some("Away"), start)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);

    let all = db.list_events(false).await.unwrap();
    assert_eq!(all.iter().filter(|e| e.external_id == "ext-1").count(), 1);

    // Move the event to `final`, then attempt a regressive `live` update:
    // the state machine must reject it.
    db.apply_score_update(first.id, EventStatus::Live, Some(1), Some(0), None)
        .await
        .unwrap();
    db.apply_score_update(first.id, EventStatus::Final, Some(3), Some(1), None)
        .await
        .unwrap();
    let regressed = db
        .apply_score_update(first.id, EventStatus::Live, Some(3), Some(1), None)
        .await
        .unwrap();
    assert!(regressed.is_none(), "a regression out of `final` must be a no-op");

    let event = db.get_event(first.id).await.unwrap().unwrap();
    assert_eq!(event.status, EventStatus::Final);
}

// Ticker snapshot boundary: `final` events fall out of the window at
// 3h + 1s.
#[tokio::test]
async fn ticker_excludes_final_events_past_three_hour_window() {
    let db = test_db().await;
    let league_id = seed_league(&db, "National Football League").await;

    let recent_final = seed_event(&db, league_id, EventStatus::Scheduled, Utc::now()).await;
    db.apply_score_update(recent_final, EventStatus::Live, Some(1), Some(0), None)
        .await
        .unwrap();
    db.apply_score_update(recent_final, EventStatus::Final, Some(2), Some(1), None)
        .await
        .unwrap();

    let old_final = seed_event(&db, league_id, EventStatus::Scheduled, Utc::now() - Duration::hours(5)).await;
    db.apply_score_update(old_final, EventStatus::Live, Some(1), Some(0), None)
        .await
        .unwrap();
    db.apply_score_update(old_final, EventStatus::Final, Some(2), Some(1), None)
        .await
        .unwrap();
    // Force updated_at far in the past to simulate the 3h+1s boundary
    // without sleeping in the test.
    sqlx::query("UPDATE events SET updated_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::hours(3) - Duration::seconds(1))
        .bind(old_final.to_string())
        .execute(db.pool())
        .await
        .unwrap();

    let ticker = db.list_ticker_events(50).await.unwrap();
    let ids: Vec<Uuid> = ticker.iter().map(|e| e.id).collect();
    assert!(ids.contains(&recent_final));
    assert!(!ids.contains(&old_final));
}

// Jaro-Winkler symmetry and identity properties, exercised at the
// integration layer against realistic league names.
#[tokio::test]
async fn jaro_winkler_symmetry_holds_for_realistic_names() {
    use roost_sports_routing::matching::jaro_winkler;

    let pairs = [
        ("ESPN", "National Football League"),
        ("Sky Sports NFL", "National Football League"),
        ("DAZN", "DAZN"),
    ];
    for (a, b) in pairs {
        assert!((jaro_winkler(a, b) - jaro_winkler(b, a)).abs() < 1e-9);
    }
}
