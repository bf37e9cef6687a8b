//! In-memory score-change broadcast channel: the Live
//! Score Poller publishes here, and every SSE ticker/status stream
//! subscribes to react without polling the database.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::EventStatus;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct ScoreChange {
    pub event_id: Uuid,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub status: EventStatus,
    pub scoring_team: Option<String>,
}

#[derive(Clone)]
pub struct ScoreChangeBus {
    sender: broadcast::Sender<ScoreChange>,
}

impl ScoreChangeBus {
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, change: ScoreChange) {
        // No subscribers is a normal state between client connections,
        // not an error worth logging.
        let _ = self.sender.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScoreChange> {
        self.sender.subscribe()
    }
}

impl Default for ScoreChangeBus {
    fn default() -> Self {
        Self::new()
    }
}
