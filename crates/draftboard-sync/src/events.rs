// Outbound change notifications and the notifier seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use draftboard_core::state::{AppliedPick, DraftState};
use draftboard_core::team::Team;

/// Everything the service tells the outside world.
///
/// Events are advisory; the snapshot is authoritative. A client that
/// misses or reorders events re-reads the snapshot and replaces its local
/// copy wholesale, so at-least-once unordered delivery is acceptable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftEvent {
    TeamClaimed {
        team_id: String,
        assignee: String,
    },
    TeamReleased {
        team_id: String,
    },
    OrderRandomized {
        teams: Vec<Team>,
    },
    DraftStarted {
        snapshot: Box<DraftState>,
    },
    PickApplied {
        pick: AppliedPick,
    },
    PlayersReplaced {
        count: usize,
    },
    DraftPaused,
    DraftResumed {
        resumed_at: DateTime<Utc>,
    },
    DraftReset,
    /// The countdown ran out. Informational only; the cursor does not move
    /// until someone actually picks.
    TimeExpired {
        overall: u32,
        team_id: String,
    },
}

/// Where the service publishes changes. Injected, never ambient, so tests
/// can capture events and deployments can swap transports.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn notify(&self, event: DraftEvent);
}

/// In-process fanout over a `tokio::sync::broadcast` channel.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<DraftEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        BroadcastNotifier { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl ChangeNotifier for BroadcastNotifier {
    async fn notify(&self, event: DraftEvent) {
        // Send only fails when nobody is subscribed, which is fine.
        if self.tx.send(event.clone()).is_err() {
            debug!(?event, "no subscribers for draft event");
        }
    }
}

/// Notifier that drops everything, for callers that don't care.
pub struct NullNotifier;

#[async_trait]
impl ChangeNotifier for NullNotifier {
    async fn notify(&self, _event: DraftEvent) {}
}
