// The operation surface: validate, mutate, persist, broadcast.

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use draftboard_core::auth::{can_act, AuthPolicy};
use draftboard_core::error::DraftError;
use draftboard_core::import::{validate_records, ImportSummary, RawPlayerRecord};
use draftboard_core::player::Player;
use draftboard_core::randomizer::randomize_order;
use draftboard_core::state::{DraftState, DraftStatus, ResetConfig};
use draftboard_core::team::{claim_team, release_team, Team};
use draftboard_core::timer::is_expired;

use crate::events::{ChangeNotifier, DraftEvent};
use crate::store::{DraftStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// The store rejected the conditional pick write. The in-memory state
    /// was rolled back; re-read the snapshot and retry.
    #[error("pick {overall} conflicted with another writer; re-read and retry")]
    Conflict { overall: u32 },

    #[error("storage failure: {0}")]
    Storage(anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { overall } => ServiceError::Conflict { overall },
            StoreError::Other(e) => ServiceError::Storage(e),
        }
    }
}

/// The single logical writer for one draft.
///
/// All mutating operations take the async mutex, validate against the
/// aggregate, persist, then broadcast. Holding the lock across the store
/// call is what makes validate-then-write atomic for in-process callers;
/// the store's conditional pick write covers anything else touching the
/// same database.
pub struct DraftService<S: DraftStore, N: ChangeNotifier> {
    state: Mutex<DraftState>,
    store: S,
    notifier: N,
    policy: AuthPolicy,
    /// Overall number of the pick whose expiry was already announced, so
    /// polling does not re-broadcast the same expiry.
    expiry_announced: std::sync::Mutex<Option<u32>>,
}

impl<S: DraftStore, N: ChangeNotifier> DraftService<S, N> {
    /// Wrap a fresh aggregate, persisting the initial snapshot.
    pub fn new(
        state: DraftState,
        store: S,
        notifier: N,
        policy: AuthPolicy,
    ) -> Result<Self, ServiceError> {
        store.save_snapshot(&state)?;
        Ok(DraftService {
            state: Mutex::new(state),
            store,
            notifier,
            policy,
            expiry_announced: std::sync::Mutex::new(None),
        })
    }

    /// Resume from what the store holds, or fall back to `initial`.
    pub fn load_or_init(
        store: S,
        notifier: N,
        policy: AuthPolicy,
        initial: DraftState,
    ) -> Result<Self, ServiceError> {
        match store.load_snapshot()? {
            Some(state) => {
                info!(status = %state.status, "resumed draft from store");
                Ok(DraftService {
                    state: Mutex::new(state),
                    store,
                    notifier,
                    policy,
                    expiry_announced: std::sync::Mutex::new(None),
                })
            }
            None => Self::new(initial, store, notifier, policy),
        }
    }

    /// Current state of the board. Authoritative; clients replace their
    /// local copy with this wholesale.
    pub async fn snapshot(&self) -> DraftState {
        self.state.lock().await.clone()
    }

    pub async fn claim_team(
        &self,
        participant_id: &str,
        team_id: &str,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        claim_team(&mut state.teams, participant_id, team_id)?;
        self.store.save_snapshot(&state)?;
        self.notifier
            .notify(DraftEvent::TeamClaimed {
                team_id: team_id.to_string(),
                assignee: participant_id.to_string(),
            })
            .await;
        Ok(())
    }

    pub async fn release_team(&self, participant_id: &str) -> Result<bool, ServiceError> {
        let mut state = self.state.lock().await;
        let team_id = state
            .teams
            .iter()
            .find(|t| t.assignee.as_deref() == Some(participant_id))
            .map(|t| t.id.clone());
        let Some(team_id) = team_id else {
            return Ok(false);
        };
        release_team(&mut state.teams, participant_id);
        self.store.save_snapshot(&state)?;
        self.notifier
            .notify(DraftEvent::TeamReleased { team_id })
            .await;
        Ok(true)
    }

    /// Shuffle the claimed teams into a fresh draft order.
    pub async fn randomize_order(&self) -> Result<Vec<Team>, ServiceError> {
        let mut state = self.state.lock().await;
        let randomized = randomize_order(&state.teams);
        state.set_teams(randomized.clone())?;
        self.store.save_snapshot(&state)?;
        self.notifier
            .notify(DraftEvent::OrderRandomized {
                teams: randomized.clone(),
            })
            .await;
        Ok(randomized)
    }

    pub async fn start_draft(&self) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.start(Utc::now())?;
        self.store.save_snapshot(&state)?;
        self.clear_expiry_latch();
        self.notifier
            .notify(DraftEvent::DraftStarted {
                snapshot: Box::new(state.clone()),
            })
            .await;
        Ok(())
    }

    /// Make the current pick as `participant_id`.
    ///
    /// Turn authorization is enforced here, not just in presentation. The
    /// engine mutates a scratch copy first; the committed state only moves
    /// forward once the store's conditional write has landed, so a
    /// conflict or storage failure leaves the aggregate untouched.
    pub async fn apply_pick(
        &self,
        participant_id: &str,
        player_id: &str,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;

        if state.status == DraftStatus::InProgress
            && !can_act(&state, participant_id, &self.policy)
        {
            let team_name = state
                .on_the_clock()
                .map(|t| t.name.clone())
                .unwrap_or_default();
            warn!(participant_id, "pick attempt out of turn");
            return Err(DraftError::NotYourTurn { team_name }.into());
        }

        let mut next = state.clone();
        let applied = next.apply_pick(player_id, Utc::now())?;
        // One store commit covers the slot fill and the cursor advance.
        self.store.fill_pick(&next, &applied)?;
        *state = next;
        self.clear_expiry_latch();

        self.notifier
            .notify(DraftEvent::PickApplied {
                pick: applied.clone(),
            })
            .await;
        Ok(())
    }

    pub async fn pause_draft(&self) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.pause()?;
        self.store.save_progress(&state)?;
        self.notifier.notify(DraftEvent::DraftPaused).await;
        Ok(())
    }

    pub async fn resume_draft(&self) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        let resumed_at = Utc::now();
        state.resume(resumed_at)?;
        self.store.save_progress(&state)?;
        self.clear_expiry_latch();
        self.notifier
            .notify(DraftEvent::DraftResumed { resumed_at })
            .await;
        Ok(())
    }

    pub async fn reset_draft(&self, custom: Option<ResetConfig>) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        state.reset(custom);
        self.store.save_snapshot(&state)?;
        self.clear_expiry_latch();
        self.notifier.notify(DraftEvent::DraftReset).await;
        Ok(())
    }

    /// Replace the player pool from validated raw records. Only legal
    /// before the draft starts.
    pub async fn import_players(
        &self,
        records: &[RawPlayerRecord],
    ) -> Result<ImportSummary, ServiceError> {
        let (players, summary) = validate_records(records)?;
        self.replace_players(players, summary).await
    }

    /// Replace the pool with already-validated players.
    pub async fn replace_players(
        &self,
        players: Vec<Player>,
        summary: ImportSummary,
    ) -> Result<ImportSummary, ServiceError> {
        let mut state = self.state.lock().await;
        let count = players.len();
        state.replace_players(players)?;
        self.store.save_snapshot(&state)?;
        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            "player import applied"
        );
        self.notifier
            .notify(DraftEvent::PlayersReplaced { count })
            .await;
        Ok(summary)
    }

    /// Check the countdown, broadcasting expiry once per pick.
    ///
    /// Safe to poll: the event fires the first time the budget runs out
    /// and stays silent on later calls until the clock re-bases (a pick
    /// lands, or the draft starts, resumes, or resets). Never advances
    /// the cursor; the pick stays with the team on the clock until
    /// someone acts. Returns whether the budget has run out.
    pub async fn check_time_expired(&self) -> Result<bool, ServiceError> {
        let state = self.state.lock().await;
        if state.status != DraftStatus::InProgress {
            return Ok(false);
        }
        let Some(started_at) = state.pick_started_at else {
            return Ok(false);
        };
        if !is_expired(started_at, state.settings.seconds_per_pick, Utc::now()) {
            return Ok(false);
        }
        let Some(pick) = state.picks.get(state.cursor) else {
            return Ok(false);
        };
        {
            let mut announced = self.expiry_latch();
            if *announced == Some(pick.overall) {
                return Ok(true);
            }
            *announced = Some(pick.overall);
        }
        self.notifier
            .notify(DraftEvent::TimeExpired {
                overall: pick.overall,
                team_id: pick.team_id.clone(),
            })
            .await;
        Ok(true)
    }

    fn expiry_latch(&self) -> std::sync::MutexGuard<'_, Option<u32>> {
        self.expiry_announced.lock().expect("expiry latch poisoned")
    }

    fn clear_expiry_latch(&self) {
        *self.expiry_latch() = None;
    }
}
