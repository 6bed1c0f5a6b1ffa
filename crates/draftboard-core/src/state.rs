// Draft state machine: settings, the aggregate, and its transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::DraftError;
use crate::order::{generate_pick_order, PickSlot};
use crate::player::Player;
use crate::team::{default_teams, RosterEntry, Team};

/// Lifecycle of a draft run.
///
/// `NotStarted -> InProgress -> {Paused <-> InProgress} -> Completed`.
/// `Completed` is terminal and is reached only when the final pick lands;
/// `reset` returns any state to `NotStarted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DraftStatus::NotStarted => "not started",
            DraftStatus::InProgress => "in progress",
            DraftStatus::Paused => "paused",
            DraftStatus::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// Draft configuration. Locked once picks exist; changing the team count
/// requires a full reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSettings {
    pub number_of_teams: u32,
    pub number_of_rounds: u32,
    /// Per-pick time budget in seconds (advisory countdown only).
    pub seconds_per_pick: u32,
    pub snake_format: bool,
}

impl Default for DraftSettings {
    fn default() -> Self {
        DraftSettings {
            number_of_teams: 9,
            number_of_rounds: 5,
            seconds_per_pick: 90,
            snake_format: true,
        }
    }
}

/// Overrides applied by `reset`. A new team count rebuilds the team
/// registry (clearing claims); other fields adjust settings in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetConfig {
    pub number_of_teams: Option<u32>,
    pub number_of_rounds: Option<u32>,
    pub seconds_per_pick: Option<u32>,
    pub snake_format: Option<bool>,
}

/// Summary of an accepted pick, suitable for a `pick-applied` broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPick {
    /// Index into the pick list (the cursor value the pick consumed).
    pub pick_index: usize,
    pub overall: u32,
    pub round: u32,
    pub team_id: String,
    pub player_id: String,
    pub picked_at: DateTime<Utc>,
}

/// The one shared mutable aggregate: everything a client needs to render
/// the board, and everything the engine needs to enforce its invariants.
///
/// Invariants held between calls:
/// - `cursor` equals the number of filled picks;
/// - `status == Completed` iff `cursor == picks.len()` (picks non-empty);
/// - a player is in `available_players` or on exactly one roster, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftState {
    pub settings: DraftSettings,
    pub teams: Vec<Team>,
    pub picks: Vec<PickSlot>,
    pub available_players: Vec<Player>,
    /// Index of the next unfilled pick.
    pub cursor: usize,
    pub status: DraftStatus,
    /// When the current pick went on the clock. The countdown is derived
    /// from this, never from a client-local counter.
    pub pick_started_at: Option<DateTime<Utc>>,
}

impl DraftState {
    /// A fresh draft: teams derived from the settings' team count, the
    /// given player pool, nothing started.
    pub fn new(settings: DraftSettings, players: Vec<Player>) -> Self {
        let teams = default_teams(settings.number_of_teams as usize);
        DraftState {
            settings,
            teams,
            picks: Vec::new(),
            available_players: players,
            cursor: 0,
            status: DraftStatus::NotStarted,
            pick_started_at: None,
        }
    }

    /// The team currently on the clock, if the draft has picks left.
    pub fn on_the_clock(&self) -> Option<&Team> {
        let pick = self.picks.get(self.cursor)?;
        self.teams.iter().find(|t| t.id == pick.team_id)
    }

    /// Replace the entire draft order with freshly randomized teams.
    /// Only legal before the draft starts.
    pub fn set_teams(&mut self, teams: Vec<Team>) -> Result<(), DraftError> {
        if self.status != DraftStatus::NotStarted {
            return Err(DraftError::InvalidTransition {
                action: "randomize the order",
                status: self.status,
            });
        }
        self.teams = teams;
        Ok(())
    }

    /// Adjust the settings in place. Locked once the draft has started;
    /// changing the team count rebuilds the registry (dropping claims).
    pub fn update_settings(&mut self, settings: DraftSettings) -> Result<(), DraftError> {
        if self.status != DraftStatus::NotStarted {
            return Err(DraftError::SettingsLocked);
        }
        if settings.number_of_teams != self.settings.number_of_teams {
            self.teams = default_teams(settings.number_of_teams as usize);
        }
        self.settings = settings;
        Ok(())
    }

    /// Wholesale replacement of the available pool (player import).
    /// Only legal before the draft starts.
    pub fn replace_players(&mut self, players: Vec<Player>) -> Result<(), DraftError> {
        if self.status != DraftStatus::NotStarted {
            return Err(DraftError::InvalidTransition {
                action: "import players",
                status: self.status,
            });
        }
        info!(count = players.len(), "player pool replaced");
        self.available_players = players;
        Ok(())
    }

    /// Start the draft: generate the pick order and go on the clock.
    ///
    /// Fails without any state change if the draft is already running or
    /// if claimed teams are missing draft positions (randomize first).
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), DraftError> {
        if self.status != DraftStatus::NotStarted {
            return Err(DraftError::InvalidTransition {
                action: "start",
                status: self.status,
            });
        }

        let unseeded_claims = self
            .teams
            .iter()
            .filter(|t| t.is_claimed() && t.draft_position.is_none())
            .count();
        if unseeded_claims > 0 {
            return Err(DraftError::UnassignedDraftPositions {
                count: unseeded_claims,
            });
        }
        if self.teams.iter().all(|t| t.draft_position.is_none()) {
            return Err(DraftError::UnassignedDraftPositions {
                count: self.teams.len(),
            });
        }

        self.picks = generate_pick_order(&self.teams, &self.settings);
        self.cursor = 0;
        self.status = DraftStatus::InProgress;
        self.pick_started_at = Some(now);
        info!(picks = self.picks.len(), "draft started");
        Ok(())
    }

    /// Pause the countdown and pick acceptance. Legal only from
    /// `InProgress`; picks, cursor, and rosters are untouched.
    pub fn pause(&mut self) -> Result<(), DraftError> {
        if self.status != DraftStatus::InProgress {
            return Err(DraftError::InvalidTransition {
                action: "pause",
                status: self.status,
            });
        }
        self.status = DraftStatus::Paused;
        info!("draft paused");
        Ok(())
    }

    /// Resume from a pause, re-basing the countdown at `now` so
    /// reconnecting clients compute the same remaining time.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), DraftError> {
        if self.status != DraftStatus::Paused {
            return Err(DraftError::InvalidTransition {
                action: "resume",
                status: self.status,
            });
        }
        self.status = DraftStatus::InProgress;
        self.pick_started_at = Some(now);
        info!("draft resumed");
        Ok(())
    }

    /// Apply a pick for the team on the clock.
    ///
    /// All-or-nothing: every precondition is checked before any mutation,
    /// so a rejection leaves the pool, the pick list, the rosters, and the
    /// cursor exactly as they were. On success the player moves from the
    /// pool to the pick slot and the team roster, the cursor advances by
    /// exactly one, and the draft completes when the last slot fills.
    pub fn apply_pick(
        &mut self,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AppliedPick, DraftError> {
        match self.status {
            DraftStatus::InProgress => {}
            DraftStatus::Completed => return Err(DraftError::DraftComplete),
            status => return Err(DraftError::NotInProgress { status }),
        }
        if self.cursor >= self.picks.len() {
            return Err(DraftError::DraftComplete);
        }
        if self.picks[self.cursor].is_filled() {
            // Should be unreachable while the cursor invariant holds, but a
            // stale snapshot writer must observe a rejection, not a double fill.
            warn!(cursor = self.cursor, "pick slot at cursor already filled");
            return Err(DraftError::PickAlreadyMade {
                overall: self.picks[self.cursor].overall,
            });
        }

        let pool_idx = self
            .available_players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| DraftError::PlayerUnavailable {
                player_id: player_id.to_string(),
            })?;
        let team_id = self.picks[self.cursor].team_id.clone();
        let team_idx = self
            .teams
            .iter()
            .position(|t| t.id == team_id)
            .ok_or_else(|| DraftError::UnknownTeam {
                team_id: team_id.clone(),
            })?;

        // Preconditions hold; from here the three effects land together.
        let player = self.available_players.remove(pool_idx);
        let pick = &mut self.picks[self.cursor];
        pick.player = Some(player.clone());
        pick.picked_at = Some(now);

        let applied = AppliedPick {
            pick_index: self.cursor,
            overall: pick.overall,
            round: pick.round,
            team_id: team_id.clone(),
            player_id: player.id.clone(),
            picked_at: now,
        };

        self.teams[team_idx].roster.push(RosterEntry {
            pick_number: applied.overall,
            round: applied.round,
            player,
        });

        self.cursor += 1;
        if self.cursor == self.picks.len() {
            self.status = DraftStatus::Completed;
            self.pick_started_at = None;
            info!("draft completed");
        } else {
            self.pick_started_at = Some(now);
        }
        info!(
            overall = applied.overall,
            team = %team_id,
            player = %applied.player_id,
            "pick applied"
        );
        Ok(applied)
    }

    /// Reset to `NotStarted` from any state.
    ///
    /// Picks and rosters are cleared, draft positions wiped, and the full
    /// player pool restored (rostered players return to availability).
    /// Claims survive a plain reset; supplying a new team count rebuilds
    /// the registry and drops them.
    pub fn reset(&mut self, custom: Option<ResetConfig>) {
        // Rostered players go back to the pool; the union of pool and
        // rosters is the original import.
        for team in &mut self.teams {
            for entry in team.roster.drain(..) {
                self.available_players.push(entry.player);
            }
            team.draft_position = None;
        }

        self.settings = DraftSettings::default();
        if let Some(cfg) = custom {
            if let Some(n) = cfg.number_of_teams {
                self.settings.number_of_teams = n;
                self.teams = default_teams(n as usize);
            }
            if let Some(r) = cfg.number_of_rounds {
                self.settings.number_of_rounds = r;
            }
            if let Some(s) = cfg.seconds_per_pick {
                self.settings.seconds_per_pick = s;
            }
            if let Some(snake) = cfg.snake_format {
                self.settings.snake_format = snake;
            }
        }

        self.picks.clear();
        self.cursor = 0;
        self.status = DraftStatus::NotStarted;
        self.pick_started_at = None;
        info!("draft reset");
    }
}
