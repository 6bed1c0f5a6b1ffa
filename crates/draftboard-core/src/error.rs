// Error taxonomy for draft operations.

use thiserror::Error;

use crate::state::DraftStatus;

/// Every way a draft operation can be rejected.
///
/// All variants are caller errors: the engine state is unchanged whenever
/// one of these is returned. Messages are written to be shown to users
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("the draft is not in progress (current status: {status})")]
    NotInProgress { status: DraftStatus },

    #[error("the draft is already complete")]
    DraftComplete,

    #[error("{count} claimed team(s) have no draft position; randomize the order first")]
    UnassignedDraftPositions { count: usize },

    #[error("no team with id `{team_id}`")]
    UnknownTeam { team_id: String },

    #[error("team `{team_name}` is already claimed by {assignee}")]
    TeamAlreadyClaimed {
        team_name: String,
        assignee: String,
    },

    #[error("it is not your turn: {team_name} is on the clock")]
    NotYourTurn { team_name: String },

    #[error("player `{player_id}` is not available (already drafted or unknown)")]
    PlayerUnavailable { player_id: String },

    #[error("pick {overall} has already been made")]
    PickAlreadyMade { overall: u32 },

    #[error("cannot {action} while the draft is {status}")]
    InvalidTransition {
        action: &'static str,
        status: DraftStatus,
    },

    #[error("settings are locked once the draft has started; reset first")]
    SettingsLocked,

    #[error("import produced no valid players ({skipped} record(s) skipped)")]
    EmptyImport { skipped: usize },
}
