// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod auth;
pub mod error;
pub mod filter;
pub mod import;
pub mod order;
pub mod player;
pub mod randomizer;
pub mod state;
pub mod team;
pub mod timer;

pub use auth::{can_act, AuthPolicy};
pub use error::DraftError;
pub use filter::{
    filter_and_sort, unique_clubs, unique_positions, PlayerFilter, SortDirection, SortKey,
};
pub use import::{validate_records, ImportSummary, RawPlayerRecord};
pub use order::{generate_pick_order, PickSlot};
pub use player::{FieldStats, GoalkeeperStats, Player, PlayerStats};
pub use randomizer::{randomize_order, reveal_sequence};
pub use state::{AppliedPick, DraftSettings, DraftState, DraftStatus, ResetConfig};
pub use team::{claim_team, default_teams, named_teams, release_team, RosterEntry, Team};
pub use timer::{format_clock, is_expired, remaining_seconds};
