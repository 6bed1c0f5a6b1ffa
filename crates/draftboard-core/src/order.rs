// Pick-order generation: the snake-format draft board.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player::Player;
use crate::state::DraftSettings;
use crate::team::Team;

/// One slot on the draft board.
///
/// All slots for a draft run are created up front by
/// [`generate_pick_order`]; `player` and `picked_at` are filled exactly
/// once, in increasing `overall` order, by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickSlot {
    /// Overall sequence number, 1-based and contiguous.
    pub overall: u32,
    /// Round number, 1-based.
    pub round: u32,
    /// Position within the round, 1-based.
    pub pick_in_round: u32,
    /// The team obligated to pick at this slot.
    pub team_id: String,
    /// The chosen player, once the pick is made.
    pub player: Option<Player>,
    /// When the pick was made.
    pub picked_at: Option<DateTime<Utc>>,
}

impl PickSlot {
    pub fn is_filled(&self) -> bool {
        self.player.is_some()
    }
}

/// Generate the full pick list from teams with draft positions.
///
/// Teams without a draft position are excluded entirely, and the per-round
/// pick count is the size of that filtered subset, not the configured team
/// count. Odd rounds run ascending by draft position; even rounds are
/// reversed when snake format is on. Deterministic: randomness happened
/// earlier, in the randomizer.
pub fn generate_pick_order(teams: &[Team], settings: &DraftSettings) -> Vec<PickSlot> {
    let mut eligible: Vec<&Team> = teams.iter().filter(|t| t.draft_position.is_some()).collect();
    eligible.sort_by_key(|t| t.draft_position);
    let per_round = eligible.len() as u32;

    let mut picks = Vec::with_capacity((per_round * settings.number_of_rounds) as usize);
    for round in 1..=settings.number_of_rounds {
        let reversed = settings.snake_format && round % 2 == 0;
        for p in 1..=per_round {
            let idx = if reversed { per_round - p } else { p - 1 };
            picks.push(PickSlot {
                overall: (round - 1) * per_round + p,
                round,
                pick_in_round: p,
                team_id: eligible[idx as usize].id.clone(),
                player: None,
                picked_at: None,
            });
        }
    }
    picks
}
