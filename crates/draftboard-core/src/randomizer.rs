// Draft-order randomization (Fisher-Yates over the claimed teams).

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::team::Team;

/// Randomize draft positions using the thread-local RNG.
///
/// Only claimed teams participate in the permutation and receive positions
/// `1..=k` in shuffle order. Unclaimed slots are appended after the
/// randomized group with their draft position cleared.
pub fn randomize_order(teams: &[Team]) -> Vec<Team> {
    randomize_order_with(teams, &mut rand::rng())
}

/// Randomize with an explicit RNG, for deterministic tests.
pub fn randomize_order_with<R: Rng + ?Sized>(teams: &[Team], rng: &mut R) -> Vec<Team> {
    let (mut claimed, unclaimed): (Vec<Team>, Vec<Team>) =
        teams.iter().cloned().partition(|t| t.is_claimed());

    claimed.shuffle(rng);
    for (idx, team) in claimed.iter_mut().enumerate() {
        team.draft_position = Some(idx as u32 + 1);
    }
    info!(eligible = claimed.len(), "randomized draft order");

    let mut result = claimed;
    result.extend(unclaimed.into_iter().map(|mut t| {
        t.draft_position = None;
        t
    }));
    result
}

/// Produce `steps` independent full reshuffles for an animated reveal.
///
/// Each element is a complete `randomize_order` run. Only the final
/// element is authoritative; everything before it is cosmetic and must
/// never be persisted or broadcast as committed state.
pub fn reveal_sequence(teams: &[Team], steps: usize) -> Vec<Vec<Team>> {
    let mut rng = rand::rng();
    (0..steps.max(1))
        .map(|_| randomize_order_with(teams, &mut rng))
        .collect()
}
