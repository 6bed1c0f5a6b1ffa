// Team slots: claims, draft positions, rosters.

use serde::{Deserialize, Serialize};

use crate::error::DraftError;
use crate::player::Player;

/// A player on a team's roster together with where they were taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player: Player,
    /// Overall pick number the player was taken at.
    pub pick_number: u32,
    pub round: u32,
}

/// A team slot in the draft.
///
/// Created at configuration time; `assignee` is set when a participant
/// claims the slot, `draft_position` when the randomizer runs. The roster
/// grows only through accepted picks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    /// Rank in the pick order, `None` until randomization.
    pub draft_position: Option<u32>,
    /// Participant who claimed this slot, if any.
    pub assignee: Option<String>,
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

impl Team {
    /// A fresh unclaimed slot with no draft position and an empty roster.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Team {
            id: id.into(),
            name: name.into(),
            draft_position: None,
            assignee: None,
            roster: Vec::new(),
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.assignee.is_some()
    }
}

/// Build `count` default-named team slots ("Team 1".."Team N").
pub fn default_teams(count: usize) -> Vec<Team> {
    (1..=count)
        .map(|i| Team::new(format!("t{i}"), format!("Team {i}")))
        .collect()
}

/// Build team slots with explicit display names, one per name, keeping
/// the `t1..tN` id scheme.
pub fn named_teams(names: &[String]) -> Vec<Team> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Team::new(format!("t{}", i + 1), name.clone()))
        .collect()
}

/// Claim a team slot for a participant.
///
/// Re-claiming a slot you already hold is a no-op; claiming someone
/// else's slot is rejected.
pub fn claim_team(
    teams: &mut [Team],
    participant_id: &str,
    team_id: &str,
) -> Result<(), DraftError> {
    let team = teams
        .iter_mut()
        .find(|t| t.id == team_id)
        .ok_or_else(|| DraftError::UnknownTeam {
            team_id: team_id.to_string(),
        })?;

    match team.assignee.as_deref() {
        Some(current) if current == participant_id => Ok(()),
        Some(current) => Err(DraftError::TeamAlreadyClaimed {
            team_name: team.name.clone(),
            assignee: current.to_string(),
        }),
        None => {
            team.assignee = Some(participant_id.to_string());
            Ok(())
        }
    }
}

/// Release a participant's claim on a team slot, if they hold one.
/// Returns whether a claim was released.
pub fn release_team(teams: &mut [Team], participant_id: &str) -> bool {
    for team in teams.iter_mut() {
        if team.assignee.as_deref() == Some(participant_id) {
            team.assignee = None;
            return true;
        }
    }
    false
}
