// Pool filtering and sorting helpers for board views.

use serde::{Deserialize, Serialize};

use crate::player::Player;

/// Optional criteria, AND-composed. Name matching is case-insensitive
/// substring; position and club are exact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFilter {
    pub name: Option<String>,
    pub position: Option<String>,
    pub club: Option<String>,
}

impl PlayerFilter {
    pub fn matches(&self, player: &Player) -> bool {
        if let Some(needle) = &self.name {
            if !player
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if let Some(position) = &self.position {
            if &player.position != position {
                return false;
            }
        }
        if let Some(club) = &self.club {
            if &player.club != club {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Position,
    Overall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Filter then sort a view of the pool. The sort is stable, so equal keys
/// keep their pool order. The pool itself is never reordered; callers get
/// references for presentation.
pub fn filter_and_sort<'a>(
    players: &'a [Player],
    filter: &PlayerFilter,
    key: SortKey,
    direction: SortDirection,
) -> Vec<&'a Player> {
    let mut view: Vec<&Player> = players.iter().filter(|p| filter.matches(p)).collect();
    view.sort_by(|a, b| {
        let ord = match key {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Position => a.position.cmp(&b.position),
            SortKey::Overall => a.overall.cmp(&b.overall),
        };
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    view
}

/// Distinct position codes present in the pool, sorted.
pub fn unique_positions(players: &[Player]) -> Vec<String> {
    let mut out: Vec<String> = players.iter().map(|p| p.position.clone()).collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// Distinct clubs present in the pool, sorted.
pub fn unique_clubs(players: &[Player]) -> Vec<String> {
    let mut out: Vec<String> = players.iter().map(|p| p.club.clone()).collect();
    out.sort_unstable();
    out.dedup();
    out
}
