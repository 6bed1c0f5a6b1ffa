// Player records and the position-keyed stats bundle.

use serde::{Deserialize, Serialize};

/// The position code reserved for goalkeepers. Every other code
/// ("ST", "RW", "CB", ...) is treated as a field position.
pub const GOALKEEPER_POSITION: &str = "GK";

/// Rating bundle for a goalkeeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalkeeperStats {
    pub elasticity: u8,
    pub handling: u8,
    pub shooting: u8,
    pub reflexes: u8,
    pub speed: u8,
    pub positioning: u8,
}

/// Rating bundle for a field player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStats {
    pub pace: u8,
    pub shooting: u8,
    pub passing: u8,
    pub dribbling: u8,
    pub defense: u8,
    pub physical: u8,
}

/// Stats discriminated by the player's position: exactly one shape for
/// goalkeepers and one for everyone else, never a loose bag of optionals.
///
/// Serialized untagged so the JSON shape is just the six rating fields;
/// the two bundles share only `shooting`, so deserialization is
/// unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerStats {
    Goalkeeper(GoalkeeperStats),
    Field(FieldStats),
}

impl PlayerStats {
    /// Whether this bundle is the goalkeeper shape.
    pub fn is_goalkeeper_bundle(&self) -> bool {
        matches!(self, PlayerStats::Goalkeeper(_))
    }
}

/// A draftable player.
///
/// A player lives in exactly one place at a time: the available pool, or
/// one team's roster (attached to the pick that moved them there).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique, stable identifier.
    pub id: String,
    pub name: String,
    /// Position code from the closed-ish vocabulary ("GK", "ST", "RW", ...).
    pub position: String,
    /// Club of origin (e.g. "Real Madrid"), used for filtering.
    pub club: String,
    /// Overall rating.
    pub overall: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_moves: Option<u8>,
    pub stats: PlayerStats,
}

impl Player {
    /// Whether this player is a goalkeeper (position code `GK`).
    pub fn is_goalkeeper(&self) -> bool {
        self.position == GOALKEEPER_POSITION
    }

    /// Whether the stats bundle shape matches the position tag.
    /// A `GK` player must carry goalkeeper stats and vice versa.
    pub fn stats_match_position(&self) -> bool {
        self.is_goalkeeper() == self.stats.is_goalkeeper_bundle()
    }
}
