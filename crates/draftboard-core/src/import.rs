// Player import: raw records in, validated pool out.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::DraftError;
use crate::player::{FieldStats, GoalkeeperStats, Player, PlayerStats};

/// One row as it arrives from an external source (CSV, JSON). Everything
/// is optional here; validation decides what a usable record needs.
///
/// Goalkeepers and field players carry different stat columns, so the
/// record holds both sets and the position tag selects which six matter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlayerRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub position: Option<String>,
    pub club: Option<String>,
    pub overall: Option<u32>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub skill_moves: Option<u8>,

    // Field-player columns.
    pub pace: Option<u8>,
    pub shooting: Option<u8>,
    pub passing: Option<u8>,
    pub dribbling: Option<u8>,
    pub defense: Option<u8>,
    pub physical: Option<u8>,

    // Goalkeeper columns.
    pub elasticity: Option<u8>,
    pub handling: Option<u8>,
    pub reflexes: Option<u8>,
    pub speed: Option<u8>,
    pub positioning: Option<u8>,
}

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

fn required(field: Option<&String>) -> Option<&str> {
    field.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Validate one record into a `Player`, or say why it cannot be one.
fn convert(record: &RawPlayerRecord) -> Result<Player, String> {
    let id = required(record.id.as_ref()).ok_or("missing id")?;
    let name = required(record.name.as_ref()).ok_or("missing name")?;
    let position = required(record.position.as_ref()).ok_or("missing position")?;
    let club = required(record.club.as_ref()).ok_or("missing club")?;
    let overall = record.overall.ok_or("missing overall rating")?;

    let stats = if position == crate::player::GOALKEEPER_POSITION {
        PlayerStats::Goalkeeper(GoalkeeperStats {
            elasticity: record.elasticity.ok_or("goalkeeper missing elasticity")?,
            handling: record.handling.ok_or("goalkeeper missing handling")?,
            shooting: record.shooting.ok_or("goalkeeper missing shooting")?,
            reflexes: record.reflexes.ok_or("goalkeeper missing reflexes")?,
            speed: record.speed.ok_or("goalkeeper missing speed")?,
            positioning: record.positioning.ok_or("goalkeeper missing positioning")?,
        })
    } else {
        PlayerStats::Field(FieldStats {
            pace: record.pace.ok_or("field player missing pace")?,
            shooting: record.shooting.ok_or("field player missing shooting")?,
            passing: record.passing.ok_or("field player missing passing")?,
            dribbling: record.dribbling.ok_or("field player missing dribbling")?,
            defense: record.defense.ok_or("field player missing defense")?,
            physical: record.physical.ok_or("field player missing physical")?,
        })
    };

    Ok(Player {
        id: id.to_string(),
        name: name.to_string(),
        position: position.to_string(),
        club: club.to_string(),
        overall,
        height: record.height.clone().filter(|s| !s.trim().is_empty()),
        weight: record.weight.clone().filter(|s| !s.trim().is_empty()),
        skill_moves: record.skill_moves,
        stats,
    })
}

/// Validate a batch of raw records, skip-and-continue.
///
/// Bad records are logged and counted, never fatal on their own; the
/// import errors only when nothing at all survives. Duplicate ids within
/// the batch keep the first occurrence.
pub fn validate_records(
    records: &[RawPlayerRecord],
) -> Result<(Vec<Player>, ImportSummary), DraftError> {
    let mut players = Vec::with_capacity(records.len());
    let mut seen: HashSet<String> = HashSet::new();
    let mut skipped = 0usize;

    for (row, record) in records.iter().enumerate() {
        match convert(record) {
            Ok(player) => {
                if !seen.insert(player.id.clone()) {
                    warn!(row, id = %player.id, "skipping duplicate player id");
                    skipped += 1;
                    continue;
                }
                players.push(player);
            }
            Err(reason) => {
                warn!(row, reason, "skipping invalid player record");
                skipped += 1;
            }
        }
    }

    if players.is_empty() {
        return Err(DraftError::EmptyImport { skipped });
    }
    let summary = ImportSummary {
        imported: players.len(),
        skipped,
    };
    Ok((players, summary))
}
