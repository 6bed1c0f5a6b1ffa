// CSV player import, layered on the core's record validation.

use std::io::Read;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use draftboard_core::error::DraftError;
use draftboard_core::import::{validate_records, ImportSummary, RawPlayerRecord};
use draftboard_core::player::Player;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The input itself could not be read as CSV at all.
    #[error("failed to read CSV input: {0}")]
    Csv(#[from] csv::Error),

    /// Validation rejected the whole batch (typically: nothing survived).
    #[error(transparent)]
    Draft(#[from] DraftError),
}

/// Parse players from CSV.
///
/// Headers are matched by name; goalkeeper rows use the goalkeeper stat
/// columns (elasticity, handling, reflexes, ...) and field rows the field
/// ones. Rows that fail to parse or validate are skipped with a log line,
/// matching the record-level policy of the core import. The result is an
/// error only when zero rows survive.
pub fn read_players<R: Read>(reader: R) -> Result<(Vec<Player>, ImportSummary), ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut records: Vec<RawPlayerRecord> = Vec::new();
    let mut parse_skipped = 0usize;
    for (row, result) in csv_reader.deserialize::<RawPlayerRecord>().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(row, %err, "skipping unparseable CSV row");
                parse_skipped += 1;
            }
        }
    }

    match validate_records(&records) {
        Ok((players, mut summary)) => {
            summary.skipped += parse_skipped;
            info!(
                imported = summary.imported,
                skipped = summary.skipped,
                "CSV import parsed"
            );
            Ok((players, summary))
        }
        Err(DraftError::EmptyImport { skipped }) => Err(DraftError::EmptyImport {
            skipped: skipped + parse_skipped,
        }
        .into()),
        Err(other) => Err(other.into()),
    }
}

/// Convenience wrapper reading from a file path.
pub fn read_players_from_path(path: &Path) -> Result<(Vec<Player>, ImportSummary), ImportError> {
    let file = std::fs::File::open(path).map_err(|e| csv::Error::from(e))?;
    read_players(file)
}
