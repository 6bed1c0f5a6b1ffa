// SQLite persistence for the draft aggregate.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::info;

use draftboard_core::player::Player;
use draftboard_core::state::{AppliedPick, DraftState, DraftStatus};
use draftboard_core::team::{RosterEntry, Team};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The conditional pick write found the slot already filled. The
    /// caller should re-read the snapshot and retry or report the loss.
    #[error("pick {overall} was already filled by another writer")]
    Conflict { overall: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Durable home for the draft aggregate.
///
/// Deliberately synchronous; SQLite calls are short and the service holds
/// its own async lock above this layer.
pub trait DraftStore: Send + Sync {
    /// Replace the persisted aggregate wholesale.
    fn save_snapshot(&self, state: &DraftState) -> Result<(), StoreError>;

    /// Load the persisted aggregate, or `None` if nothing was ever saved.
    fn load_snapshot(&self) -> Result<Option<DraftState>, StoreError>;

    /// Commit one pick: fill the slot conditionally and persist the
    /// advanced cursor/status in the same transaction, so a crash can
    /// never leave the cursor behind the filled picks. The slot write only
    /// lands if the slot is still empty; exactly one writer wins and
    /// everyone else gets [`StoreError::Conflict`]. `state` is the
    /// post-pick aggregate.
    fn fill_pick(&self, state: &DraftState, applied: &AppliedPick) -> Result<(), StoreError>;

    /// Persist the cheap progress fields (cursor, status, countdown base)
    /// for transitions that touch nothing else (pause, resume).
    fn save_progress(&self, state: &DraftState) -> Result<(), StoreError>;
}

/// SQLite-backed store. Pass `":memory:"` for an ephemeral database in
/// tests.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS teams (
                id             TEXT PRIMARY KEY,
                name           TEXT NOT NULL,
                draft_position INTEGER,
                assignee       TEXT,
                seq            INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS players (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                position    TEXT NOT NULL,
                club        TEXT NOT NULL,
                overall     INTEGER NOT NULL,
                height      TEXT,
                weight      TEXT,
                skill_moves INTEGER,
                stats       TEXT NOT NULL,
                available   INTEGER NOT NULL DEFAULT 1,
                seq         INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS picks (
                overall       INTEGER PRIMARY KEY,
                round         INTEGER NOT NULL,
                pick_in_round INTEGER NOT NULL,
                team_id       TEXT NOT NULL REFERENCES teams(id),
                player_id     TEXT REFERENCES players(id),
                picked_at     TEXT
            );

            CREATE TABLE IF NOT EXISTS draft_meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        info!(path, "opened draft store");
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

fn put_meta(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO draft_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .with_context(|| format!("failed to write meta key {key}"))?;
    Ok(())
}

fn get_meta(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM draft_meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("failed to read meta key {key}"))
}

fn write_progress(conn: &Connection, state: &DraftState) -> anyhow::Result<()> {
    put_meta(conn, "cursor", &state.cursor.to_string())?;
    put_meta(
        conn,
        "status",
        &serde_json::to_string(&state.status).context("failed to serialize status")?,
    )?;
    match state.pick_started_at {
        Some(ts) => put_meta(conn, "pick_started_at", &ts.to_rfc3339())?,
        None => {
            conn.execute(
                "DELETE FROM draft_meta WHERE key = 'pick_started_at'",
                [],
            )
            .context("failed to clear pick_started_at")?;
        }
    }
    Ok(())
}

fn row_to_player(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Player, bool)> {
    let stats_json: String = row.get("stats")?;
    let stats = serde_json::from_str(&stats_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;
    let available: i64 = row.get("available")?;
    Ok((
        Player {
            id: row.get("id")?,
            name: row.get("name")?,
            position: row.get("position")?,
            club: row.get("club")?,
            overall: row.get("overall")?,
            height: row.get("height")?,
            weight: row.get("weight")?,
            skill_moves: row.get("skill_moves")?,
            stats,
        },
        available != 0,
    ))
}

impl DraftStore for SqliteStore {
    fn save_snapshot(&self, state: &DraftState) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;

        tx.execute("DELETE FROM picks", [])
            .context("failed to clear picks")?;
        tx.execute("DELETE FROM players", [])
            .context("failed to clear players")?;
        tx.execute("DELETE FROM teams", [])
            .context("failed to clear teams")?;

        for (seq, team) in state.teams.iter().enumerate() {
            tx.execute(
                "INSERT INTO teams (id, name, draft_position, assignee, seq)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![team.id, team.name, team.draft_position, team.assignee, seq as i64],
            )
            .with_context(|| format!("failed to save team {}", team.id))?;
        }

        let mut seq = 0i64;
        let mut save_player = |player: &Player, available: bool| -> anyhow::Result<()> {
            let stats = serde_json::to_string(&player.stats)
                .context("failed to serialize player stats")?;
            tx.execute(
                "INSERT INTO players
                 (id, name, position, club, overall, height, weight, skill_moves, stats, available, seq)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    player.id,
                    player.name,
                    player.position,
                    player.club,
                    player.overall,
                    player.height,
                    player.weight,
                    player.skill_moves,
                    stats,
                    available,
                    seq
                ],
            )
            .with_context(|| format!("failed to save player {}", player.id))?;
            seq += 1;
            Ok(())
        };
        for player in &state.available_players {
            save_player(player, true)?;
        }
        for team in &state.teams {
            for entry in &team.roster {
                save_player(&entry.player, false)?;
            }
        }

        for pick in &state.picks {
            tx.execute(
                "INSERT INTO picks (overall, round, pick_in_round, team_id, player_id, picked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    pick.overall,
                    pick.round,
                    pick.pick_in_round,
                    pick.team_id,
                    pick.player.as_ref().map(|p| p.id.clone()),
                    pick.picked_at.map(|ts| ts.to_rfc3339()),
                ],
            )
            .with_context(|| format!("failed to save pick {}", pick.overall))?;
        }

        put_meta(
            &tx,
            "settings",
            &serde_json::to_string(&state.settings).context("failed to serialize settings")?,
        )?;
        write_progress(&tx, state)?;

        tx.commit().context("failed to commit snapshot")?;
        Ok(())
    }

    fn load_snapshot(&self) -> Result<Option<DraftState>, StoreError> {
        let conn = self.conn();

        let Some(settings_json) = get_meta(&conn, "settings")? else {
            return Ok(None);
        };
        let settings =
            serde_json::from_str(&settings_json).context("failed to parse stored settings")?;

        let cursor: usize = get_meta(&conn, "cursor")?
            .unwrap_or_else(|| "0".to_string())
            .parse()
            .context("failed to parse stored cursor")?;
        let status: DraftStatus = match get_meta(&conn, "status")? {
            Some(json) => serde_json::from_str(&json).context("failed to parse stored status")?,
            None => DraftStatus::NotStarted,
        };
        let pick_started_at = match get_meta(&conn, "pick_started_at")? {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .context("failed to parse stored pick_started_at")?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        let mut teams: Vec<Team> = {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, draft_position, assignee FROM teams ORDER BY seq",
                )
                .context("failed to prepare teams query")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Team {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        draft_position: row.get(2)?,
                        assignee: row.get(3)?,
                        roster: Vec::new(),
                    })
                })
                .context("failed to query teams")?;
            rows.collect::<rusqlite::Result<_>>()
                .context("failed to read team rows")?
        };

        let all_players: Vec<(Player, bool)> = {
            let mut stmt = conn
                .prepare("SELECT * FROM players ORDER BY seq")
                .context("failed to prepare players query")?;
            let rows = stmt
                .query_map([], row_to_player)
                .context("failed to query players")?;
            rows.collect::<rusqlite::Result<_>>()
                .context("failed to read player rows")?
        };
        let available_players: Vec<Player> = all_players
            .iter()
            .filter(|(_, available)| *available)
            .map(|(p, _)| p.clone())
            .collect();
        let find_player = |id: &str| -> anyhow::Result<Player> {
            all_players
                .iter()
                .find(|(p, _)| p.id == id)
                .map(|(p, _)| p.clone())
                .ok_or_else(|| anyhow!("pick references unknown player {id}"))
        };

        let mut picks = Vec::new();
        {
            let mut stmt = conn
                .prepare(
                    "SELECT overall, round, pick_in_round, team_id, player_id, picked_at
                     FROM picks ORDER BY overall",
                )
                .context("failed to prepare picks query")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                })
                .context("failed to query picks")?;

            for row in rows {
                let (overall, round, pick_in_round, team_id, player_id, picked_at) =
                    row.context("failed to read pick row")?;
                let picked_at = match picked_at {
                    Some(raw) => Some(
                        DateTime::parse_from_rfc3339(&raw)
                            .context("failed to parse stored pick timestamp")?
                            .with_timezone(&Utc),
                    ),
                    None => None,
                };
                let player = match player_id {
                    Some(id) => {
                        let player = find_player(&id)?;
                        // Rebuild the roster from the filled picks.
                        if let Some(team) = teams.iter_mut().find(|t| t.id == team_id) {
                            team.roster.push(RosterEntry {
                                player: player.clone(),
                                pick_number: overall,
                                round,
                            });
                        }
                        Some(player)
                    }
                    None => None,
                };
                picks.push(draftboard_core::order::PickSlot {
                    overall,
                    round,
                    pick_in_round,
                    team_id,
                    player,
                    picked_at,
                });
            }
        }

        Ok(Some(DraftState {
            settings,
            teams,
            picks,
            available_players,
            cursor,
            status,
            pick_started_at,
        }))
    }

    fn fill_pick(&self, state: &DraftState, applied: &AppliedPick) -> Result<(), StoreError> {
        let overall = applied.overall;
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;

        // The guard: only an empty slot accepts the write.
        let updated = tx
            .execute(
                "UPDATE picks SET player_id = ?1, picked_at = ?2
                 WHERE overall = ?3 AND player_id IS NULL",
                params![applied.player_id, applied.picked_at.to_rfc3339(), overall],
            )
            .with_context(|| format!("failed to fill pick {overall}"))?;
        if updated != 1 {
            return Err(StoreError::Conflict { overall });
        }

        tx.execute(
            "UPDATE players SET available = 0 WHERE id = ?1",
            params![applied.player_id],
        )
        .with_context(|| format!("failed to mark player {} drafted", applied.player_id))?;

        // Cursor and status move in the same commit as the slot fill; a
        // restart must never see one without the other.
        write_progress(&tx, state)?;

        tx.commit().context("failed to commit pick")?;
        Ok(())
    }

    fn save_progress(&self, state: &DraftState) -> Result<(), StoreError> {
        let conn = self.conn();
        write_progress(&conn, state)?;
        Ok(())
    }
}
