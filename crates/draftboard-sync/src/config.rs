// Configuration loading and parsing (draftboard.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use draftboard_core::auth::AuthPolicy;
use draftboard_core::player::Player;
use draftboard_core::state::{DraftSettings, DraftState};
use draftboard_core::team::named_teams;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// draftboard.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire draftboard.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    draft: DraftSection,
    #[serde(default)]
    auth: AuthSection,
    database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
struct DraftSection {
    number_of_teams: u32,
    number_of_rounds: u32,
    seconds_per_pick: u32,
    snake_format: bool,
    /// Optional display names; when present, must cover every team slot.
    #[serde(default)]
    team_names: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AuthSection {
    admin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

/// The assembled runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: DraftSettings,
    pub team_names: Vec<String>,
    pub policy: AuthPolicy,
    pub db_path: String,
}

impl Config {
    /// A fresh aggregate built from this configuration: configured team
    /// names when present, default slot names otherwise.
    pub fn initial_state(&self, players: Vec<Player>) -> DraftState {
        let mut state = DraftState::new(self.settings.clone(), players);
        if !self.team_names.is_empty() {
            state.teams = named_teams(&self.team_names);
        }
        state
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/draftboard.toml` relative
/// to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy
/// defaults. Prefer `load_config()` which handles default initialization
/// automatically.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("draftboard.toml");
    let text = read_file(&path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        settings: DraftSettings {
            number_of_teams: file.draft.number_of_teams,
            number_of_rounds: file.draft.number_of_rounds,
            seconds_per_pick: file.draft.seconds_per_pick,
            snake_format: file.draft.snake_format,
        },
        team_names: file.draft.team_names,
        policy: AuthPolicy {
            admin: file.auth.admin,
        },
        db_path: file.database.path,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure the config file exists by copying it from `defaults/` when
/// missing. Returns the list of files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // Already customized, leave it alone.
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working
/// directory, copying defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.settings.number_of_teams < 2 {
        return Err(ConfigError::ValidationError {
            field: "draft.number_of_teams".into(),
            message: format!(
                "a draft needs at least 2 teams, got {}",
                config.settings.number_of_teams
            ),
        });
    }

    if config.settings.number_of_rounds == 0 {
        return Err(ConfigError::ValidationError {
            field: "draft.number_of_rounds".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.settings.seconds_per_pick == 0 {
        return Err(ConfigError::ValidationError {
            field: "draft.seconds_per_pick".into(),
            message: "must be greater than 0".into(),
        });
    }

    if !config.team_names.is_empty()
        && config.team_names.len() != config.settings.number_of_teams as usize
    {
        return Err(ConfigError::ValidationError {
            field: "draft.team_names".into(),
            message: format!(
                "expected {} names to cover every team slot, got {}",
                config.settings.number_of_teams,
                config.team_names.len()
            ),
        });
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
