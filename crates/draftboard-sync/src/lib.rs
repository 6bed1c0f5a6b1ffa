// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod config;
pub mod csv_import;
pub mod events;
pub mod service;
pub mod store;

pub use config::{load_config, Config, ConfigError};
pub use csv_import::{read_players, read_players_from_path, ImportError};
pub use events::{BroadcastNotifier, ChangeNotifier, DraftEvent, NullNotifier};
pub use service::{DraftService, ServiceError};
pub use store::{DraftStore, SqliteStore, StoreError};
