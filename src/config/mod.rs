//! Persisted settings stored as TOML in the app root.

mod errors;
mod io;
mod types;

pub use errors::ConfigError;
pub use io::{CONFIG_FILE_NAME, config_path, load_from_path, load_or_default, save, save_to_path};
pub use types::{AppSettings, MAX_EPOCHS, MIN_EPOCHS, TrainingSettings};
