pub mod config;
pub mod error;
pub mod utils;

pub use config::{config_path, generate_default_config, BulkMutation, Config, JournalMode, IN_MEMORY};
pub use error::{ConfigError, Result};
