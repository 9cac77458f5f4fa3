use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{ConfigError, Result},
    utils::{resolve_path, xdg_config_home, xdg_data_home},
};

/// Special database path that opens a private in-memory store.
pub const IN_MEMORY: &str = ":memory:";

/// SQLite journal modes accepted in the configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    #[default]
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
            Self::Off => "OFF",
        }
    }
}

/// What to do when `updateMany`/`deleteMany` is called without a `where` condition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkMutation {
    /// Emit a diagnostic and mutate every row.
    #[default]
    Warn,
    /// Refuse the call; `updateAll`/`deleteAll` must be used instead.
    Deny,
}

/// Application's configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Path to the SQLite database file, or `:memory:`.
    /// Default: $XDG_DATA_HOME/tally/db/prod.db
    pub db_path: Option<String>,

    /// SQLite journal mode applied when a file database is opened.
    /// Default: wal
    pub journal_mode: Option<JournalMode>,

    /// Policy for bulk mutations without a `where` condition.
    /// Default: warn
    pub bulk_mutation: Option<BulkMutation>,
}

/// Location of the configuration file.
///
/// `TALLY_CONFIG` wins, otherwise `$XDG_CONFIG_HOME/tally/config.toml`.
pub fn config_path() -> PathBuf {
    match std::env::var("TALLY_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_config_home().join("tally").join("config.toml"),
    }
}

impl Config {
    pub fn default_config() -> Self {
        let db_path = xdg_data_home().join("tally").join("db").join("prod.db");

        Self {
            db_path: Some(db_path.display().to_string()),
            journal_mode: Some(JournalMode::default()),
            bulk_mutation: Some(BulkMutation::default()),
        }
    }

    /// Loads the configuration from `path`.
    /// If the file is not found, the default configuration is used.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let mut config = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve();

        Ok(config)
    }

    pub fn resolve(&mut self) {
        if self.db_path.is_none() {
            self.db_path = Self::default_config().db_path;
        }
        self.journal_mode.get_or_insert_with(JournalMode::default);
        self.bulk_mutation.get_or_insert_with(BulkMutation::default);
    }

    /// Database location. `TALLY_DB` overrides the configured path.
    pub fn get_db_path(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("TALLY_DB") {
            return resolve_path(&env_path);
        }
        match &self.db_path {
            Some(path) if path == IN_MEMORY => Ok(PathBuf::from(IN_MEMORY)),
            Some(path) => resolve_path(path),
            None => Self::default_config()
                .db_path
                .as_deref()
                .map(resolve_path)
                .unwrap_or_else(|| Err(ConfigError::InvalidDbPath(String::new()))),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.get_db_path()
            .map(|path| path.as_os_str() == IN_MEMORY)
            .unwrap_or(false)
    }

    pub fn journal_mode(&self) -> JournalMode {
        self.journal_mode.unwrap_or_default()
    }

    pub fn bulk_mutation(&self) -> BulkMutation {
        self.bulk_mutation.unwrap_or_default()
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save_to(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let serialized = self.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serialized)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Writes the default configuration, refusing to overwrite an existing file.
pub fn generate_default_config(path: impl Into<PathBuf>) -> Result<PathBuf> {
    let path = path.into();

    if path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    Config::default_config().save_to(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert!(config
            .db_path
            .as_deref()
            .is_some_and(|path| path.ends_with("tally/db/prod.db")));
        assert_eq!(config.journal_mode(), JournalMode::Wal);
        assert_eq!(config.bulk_mutation(), BulkMutation::Warn);
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        std::env::remove_var("TALLY_DB");
        let dir = tempdir().unwrap();
        let config = Config::load_from(dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default_config());
    }

    #[test]
    fn test_load_partial_file_resolves_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "bulk_mutation = \"deny\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.bulk_mutation(), BulkMutation::Deny);
        assert_eq!(config.journal_mode(), JournalMode::Wal);
        assert!(config.db_path.is_some());
    }

    #[test]
    fn test_load_rejects_unknown_journal_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "journal_mode = \"fancy\"\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::TomlDeError(_))
        ));
    }

    #[test]
    #[serial]
    fn test_in_memory_path() {
        std::env::remove_var("TALLY_DB");
        let config = Config {
            db_path: Some(IN_MEMORY.to_string()),
            ..Config::default_config()
        };
        assert!(config.is_in_memory());
    }

    #[test]
    #[serial]
    fn test_db_path_env_override() {
        std::env::set_var("TALLY_DB", "/tmp/override.db");
        let config = Config::default_config();
        assert_eq!(
            config.get_db_path().unwrap(),
            PathBuf::from("/tmp/override.db")
        );
        std::env::remove_var("TALLY_DB");
    }

    #[test]
    #[serial]
    fn test_generate_default_config_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tally").join("config.toml");

        let written = generate_default_config(&path).unwrap();
        assert!(written.exists());
        let saved = Config::load_from(&written).unwrap();
        assert_eq!(saved, Config::default_config());

        assert!(matches!(
            generate_default_config(&path),
            Err(ConfigError::ConfigAlreadyExists)
        ));
    }

    #[test]
    fn test_journal_mode_pragma() {
        assert_eq!(JournalMode::Wal.as_pragma(), "WAL");
        assert_eq!(JournalMode::Off.as_pragma(), "OFF");
    }
}
