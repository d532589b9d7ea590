use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const CONFIG_FILE: &str = "config.json";
pub const SQLITE_DB: &str = "promptvault.db";

/// Overrides the location of the `.promptvault` directory
pub const VAULT_DIR_ENV: &str = "PROMPTVAULT_DIR";
/// Overrides the SQLite database path
pub const DB_PATH_ENV: &str = "PROMPTVAULT_DB_PATH";

/// Where prompt data is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON documents in a key-value directory
    #[default]
    Document,
    /// Relational rows in a SQLite database
    Sqlite,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Document => write!(f, "document"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "document" | "json" => Ok(StorageBackend::Document),
            "sqlite" | "db" => Ok(StorageBackend::Sqlite),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

/// Per-vault settings stored in `.promptvault/config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VaultConfig {
    pub backend: StorageBackend,
    /// Folder assigned to new prompts when none is given
    pub default_folder_id: Option<String>,
    /// Show word counts in listings
    pub show_word_count: bool,
    /// Program (and arguments) used to optimize prompt text
    pub optimizer_command: Option<Vec<String>>,
}

impl VaultConfig {
    pub fn with_backend(backend: StorageBackend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Load the config from a vault directory. A missing file yields defaults.
    pub fn load(vault_dir: &Path) -> Result<Self> {
        let path = vault_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, vault_dir: &Path) -> Result<()> {
        fs::write(
            vault_dir.join(CONFIG_FILE),
            serde_json::to_string_pretty(self)?,
        )?;
        Ok(())
    }

    /// SQLite database location, honoring `PROMPTVAULT_DB_PATH`
    pub fn sqlite_path(&self, vault_dir: &Path) -> PathBuf {
        env::var_os(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| vault_dir.join(SQLITE_DB))
    }
}
