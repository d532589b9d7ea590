//! Persistence for the vault.
//!
//! The core only talks to [`PromptStorage`]; which backend sits behind it is
//! chosen by the vault's config.

mod document_store;
pub mod kv;
mod sqlite_store;
mod transfer;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{StorageBackend, VaultConfig};
use crate::error::{Result, VaultError};
use crate::vault::Vault;

pub use document_store::{DocumentStore, FOLDERS_KEY, PROMPTS_KEY, SCHEMA_VERSION_KEY};
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use sqlite_store::SqliteStore;
pub use transfer::{export_document, export_json, import_document, ExportDocument, ImportedData};

pub const VAULT_DIR: &str = ".promptvault";
const DOCUMENT_DIR: &str = "store";

/// Load/save port for the whole vault.
///
/// `load` runs schema migration before returning and treats undecodable data
/// as an empty vault. `save` replaces everything that was stored.
pub trait PromptStorage {
    fn load(&self) -> Result<Vault>;
    fn save(&self, vault: &Vault) -> Result<()>;
}

/// An initialized `.promptvault` directory and its config
pub struct Workspace {
    dir: PathBuf,
    config: VaultConfig,
}

impl Workspace {
    /// Initialize a new vault directory
    pub fn init(dir: &Path, backend: StorageBackend) -> Result<Self> {
        if dir.join(crate::config::CONFIG_FILE).exists() {
            return Err(VaultError::AlreadyInitialized);
        }

        fs::create_dir_all(dir)?;
        let config = VaultConfig::with_backend(backend);
        config.save(dir)?;

        let workspace = Self {
            dir: dir.to_path_buf(),
            config,
        };
        workspace.storage()?.save(&Vault::new())?;
        debug!(dir = %dir.display(), %backend, "initialized vault");

        Ok(workspace)
    }

    /// Open an existing vault directory
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.join(crate::config::CONFIG_FILE).exists() {
            return Err(VaultError::NotInitialized);
        }
        let config = VaultConfig::load(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            config,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut VaultConfig {
        &mut self.config
    }

    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.dir)
    }

    /// Open the configured storage backend
    pub fn storage(&self) -> Result<Box<dyn PromptStorage>> {
        Ok(match self.config.backend {
            StorageBackend::Document => Box::new(DocumentStore::new(FileKeyValueStore::open(
                &self.dir.join(DOCUMENT_DIR),
            )?)),
            StorageBackend::Sqlite => {
                Box::new(SqliteStore::open(&self.config.sqlite_path(&self.dir))?)
            }
        })
    }
}
