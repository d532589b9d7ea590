// src/storage/document_store.rs
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::entity::Folder;
use crate::error::{ImportError, Result, VaultError};
use crate::migration::{
    migrate_prompts, needs_migration, CURRENT_SCHEMA_VERSION, LEGACY_SCHEMA_VERSION,
};
use crate::vault::Vault;

use super::kv::KeyValueStore;
use super::PromptStorage;

pub const PROMPTS_KEY: &str = "promptvault_data_v1";
pub const FOLDERS_KEY: &str = "promptvault_folders";
pub const SCHEMA_VERSION_KEY: &str = "promptvault_schema_version";

/// Stores the vault as JSON documents under fixed keys of a key-value store.
///
/// A missing schema version key means the data was written by version 1.
pub struct DocumentStore<K: KeyValueStore> {
    kv: K,
}

impl<K: KeyValueStore> DocumentStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Stored schema version, `None` if the marker is unreadable
    fn stored_version(&self) -> Result<Option<u32>> {
        Ok(match self.kv.get(SCHEMA_VERSION_KEY)? {
            Some(raw) => raw.trim().parse::<u32>().ok(),
            None => Some(LEGACY_SCHEMA_VERSION),
        })
    }
}

impl<K: KeyValueStore> PromptStorage for DocumentStore<K> {
    fn load(&self) -> Result<Vault> {
        let Some(version) = self.stored_version()? else {
            warn!("unreadable schema version marker, treating storage as empty");
            return Ok(Vault::new());
        };

        let records: Vec<Value> = match self.kv.get(PROMPTS_KEY)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "corrupted prompt data, treating storage as empty");
                    return Ok(Vault::new());
                }
            },
            None => Vec::new(),
        };

        let migrated = match migrate_prompts(version, records) {
            Ok(migrated) => migrated,
            Err(ImportError::UnsupportedVersion(v)) => {
                return Err(VaultError::Storage(format!(
                    "stored data uses schema version {} but this build supports up to {}",
                    v, CURRENT_SCHEMA_VERSION
                )));
            }
            Err(e) => {
                warn!(error = %e, "undecodable prompt records, treating storage as empty");
                return Ok(Vault::new());
            }
        };

        let folders: Vec<Folder> = match self.kv.get(FOLDERS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "corrupted folder data, ignoring folders");
                Vec::new()
            }),
            None => Vec::new(),
        };

        // Unfiles prompts whose folder did not survive loading
        let mut vault = Vault::new();
        vault.replace_all(migrated.prompts, folders);

        if needs_migration(version) {
            self.save(&vault)?;
            info!(
                from = version,
                to = CURRENT_SCHEMA_VERSION,
                prompts = vault.prompts().len(),
                "migrated stored prompts"
            );
        }

        Ok(vault)
    }

    fn save(&self, vault: &Vault) -> Result<()> {
        self.kv
            .set(PROMPTS_KEY, &serde_json::to_string(vault.prompts())?)?;
        self.kv
            .set(FOLDERS_KEY, &serde_json::to_string(vault.folders())?)?;
        self.kv
            .set(SCHEMA_VERSION_KEY, &CURRENT_SCHEMA_VERSION.to_string())?;
        debug!(
            prompts = vault.prompts().len(),
            folders = vault.folders().len(),
            "saved document store"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryKeyValueStore;
    use crate::vault::NewPrompt;

    const LEGACY: &str = r#"[{"id":"1","title":"t","content":"c","tags":[],"isFavorite":false,"createdAt":1,"updatedAt":1}]"#;

    fn legacy_store() -> DocumentStore<MemoryKeyValueStore> {
        let kv = MemoryKeyValueStore::new();
        kv.set(PROMPTS_KEY, LEGACY).unwrap();
        DocumentStore::new(kv)
    }

    #[test]
    fn test_empty_store_loads_empty_vault() {
        let store = DocumentStore::new(MemoryKeyValueStore::new());
        let vault = store.load().unwrap();
        assert!(vault.prompts().is_empty());
        assert!(vault.folders().is_empty());
    }

    #[test]
    fn test_legacy_data_migrated_and_marker_written() {
        let store = legacy_store();

        let vault = store.load().unwrap();

        let prompt = &vault.prompts()[0];
        assert_eq!(prompt.id, "1");
        assert!(!prompt.is_pinned);
        assert!(prompt.folder_id.is_none());
        assert!(prompt.versions.is_empty());
        assert_eq!(
            store.kv().get(SCHEMA_VERSION_KEY).unwrap().as_deref(),
            Some("2")
        );

        let stored: Value =
            serde_json::from_str(&store.kv().get(PROMPTS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored[0]["isPinned"], Value::Bool(false));
        assert_eq!(stored[0]["folderId"], Value::Null);
    }

    #[test]
    fn test_reload_after_migration_is_stable() {
        let store = legacy_store();
        let first = store.load().unwrap();
        let second = store.load().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupted_data_loads_empty() {
        let kv = MemoryKeyValueStore::new();
        kv.set(PROMPTS_KEY, "{not json").unwrap();
        kv.set(SCHEMA_VERSION_KEY, "2").unwrap();
        let store = DocumentStore::new(kv);

        let vault = store.load().unwrap();
        assert!(vault.prompts().is_empty());
    }

    #[test]
    fn test_corrupted_folders_unfile_prompts() {
        let store = DocumentStore::new(MemoryKeyValueStore::new());
        let mut vault = Vault::new();
        let folder = vault.create_folder("Work").unwrap();
        let prompt = vault
            .create_prompt(NewPrompt {
                title: "Filed".to_string(),
                content: "c".to_string(),
                tags: vec![],
                folder_id: Some(folder.id),
            })
            .unwrap();
        store.save(&vault).unwrap();
        store.kv().set(FOLDERS_KEY, "{broken").unwrap();

        let loaded = store.load().unwrap();

        assert!(loaded.folders().is_empty());
        assert_eq!(loaded.prompts().len(), 1);
        assert!(loaded.get_prompt(&prompt.id).unwrap().folder_id.is_none());
    }

    #[test]
    fn test_newer_schema_is_an_error() {
        let kv = MemoryKeyValueStore::new();
        kv.set(PROMPTS_KEY, "[]").unwrap();
        kv.set(SCHEMA_VERSION_KEY, "7").unwrap();
        let store = DocumentStore::new(kv);

        assert!(matches!(store.load(), Err(VaultError::Storage(_))));
    }

    #[test]
    fn test_save_then_load() {
        let store = DocumentStore::new(MemoryKeyValueStore::new());
        let mut vault = Vault::new();
        let folder = vault.create_folder("Work").unwrap();
        vault
            .create_prompt(NewPrompt {
                title: "Email".to_string(),
                content: "Dear {{name}}".to_string(),
                tags: vec!["mail".to_string()],
                folder_id: Some(folder.id),
            })
            .unwrap();

        store.save(&vault).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, vault);
    }
}
