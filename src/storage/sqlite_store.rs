use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::entity::{Folder, Prompt};
use crate::error::{Result, VaultError};
use crate::migration::{needs_migration, CURRENT_SCHEMA_VERSION};
use crate::vault::{Vault, VaultStats};

use super::PromptStorage;

/// Relational backing store: one row per prompt and per folder, with tags and
/// version history as JSON-encoded columns
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

/// Raw prompt row before JSON columns are decoded
struct PromptRow {
    id: String,
    title: String,
    content: String,
    tags: String,
    is_favorite: bool,
    is_pinned: bool,
    folder_id: Option<String>,
    created_at: i64,
    updated_at: i64,
    versions: String,
}

impl PromptRow {
    fn into_prompt(self) -> Result<Prompt> {
        Ok(Prompt {
            id: self.id,
            title: self.title,
            content: self.content,
            tags: serde_json::from_str(&self.tags)?,
            is_favorite: self.is_favorite,
            is_pinned: self.is_pinned,
            folder_id: self.folder_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            versions: serde_json::from_str(&self.versions)?,
        })
    }
}

impl SqliteStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;

        let store = Self {
            conn,
            path: path.to_path_buf(),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS folders (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                icon TEXT NOT NULL DEFAULT '📁',
                color TEXT NOT NULL DEFAULT '#3B82F6',
                createdAt INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS prompts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL DEFAULT 'New Prompt',
                content TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '[]',
                isFavorite INTEGER NOT NULL DEFAULT 0,
                isPinned INTEGER NOT NULL DEFAULT 0,
                folderId TEXT,
                createdAt INTEGER NOT NULL,
                updatedAt INTEGER NOT NULL,
                versions TEXT NOT NULL DEFAULT '[]',
                FOREIGN KEY (folderId) REFERENCES folders(id) ON DELETE SET NULL
            )",
            [],
        )?;

        self.conn.execute_batch(
            "
            CREATE INDEX IF NOT EXISTS idx_prompts_folderId ON prompts(folderId);
            CREATE INDEX IF NOT EXISTS idx_prompts_isPinned ON prompts(isPinned);
            CREATE INDEX IF NOT EXISTS idx_prompts_isFavorite ON prompts(isFavorite);
            CREATE INDEX IF NOT EXISTS idx_prompts_updatedAt ON prompts(updatedAt);
            ",
        )?;

        if self.schema_version()?.is_none() {
            self.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        }

        Ok(())
    }

    /// Get the stored schema version
    pub fn schema_version(&self) -> Result<Option<u32>> {
        let result: Option<u32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(result)
    }

    /// Set the stored schema version
    pub fn set_schema_version(&self, version: u32) -> Result<()> {
        self.conn.execute("DELETE FROM schema_version", [])?;
        self.conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
        Ok(())
    }

    /// All prompts in collection order
    pub fn list_prompts(&self) -> Result<Vec<Prompt>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, tags, isFavorite, isPinned, folderId,
                    createdAt, updatedAt, versions
             FROM prompts ORDER BY rowid",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(PromptRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                    tags: row.get(3)?,
                    is_favorite: row.get(4)?,
                    is_pinned: row.get(5)?,
                    folder_id: row.get(6)?,
                    created_at: row.get(7)?,
                    updated_at: row.get(8)?,
                    versions: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(PromptRow::into_prompt).collect()
    }

    /// All folders in collection order
    pub fn list_folders(&self) -> Result<Vec<Folder>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, icon, color, createdAt FROM folders ORDER BY rowid")?;

        let folders = stmt
            .query_map([], |row| {
                Ok(Folder {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    icon: row.get(2)?,
                    color: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(folders)
    }

    pub fn get_prompt(&self, id: &str) -> Result<Option<Prompt>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, content, tags, isFavorite, isPinned, folderId,
                        createdAt, updatedAt, versions
                 FROM prompts WHERE id = ?1",
                [id],
                |row| {
                    Ok(PromptRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        content: row.get(2)?,
                        tags: row.get(3)?,
                        is_favorite: row.get(4)?,
                        is_pinned: row.get(5)?,
                        folder_id: row.get(6)?,
                        created_at: row.get(7)?,
                        updated_at: row.get(8)?,
                        versions: row.get(9)?,
                    })
                },
            )
            .optional()?;
        row.map(PromptRow::into_prompt).transpose()
    }

    fn insert_folder(&self, folder: &Folder) -> Result<()> {
        self.conn.execute(
            "INSERT INTO folders (id, name, icon, color, createdAt)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                folder.id,
                folder.name,
                folder.icon,
                folder.color,
                folder.created_at
            ],
        )?;
        Ok(())
    }

    fn insert_prompt(&self, prompt: &Prompt) -> Result<()> {
        self.conn.execute(
            "INSERT INTO prompts
             (id, title, content, tags, isFavorite, isPinned, folderId, createdAt, updatedAt, versions)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                prompt.id,
                prompt.title,
                prompt.content,
                serde_json::to_string(&prompt.tags)?,
                prompt.is_favorite,
                prompt.is_pinned,
                prompt.folder_id,
                prompt.created_at,
                prompt.updated_at,
                serde_json::to_string(&prompt.versions)?,
            ],
        )?;
        Ok(())
    }

    pub fn stats(&self) -> Result<VaultStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(VaultStats {
            prompts: count("SELECT COUNT(*) FROM prompts")?,
            folders: count("SELECT COUNT(*) FROM folders")?,
            favorites: count("SELECT COUNT(*) FROM prompts WHERE isFavorite = 1")?,
            pinned: count("SELECT COUNT(*) FROM prompts WHERE isPinned = 1")?,
        })
    }
}

impl PromptStorage for SqliteStore {
    fn load(&self) -> Result<Vault> {
        let version = self.schema_version()?.unwrap_or(CURRENT_SCHEMA_VERSION);
        if version > CURRENT_SCHEMA_VERSION {
            return Err(VaultError::Storage(format!(
                "database uses schema version {} but this build supports up to {}",
                version, CURRENT_SCHEMA_VERSION
            )));
        }

        let folders = self.list_folders()?;
        let prompts = match self.list_prompts() {
            Ok(prompts) => prompts,
            Err(VaultError::Json(e)) => {
                warn!(error = %e, "corrupted JSON column, treating storage as empty");
                return Ok(Vault::new());
            }
            Err(e) => return Err(e),
        };

        // The relational columns already carry every version 2 field
        if needs_migration(version) {
            self.set_schema_version(CURRENT_SCHEMA_VERSION)?;
            info!(from = version, to = CURRENT_SCHEMA_VERSION, "updated schema version marker");
        }

        Ok(Vault::from_parts(prompts, folders))
    }

    /// Replace every row in a single transaction
    fn save(&self, vault: &Vault) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute("DELETE FROM prompts", [])?;
        tx.execute("DELETE FROM folders", [])?;

        // Folders first for the foreign key
        for folder in vault.folders() {
            self.insert_folder(folder)?;
        }
        for prompt in vault.prompts() {
            self.insert_prompt(prompt)?;
        }

        tx.commit()?;
        debug!(
            prompts = vault.prompts().len(),
            folders = vault.folders().len(),
            "saved sqlite store"
        );
        Ok(())
    }
}

// Implement From for rusqlite::Error
impl From<rusqlite::Error> for VaultError {
    fn from(e: rusqlite::Error) -> Self {
        VaultError::Storage(format!("SQLite error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{NewPrompt, PromptUpdate};
    use tempfile::TempDir;

    fn sample_vault() -> Vault {
        let mut vault = Vault::new();
        let folder = vault.create_folder("Work").unwrap();
        let prompt = vault
            .create_prompt(NewPrompt {
                title: "Standup".to_string(),
                content: "Yesterday I {{did}}".to_string(),
                tags: vec!["daily".to_string(), "team".to_string()],
                folder_id: Some(folder.id),
            })
            .unwrap();
        vault
            .update_prompt(
                &prompt.id,
                PromptUpdate {
                    content: Some("Yesterday I {{did}}, today I {{will}}".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        vault.toggle_pin(&prompt.id).unwrap();
        vault
    }

    #[test]
    fn test_open_creates_db() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data/promptvault.db");
        let store = SqliteStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_schema_version_tracking() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), Some(CURRENT_SCHEMA_VERSION));

        store.set_schema_version(1).unwrap();
        assert_eq!(store.schema_version().unwrap(), Some(1));

        store.load().unwrap();
        assert_eq!(store.schema_version().unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let vault = sample_vault();

        store.save(&vault).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.folders(), vault.folders());
        assert_eq!(loaded.prompts().len(), 1);
        let prompt = &loaded.prompts()[0];
        assert_eq!(prompt, &vault.prompts()[0]);
        assert_eq!(prompt.tags, vec!["daily", "team"]);
        assert_eq!(prompt.versions.len(), 1);
        assert!(prompt.is_pinned);
    }

    #[test]
    fn test_load_keeps_collection_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut vault = sample_vault();
        vault.create_default_prompt(None).unwrap();
        store.save(&vault).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.prompts()[0].title, "New Prompt");
        assert_eq!(loaded, vault);
    }

    #[test]
    fn test_save_is_full_replacement() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut vault = sample_vault();
        store.save(&vault).unwrap();

        let id = vault.prompts()[0].id.clone();
        vault.delete_prompt(&id).unwrap();
        store.save(&vault).unwrap();

        assert!(store.load().unwrap().prompts().is_empty());
        assert!(store.get_prompt(&id).unwrap().is_none());
    }

    #[test]
    fn test_folder_delete_sets_null() {
        let store = SqliteStore::open_in_memory().unwrap();
        let vault = sample_vault();
        store.save(&vault).unwrap();

        let folder_id = vault.folders()[0].id.clone();
        store
            .conn
            .execute("DELETE FROM folders WHERE id = ?1", [&folder_id])
            .unwrap();

        let prompt = store.get_prompt(&vault.prompts()[0].id).unwrap().unwrap();
        assert!(prompt.folder_id.is_none());
    }

    #[test]
    fn test_corrupted_json_column_loads_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save(&sample_vault()).unwrap();
        store
            .conn
            .execute("UPDATE prompts SET tags = 'not json'", [])
            .unwrap();

        let vault = store.load().unwrap();
        assert!(vault.prompts().is_empty());
    }

    #[test]
    fn test_stats() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save(&sample_vault()).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.prompts, 1);
        assert_eq!(stats.folders, 1);
        assert_eq!(stats.pinned, 1);
        assert_eq!(stats.favorites, 0);
    }
}
