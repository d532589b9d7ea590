//! Schema versions of persisted prompt records.
//!
//! Version 1 prompts lack `isPinned`, `folderId` and `versions`. Version 2 is
//! current. Which decoder runs is decided by the stored version marker alone;
//! record shape is never inspected to guess the version, so running the
//! upgrade on data already marked as version 2 is a no-op.
//!
//! Records decode into typed prompts. Every schema field carries over
//! unchanged, and keys outside the schema are dropped.

use serde_json::Value;
use tracing::debug;

use crate::entity::{LegacyPrompt, Prompt};
use crate::error::ImportError;

pub const LEGACY_SCHEMA_VERSION: u32 = 1;
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Outcome of decoding a stored prompt collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migrated {
    pub prompts: Vec<Prompt>,
    /// True when records were upgraded from an older schema
    pub upgraded: bool,
}

/// Whether data written under `stored_version` must be upgraded
pub fn needs_migration(stored_version: u32) -> bool {
    stored_version < CURRENT_SCHEMA_VERSION
}

/// Decode `records` written under `stored_version` into current prompts.
pub fn migrate_prompts(
    stored_version: u32,
    records: Vec<Value>,
) -> std::result::Result<Migrated, ImportError> {
    if stored_version > CURRENT_SCHEMA_VERSION {
        return Err(ImportError::UnsupportedVersion(stored_version));
    }

    if !needs_migration(stored_version) {
        let prompts = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| decode_record::<Prompt>(i, record))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        return Ok(Migrated {
            prompts,
            upgraded: false,
        });
    }

    let prompts = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| decode_record::<LegacyPrompt>(i, record).map(Prompt::from))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(
        from = stored_version,
        to = CURRENT_SCHEMA_VERSION,
        count = prompts.len(),
        "upgraded prompt records"
    );

    Ok(Migrated {
        prompts,
        upgraded: true,
    })
}

fn decode_record<T: serde::de::DeserializeOwned>(
    index: usize,
    record: Value,
) -> std::result::Result<T, ImportError> {
    serde_json::from_value(record)
        .map_err(|e| ImportError::InvalidRecord(format!("prompt #{}: {}", index, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_records() -> Vec<Value> {
        vec![
            json!({"id":"1","title":"t","content":"c","tags":[],"isFavorite":false,"createdAt":1,"updatedAt":1}),
            json!({"id":"2","title":"Email","content":"Dear {{name}}","tags":["mail"],"isFavorite":true,"createdAt":5,"updatedAt":9}),
        ]
    }

    #[test]
    fn test_legacy_records_are_upgraded() {
        let migrated = migrate_prompts(LEGACY_SCHEMA_VERSION, legacy_records()).unwrap();

        assert!(migrated.upgraded);
        assert_eq!(migrated.prompts.len(), 2);
        for prompt in &migrated.prompts {
            assert!(!prompt.is_pinned);
            assert!(prompt.folder_id.is_none());
            assert!(prompt.versions.is_empty());
        }

        let email = &migrated.prompts[1];
        assert_eq!(email.id, "2");
        assert_eq!(email.title, "Email");
        assert_eq!(email.content, "Dear {{name}}");
        assert_eq!(email.tags, vec!["mail"]);
        assert!(email.is_favorite);
        assert_eq!(email.created_at, 5);
        assert_eq!(email.updated_at, 9);
    }

    #[test]
    fn test_migration_is_idempotent() {
        let once = migrate_prompts(LEGACY_SCHEMA_VERSION, legacy_records()).unwrap();

        let stored: Vec<Value> = once
            .prompts
            .iter()
            .map(|p| serde_json::to_value(p).unwrap())
            .collect();
        let twice = migrate_prompts(CURRENT_SCHEMA_VERSION, stored).unwrap();

        assert!(!twice.upgraded);
        assert_eq!(once.prompts, twice.prompts);
    }

    #[test]
    fn test_current_version_is_not_reshaped() {
        let record = json!({
            "id": "p", "title": "t", "content": "c", "tags": [],
            "isFavorite": false, "isPinned": true, "folderId": "f",
            "createdAt": 1, "updatedAt": 2,
            "versions": [{"id": "v", "title": "t", "content": "old", "savedAt": 2}]
        });

        let migrated = migrate_prompts(CURRENT_SCHEMA_VERSION, vec![record]).unwrap();
        let prompt = &migrated.prompts[0];
        assert!(prompt.is_pinned);
        assert_eq!(prompt.folder_id.as_deref(), Some("f"));
        assert_eq!(prompt.versions.len(), 1);
    }

    #[test]
    fn test_upgrade_keeps_schema_fields_and_drops_unknown_keys() {
        let record = json!({
            "id": "1700000000000", "title": "Legacy", "content": "Hi {{who}}",
            "tags": ["a", "b"], "isFavorite": true, "createdAt": 3, "updatedAt": 4,
            "color": "red"
        });

        let migrated = migrate_prompts(LEGACY_SCHEMA_VERSION, vec![record]).unwrap();
        let stored = serde_json::to_value(&migrated.prompts[0]).unwrap();

        assert_eq!(stored["id"], "1700000000000");
        assert_eq!(stored["title"], "Legacy");
        assert_eq!(stored["content"], "Hi {{who}}");
        assert_eq!(stored["tags"], json!(["a", "b"]));
        assert_eq!(stored["isFavorite"], true);
        assert_eq!(stored["createdAt"], 3);
        assert_eq!(stored["updatedAt"], 4);
        assert_eq!(stored["isPinned"], false);
        assert!(stored.get("color").is_none());
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = migrate_prompts(3, vec![]).unwrap_err();
        assert_eq!(err, ImportError::UnsupportedVersion(3));
    }

    #[test]
    fn test_invalid_record_reported() {
        let err = migrate_prompts(LEGACY_SCHEMA_VERSION, vec![json!({"title": 3})]).unwrap_err();
        assert!(matches!(err, ImportError::InvalidRecord(_)));
    }

    #[test]
    fn test_needs_migration() {
        assert!(needs_migration(0));
        assert!(needs_migration(1));
        assert!(!needs_migration(2));
    }
}
