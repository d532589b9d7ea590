// src/storage/transfer.rs
//! Export and import of whole vaults as JSON documents.
//!
//! Two import shapes are accepted: the legacy bare array of prompts (schema
//! version 1, no folders) and the versioned document
//! `{version, exportedAt, prompts, folders}` written by `export_document`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{now_millis, Folder, Prompt};
use crate::error::ImportError;
use crate::migration::{migrate_prompts, CURRENT_SCHEMA_VERSION, LEGACY_SCHEMA_VERSION};
use crate::vault::Vault;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    pub exported_at: i64,
    pub prompts: Vec<Prompt>,
    pub folders: Vec<Folder>,
}

/// Records recovered from an import document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedData {
    pub prompts: Vec<Prompt>,
    pub folders: Vec<Folder>,
    /// Schema version the document was written with
    pub source_version: u32,
}

pub fn export_document(vault: &Vault) -> ExportDocument {
    ExportDocument {
        version: CURRENT_SCHEMA_VERSION,
        exported_at: now_millis(),
        prompts: vault.prompts().to_vec(),
        folders: vault.folders().to_vec(),
    }
}

/// Serialize the vault as a pretty-printed export document
pub fn export_json(vault: &Vault) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&export_document(vault))
}

/// Parse and migrate an import document.
///
/// Failures are returned as values; an empty prompt array is a successful
/// import of nothing.
pub fn import_document(json: &str) -> Result<ImportedData, ImportError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ImportError::MalformedJson(e.to_string()))?;

    match value {
        Value::Array(records) => {
            let migrated = migrate_prompts(LEGACY_SCHEMA_VERSION, records)?;
            Ok(ImportedData {
                prompts: migrated.prompts,
                folders: Vec::new(),
                source_version: LEGACY_SCHEMA_VERSION,
            })
        }
        Value::Object(mut doc) => {
            let records = match doc.remove("prompts") {
                Some(Value::Array(records)) => records,
                _ => return Err(ImportError::UnrecognizedShape),
            };

            let version = match doc.get("version") {
                None | Some(Value::Null) => LEGACY_SCHEMA_VERSION,
                Some(v) => v
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or(ImportError::UnrecognizedShape)?,
            };

            let folders = match doc.remove("folders") {
                None | Some(Value::Null) => Vec::new(),
                Some(raw) => serde_json::from_value(raw)
                    .map_err(|e| ImportError::InvalidRecord(format!("folders: {}", e)))?,
            };

            let migrated = migrate_prompts(version, records)?;
            Ok(ImportedData {
                prompts: migrated.prompts,
                folders,
                source_version: version,
            })
        }
        _ => Err(ImportError::UnrecognizedShape),
    }
}
