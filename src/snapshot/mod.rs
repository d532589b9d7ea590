// src/snapshot/mod.rs
//! Snapshot generation module
//!
//! Writes a human-readable markdown copy of the vault: one file per prompt
//! with YAML frontmatter, grouped by folder, plus a README index.

mod prompt;
mod readme;
pub mod utils;

use std::path::Path;

use chrono::Utc;

use crate::vault::Vault;
use crate::Result;

pub use self::utils::{format_date, format_timestamp, short_id, slugify, SNAPSHOT_MARKER};

/// Statistics about generated snapshot
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub prompts: usize,
    pub folders: usize,
    pub favorites: usize,
    pub files_generated: Vec<String>,
}

/// Result of generating a single snapshot file
pub struct GeneratedFile {
    pub relative_path: String,
    pub prompt_id: String,
}

/// Generate markdown snapshots for the whole vault
///
/// This will:
/// 1. Clear the output of a previous snapshot (an unrelated non-empty
///    directory is refused)
/// 2. Write one file per prompt under `prompts/<folder>/`
/// 3. Generate an index README.md
pub fn generate_snapshot(vault: &Vault, snapshot_dir: &Path) -> Result<SnapshotStats> {
    utils::clear_snapshot_dir(snapshot_dir)?;
    std::fs::create_dir_all(snapshot_dir.join("prompts"))?;

    let files = prompt::generate(vault, snapshot_dir)?;
    let vault_stats = vault.stats();

    let mut stats = SnapshotStats {
        prompts: files.len(),
        folders: vault_stats.folders,
        favorites: vault_stats.favorites,
        files_generated: files.iter().map(|f| f.relative_path.clone()).collect(),
    };

    // README must be last to have all stats
    readme::generate(vault, snapshot_dir, &files, &stats)?;
    stats.files_generated.push("README.md".to_string());

    Ok(stats)
}

/// Refuse an output directory that is, or contains, the vault directory
pub fn check_output_dir(snapshot_dir: &Path, vault_dir: &Path) -> Result<()> {
    if !snapshot_dir.exists() {
        return Ok(());
    }
    let output = snapshot_dir.canonicalize()?;
    let vault = vault_dir.canonicalize()?;
    if vault.starts_with(&output) {
        return Err(crate::error::VaultError::Validation(format!(
            "snapshot output {} contains the vault directory",
            snapshot_dir.display()
        )));
    }
    Ok(())
}

/// Generate YAML frontmatter block
pub fn yaml_frontmatter<T: serde::Serialize>(data: &T) -> Result<String> {
    let yaml = serde_yaml::to_string(data).map_err(|e| {
        crate::error::VaultError::Storage(format!("YAML serialization failed: {}", e))
    })?;
    Ok(format!("---\n{}---\n", yaml))
}

/// Get current timestamp for "last updated" footers
pub fn current_timestamp() -> String {
    format_timestamp(&Utc::now())
}
