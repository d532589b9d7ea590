// src/snapshot/utils.rs
//! Utility functions for snapshot generation

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::VaultError;
use crate::Result;

/// Convert a title to a URL-safe slug
///
/// - Converts to lowercase
/// - Replaces spaces and special chars with hyphens
/// - Removes consecutive hyphens
/// - Trims leading/trailing hyphens
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // Start true to trim leading hyphens

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    // Trim trailing hyphen
    if slug.ends_with('-') {
        slug.pop();
    }

    // Ensure non-empty slug
    if slug.is_empty() {
        slug = "untitled".to_string();
    }

    slug
}

/// Marker file identifying a directory as a generated snapshot
pub const SNAPSHOT_MARKER: &str = ".promptvault-snapshot";

/// Prepare `snapshot_dir` for regeneration.
///
/// Only output this tool generated is removed: `prompts/` and `README.md`.
/// An existing non-empty directory without the snapshot marker is refused.
pub fn clear_snapshot_dir(snapshot_dir: &Path) -> Result<()> {
    if !snapshot_dir.exists() {
        fs::create_dir_all(snapshot_dir)?;
        fs::write(snapshot_dir.join(SNAPSHOT_MARKER), "")?;
        return Ok(());
    }

    if !snapshot_dir.is_dir() {
        return Err(VaultError::Validation(format!(
            "snapshot output {} is not a directory",
            snapshot_dir.display()
        )));
    }

    let is_empty = fs::read_dir(snapshot_dir)?.next().is_none();
    if !is_empty && !snapshot_dir.join(SNAPSHOT_MARKER).exists() {
        return Err(VaultError::Validation(format!(
            "refusing to write snapshot into {}: directory is not empty and is not a previous snapshot",
            snapshot_dir.display()
        )));
    }

    let prompts_dir = snapshot_dir.join("prompts");
    if prompts_dir.exists() {
        fs::remove_dir_all(prompts_dir)?;
    }
    let readme = snapshot_dir.join("README.md");
    if readme.exists() {
        fs::remove_file(readme)?;
    }
    fs::write(snapshot_dir.join(SNAPSHOT_MARKER), "")?;

    Ok(())
}

/// Write content to a file, creating parent directories if needed
pub fn write_snapshot_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Format epoch milliseconds as YYYY-MM-DD for frontmatter
pub fn format_date(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Format a DateTime as full ISO timestamp
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Shorten an id for display (first 7 chars)
pub fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Code Review Checklist"), "code-review-checklist");
    }

    #[test]
    fn test_slugify_special_chars() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("API v2.0 (beta)"), "api-v2-0-beta");
    }

    #[test]
    fn test_slugify_consecutive_specials() {
        assert_eq!(slugify("Hello   World"), "hello-world");
        assert_eq!(slugify("---test---"), "test");
    }

    #[test]
    fn test_slugify_unicode() {
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
        assert_eq!(slugify("日本語"), "untitled"); // Non-ASCII only
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "untitled");
        assert_eq!(slugify("---"), "untitled");
    }

    #[test]
    fn test_clear_creates_marked_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("out");

        clear_snapshot_dir(&dir).unwrap();

        assert!(dir.join(SNAPSHOT_MARKER).exists());
    }

    #[test]
    fn test_clear_accepts_empty_dir() {
        let tmp = TempDir::new().unwrap();

        clear_snapshot_dir(tmp.path()).unwrap();

        assert!(tmp.path().join(SNAPSHOT_MARKER).exists());
    }

    #[test]
    fn test_clear_refuses_unmarked_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "mine").unwrap();

        let err = clear_snapshot_dir(tmp.path()).unwrap_err();

        assert!(matches!(err, VaultError::Validation(_)));
        assert!(tmp.path().join("notes.txt").exists());
        assert!(!tmp.path().join(SNAPSHOT_MARKER).exists());
    }

    #[test]
    fn test_clear_only_removes_generated_output() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(SNAPSHOT_MARKER), "").unwrap();
        fs::create_dir_all(tmp.path().join("prompts/work")).unwrap();
        fs::write(tmp.path().join("prompts/work/old.md"), "old").unwrap();
        fs::write(tmp.path().join("README.md"), "old").unwrap();
        fs::write(tmp.path().join("notes.txt"), "mine").unwrap();

        clear_snapshot_dir(tmp.path()).unwrap();

        assert!(!tmp.path().join("prompts").exists());
        assert!(!tmp.path().join("README.md").exists());
        assert!(tmp.path().join("notes.txt").exists());
    }

    #[test]
    fn test_clear_refuses_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.md");
        fs::write(&file, "x").unwrap();

        assert!(clear_snapshot_dir(&file).is_err());
        assert!(file.exists());
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0), "1970-01-01");
        assert_eq!(format_date(1_700_000_000_000), "2023-11-14");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0f8e4c1a-aaaa"), "0f8e4c1");
        assert_eq!(short_id("17"), "17");
    }
}
