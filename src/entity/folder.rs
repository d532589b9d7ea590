// src/entity/folder.rs
use serde::{Deserialize, Serialize};

use super::new_id;

pub const DEFAULT_FOLDER_COLORS: [&str; 8] = [
    "#3B82F6", // Blue
    "#10B981", // Emerald
    "#F59E0B", // Amber
    "#EF4444", // Red
    "#8B5CF6", // Violet
    "#EC4899", // Pink
    "#06B6D4", // Cyan
    "#84CC16", // Lime
];

pub const DEFAULT_FOLDER_ICONS: [&str; 10] = [
    "📁", "📂", "🗂️", "💼", "📚", "🎯", "⚡", "🔥", "💡", "🚀",
];

pub const DEFAULT_FOLDER_ICON: &str = "📁";

/// Whether `color` is one of the palette entries (case-insensitive)
pub fn is_palette_color(color: &str) -> bool {
    DEFAULT_FOLDER_COLORS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(color))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub created_at: i64,
}

impl Folder {
    /// Create a folder, picking its color round-robin from the palette
    /// based on how many folders already exist.
    pub fn new(name: String, existing_count: usize, now: i64) -> Self {
        Self {
            id: new_id(),
            name,
            icon: DEFAULT_FOLDER_ICON.to_string(),
            color: DEFAULT_FOLDER_COLORS[existing_count % DEFAULT_FOLDER_COLORS.len()].to_string(),
            created_at: now,
        }
    }
}
