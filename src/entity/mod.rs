mod folder;
mod prompt;

pub use folder::{
    is_palette_color, Folder, DEFAULT_FOLDER_COLORS, DEFAULT_FOLDER_ICON, DEFAULT_FOLDER_ICONS,
};
pub use prompt::{
    create_prompt_version, LegacyPrompt, Prompt, PromptVersion, DEFAULT_PROMPT_TITLE, MAX_VERSIONS,
};

use chrono::Utc;
use uuid::Uuid;

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Fresh identifier for prompts, folders and version entries
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Trim tags, drop empties and duplicates, keep first-insertion order
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || normalized.iter().any(|t| t == tag) {
            continue;
        }
        normalized.push(tag.to_string());
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_normalize_tags_keeps_order() {
        let tags = normalize_tags(["  rust ", "cli", "", "rust", "ai"]);
        assert_eq!(tags, vec!["rust", "cli", "ai"]);
    }

    #[test]
    fn test_now_millis_is_positive() {
        assert!(now_millis() > 1_600_000_000_000);
    }
}
