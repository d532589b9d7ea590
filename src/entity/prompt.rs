// src/entity/prompt.rs
use serde::{Deserialize, Serialize};

use super::{new_id, now_millis};

/// Maximum number of history snapshots retained per prompt
pub const MAX_VERSIONS: usize = 5;

/// Title given to prompts created without one
pub const DEFAULT_PROMPT_TITLE: &str = "New Prompt";

/// A snapshot of a prompt's title and content taken before an edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptVersion {
    pub id: String,
    pub title: String,
    pub content: String,
    pub saved_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    pub title: String,
    /// Template text (may include {{variable}} placeholders)
    pub content: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub is_pinned: bool,
    pub folder_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Newest first, at most `MAX_VERSIONS` entries
    pub versions: Vec<PromptVersion>,
}

/// Prompt record as written by schema version 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPrompt {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<LegacyPrompt> for Prompt {
    fn from(legacy: LegacyPrompt) -> Self {
        Self {
            id: legacy.id,
            title: legacy.title,
            content: legacy.content,
            tags: legacy.tags,
            is_favorite: legacy.is_favorite,
            is_pinned: false,
            folder_id: None,
            created_at: legacy.created_at,
            updated_at: legacy.updated_at,
            versions: Vec::new(),
        }
    }
}

/// Snapshot the outgoing title/content of `prompt`
pub fn create_prompt_version(prompt: &Prompt, saved_at: i64) -> PromptVersion {
    PromptVersion {
        id: new_id(),
        title: prompt.title.clone(),
        content: prompt.content.clone(),
        saved_at,
    }
}

impl Prompt {
    /// Create a prompt with the given title and content at time `now`
    pub fn new(title: String, content: String, folder_id: Option<String>, now: i64) -> Self {
        Self {
            id: new_id(),
            title,
            content,
            tags: Vec::new(),
            is_favorite: false,
            is_pinned: false,
            folder_id,
            created_at: now,
            updated_at: now,
            versions: Vec::new(),
        }
    }

    /// The "New Prompt" placeholder record
    pub fn new_default(folder_id: Option<String>) -> Self {
        Self::new(
            DEFAULT_PROMPT_TITLE.to_string(),
            String::new(),
            folder_id,
            now_millis(),
        )
    }

    /// Copy with a fresh id and timestamps. History is not carried over.
    pub fn duplicate(&self, now: i64) -> Self {
        Self {
            id: new_id(),
            title: format!("{} (Copy)", self.title),
            created_at: now,
            updated_at: now,
            versions: Vec::new(),
            ..self.clone()
        }
    }

    /// Apply a title/content edit.
    ///
    /// A snapshot of the outgoing title and content is pushed to the front of
    /// `versions` only when the content actually changes; the history is then
    /// truncated to `MAX_VERSIONS`.
    pub fn revised(&self, title: String, content: String, now: i64) -> Self {
        let versions = if content != self.content {
            std::iter::once(create_prompt_version(self, now))
                .chain(self.versions.iter().cloned())
                .take(MAX_VERSIONS)
                .collect()
        } else {
            self.versions.clone()
        };

        Self {
            title,
            content,
            versions,
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn with_favorite(&self, is_favorite: bool) -> Self {
        Self {
            is_favorite,
            ..self.clone()
        }
    }

    pub fn with_pinned(&self, is_pinned: bool) -> Self {
        Self {
            is_pinned,
            ..self.clone()
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}
