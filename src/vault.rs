//! In-memory prompt and folder collections and their lifecycle operations.
//!
//! Records are replaced rather than mutated in place: every operation builds
//! the new record from the old one and swaps it into the collection.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entity::{
    is_palette_color, normalize_tags, now_millis, Folder, Prompt, PromptVersion,
    DEFAULT_FOLDER_COLORS,
};
use crate::error::{Result, VaultError};

/// Payload for creating a prompt
#[derive(Debug, Clone, Default)]
pub struct NewPrompt {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub folder_id: Option<String>,
}

/// Update payload for a prompt
#[derive(Debug, Clone, Default)]
pub struct PromptUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub folder_id: Option<Option<String>>, // Some(None) to unfile, Some(Some(id)) to move
}

/// Update payload for a folder
#[derive(Debug, Clone, Default)]
pub struct FolderUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VaultStats {
    pub prompts: usize,
    pub folders: usize,
    pub favorites: usize,
    pub pinned: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    prompts: Vec<Prompt>,
    folders: Vec<Folder>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(prompts: Vec<Prompt>, folders: Vec<Folder>) -> Self {
        Self { prompts, folders }
    }

    pub fn into_parts(self) -> (Vec<Prompt>, Vec<Folder>) {
        (self.prompts, self.folders)
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn get_prompt(&self, id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    pub fn get_folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    /// Resolve an exact id or a unique id prefix to a prompt id
    pub fn resolve_prompt_id(&self, id: &str) -> Result<String> {
        if self.get_prompt(id).is_some() {
            return Ok(id.to_string());
        }
        unique_prefix_match(self.prompts.iter().map(|p| p.id.as_str()), id)?
            .ok_or_else(|| VaultError::PromptNotFound(id.to_string()))
    }

    /// Resolve an exact id, an exact name (case-insensitive) or a unique id
    /// prefix to a folder id
    pub fn resolve_folder_id(&self, id: &str) -> Result<String> {
        if self.get_folder(id).is_some() {
            return Ok(id.to_string());
        }
        let named: Vec<&Folder> = self
            .folders
            .iter()
            .filter(|f| f.name.eq_ignore_ascii_case(id))
            .collect();
        match named.as_slice() {
            [folder] => return Ok(folder.id.clone()),
            [] => {}
            _ => return Err(VaultError::AmbiguousId(id.to_string())),
        }
        unique_prefix_match(self.folders.iter().map(|f| f.id.as_str()), id)?
            .ok_or_else(|| VaultError::FolderNotFound(id.to_string()))
    }

    /// Insert the "New Prompt" placeholder at the front of the collection
    pub fn create_default_prompt(&mut self, folder_id: Option<String>) -> Result<Prompt> {
        self.ensure_folder(folder_id.as_deref())?;
        let prompt = Prompt::new_default(folder_id);
        self.prompts.insert(0, prompt.clone());
        debug!(id = %prompt.id, "created default prompt");
        Ok(prompt)
    }

    pub fn create_prompt(&mut self, new: NewPrompt) -> Result<Prompt> {
        validate_text(&new.title, &new.content)?;
        self.ensure_folder(new.folder_id.as_deref())?;

        let mut prompt = Prompt::new(new.title, new.content, new.folder_id, now_millis());
        prompt.tags = normalize_tags(new.tags);
        self.prompts.insert(0, prompt.clone());
        info!(id = %prompt.id, "created prompt");
        Ok(prompt)
    }

    /// Save an edit. A history entry is recorded only if the content changed.
    pub fn update_prompt(&mut self, id: &str, update: PromptUpdate) -> Result<Prompt> {
        let index = self.prompt_index(id)?;
        let current = &self.prompts[index];

        let title = update.title.unwrap_or_else(|| current.title.clone());
        let content = update.content.unwrap_or_else(|| current.content.clone());
        validate_text(&title, &content)?;

        let folder_id = match update.folder_id {
            Some(folder_id) => {
                self.ensure_folder(folder_id.as_deref())?;
                folder_id
            }
            None => current.folder_id.clone(),
        };

        let tags = if update.add_tags.is_empty() && update.remove_tags.is_empty() {
            current.tags.clone()
        } else {
            let kept = current
                .tags
                .iter()
                .filter(|t| !update.remove_tags.iter().any(|r| r.trim() == t.as_str()))
                .cloned();
            normalize_tags(kept.chain(update.add_tags))
        };

        let mut updated = current.revised(title, content, now_millis());
        updated.tags = tags;
        updated.folder_id = folder_id;

        debug!(id = %updated.id, versions = updated.versions.len(), "updated prompt");
        self.prompts[index] = updated.clone();
        Ok(updated)
    }

    /// Move a prompt into a folder, or out of any folder with `None`
    pub fn move_prompt(&mut self, id: &str, folder_id: Option<String>) -> Result<Prompt> {
        let index = self.prompt_index(id)?;
        self.ensure_folder(folder_id.as_deref())?;

        let updated = Prompt {
            folder_id,
            updated_at: now_millis(),
            ..self.prompts[index].clone()
        };
        self.prompts[index] = updated.clone();
        Ok(updated)
    }

    pub fn delete_prompt(&mut self, id: &str) -> Result<Prompt> {
        let index = self.prompt_index(id)?;
        let removed = self.prompts.remove(index);
        info!(id = %removed.id, "deleted prompt");
        Ok(removed)
    }

    /// Clone a prompt under a new id, placed at the front of the collection
    pub fn duplicate_prompt(&mut self, id: &str) -> Result<Prompt> {
        let index = self.prompt_index(id)?;
        let copy = self.prompts[index].duplicate(now_millis());
        self.prompts.insert(0, copy.clone());
        debug!(source = %id, id = %copy.id, "duplicated prompt");
        Ok(copy)
    }

    /// Flip the favorite flag. Leaves `updated_at` and history untouched.
    pub fn toggle_favorite(&mut self, id: &str) -> Result<Prompt> {
        let index = self.prompt_index(id)?;
        let updated = self.prompts[index].with_favorite(!self.prompts[index].is_favorite);
        self.prompts[index] = updated.clone();
        Ok(updated)
    }

    /// Flip the pinned flag. Leaves `updated_at` and history untouched.
    pub fn toggle_pin(&mut self, id: &str) -> Result<Prompt> {
        let index = self.prompt_index(id)?;
        let updated = self.prompts[index].with_pinned(!self.prompts[index].is_pinned);
        self.prompts[index] = updated.clone();
        Ok(updated)
    }

    pub fn prompt_versions(&self, id: &str) -> Result<&[PromptVersion]> {
        let index = self.prompt_index(id)?;
        Ok(&self.prompts[index].versions)
    }

    /// Bring back a snapshot's title and content through the normal edit path
    pub fn restore_version(&mut self, id: &str, version_id: &str) -> Result<Prompt> {
        let index = self.prompt_index(id)?;
        let versions = &self.prompts[index].versions;
        let version_id = match versions.iter().find(|v| v.id == version_id) {
            Some(v) => v.id.clone(),
            None => unique_prefix_match(versions.iter().map(|v| v.id.as_str()), version_id)?
                .ok_or_else(|| VaultError::VersionNotFound(version_id.to_string()))?,
        };
        let version = versions
            .iter()
            .find(|v| v.id == version_id)
            .cloned()
            .ok_or_else(|| VaultError::VersionNotFound(version_id.clone()))?;

        self.update_prompt(
            id,
            PromptUpdate {
                title: Some(version.title),
                content: Some(version.content),
                ..Default::default()
            },
        )
    }

    pub fn create_folder(&mut self, name: &str) -> Result<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(VaultError::Validation("folder name must not be empty".to_string()));
        }
        let folder = Folder::new(name.to_string(), self.folders.len(), now_millis());
        self.folders.push(folder.clone());
        info!(id = %folder.id, name = %folder.name, "created folder");
        Ok(folder)
    }

    pub fn update_folder(&mut self, id: &str, update: FolderUpdate) -> Result<Folder> {
        let index = self
            .folders
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| VaultError::FolderNotFound(id.to_string()))?;

        let mut updated = self.folders[index].clone();
        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(VaultError::Validation("folder name must not be empty".to_string()));
            }
            updated.name = name.to_string();
        }
        if let Some(icon) = update.icon {
            if icon.trim().is_empty() {
                return Err(VaultError::Validation("folder icon must not be empty".to_string()));
            }
            updated.icon = icon.trim().to_string();
        }
        if let Some(color) = update.color {
            if !is_palette_color(&color) {
                return Err(VaultError::Validation(format!(
                    "color {} is not in the folder palette ({})",
                    color,
                    DEFAULT_FOLDER_COLORS.join(", ")
                )));
            }
            updated.color = color.to_uppercase();
        }

        self.folders[index] = updated.clone();
        Ok(updated)
    }

    /// Remove a folder and unfile every prompt that referenced it.
    ///
    /// Returns the removed folder and the number of prompts unfiled. No prompt
    /// is deleted.
    pub fn delete_folder(&mut self, id: &str) -> Result<(Folder, usize)> {
        let index = self
            .folders
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| VaultError::FolderNotFound(id.to_string()))?;
        let removed = self.folders.remove(index);

        let mut unfiled = 0;
        for prompt in self.prompts.iter_mut() {
            if prompt.folder_id.as_deref() == Some(id) {
                *prompt = Prompt {
                    folder_id: None,
                    ..prompt.clone()
                };
                unfiled += 1;
            }
        }

        info!(id = %removed.id, unfiled, "deleted folder");
        Ok((removed, unfiled))
    }

    /// Replace both collections, unfiling prompts whose folder is missing
    pub fn replace_all(&mut self, prompts: Vec<Prompt>, folders: Vec<Folder>) {
        let prompts = prompts
            .into_iter()
            .map(|prompt| match prompt.folder_id.as_deref() {
                Some(folder_id) if !folders.iter().any(|f| f.id == folder_id) => Prompt {
                    folder_id: None,
                    ..prompt
                },
                _ => prompt,
            })
            .collect();

        self.prompts = prompts;
        self.folders = folders;
    }

    pub fn stats(&self) -> VaultStats {
        VaultStats {
            prompts: self.prompts.len(),
            folders: self.folders.len(),
            favorites: self.prompts.iter().filter(|p| p.is_favorite).count(),
            pinned: self.prompts.iter().filter(|p| p.is_pinned).count(),
        }
    }

    fn prompt_index(&self, id: &str) -> Result<usize> {
        self.prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| VaultError::PromptNotFound(id.to_string()))
    }

    fn ensure_folder(&self, folder_id: Option<&str>) -> Result<()> {
        match folder_id {
            Some(id) if self.get_folder(id).is_none() => {
                Err(VaultError::FolderNotFound(id.to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn validate_text(title: &str, content: &str) -> Result<()> {
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(VaultError::Validation(
            "title and content are required".to_string(),
        ));
    }
    Ok(())
}

fn unique_prefix_match<'a>(
    ids: impl Iterator<Item = &'a str>,
    prefix: &str,
) -> Result<Option<String>> {
    if prefix.is_empty() {
        return Ok(None);
    }
    let matches: Vec<&str> = ids.filter(|id| id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [] => Ok(None),
        [id] => Ok(Some(id.to_string())),
        _ => Err(VaultError::AmbiguousId(prefix.to_string())),
    }
}
