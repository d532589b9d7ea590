// src/snapshot/prompt.rs
//! Prompt snapshot generation

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::entity::{Folder, Prompt};
use crate::template::extract_variables;
use crate::vault::Vault;
use crate::Result;

use super::utils::{format_date, short_id, slugify, write_snapshot_file};
use super::{yaml_frontmatter, GeneratedFile};

pub const UNFILED_DIR: &str = "unfiled";

#[derive(Serialize)]
struct VariableEntry {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
}

#[derive(Serialize)]
struct PromptFrontmatter {
    id: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder: Option<String>,
    created: String,
    updated: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    favorite: bool,
    pinned: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    variables: Vec<VariableEntry>,
    versions: usize,
}

impl PromptFrontmatter {
    fn from_prompt(prompt: &Prompt, folder: Option<&Folder>) -> Self {
        Self {
            id: prompt.id.clone(),
            title: prompt.title.clone(),
            folder: folder.map(|f| f.name.clone()),
            created: format_date(prompt.created_at),
            updated: format_date(prompt.updated_at),
            tags: prompt.tags.clone(),
            favorite: prompt.is_favorite,
            pinned: prompt.is_pinned,
            variables: extract_variables(&prompt.content)
                .into_iter()
                .map(|v| VariableEntry {
                    name: v.name,
                    default: v.default_value,
                })
                .collect(),
            versions: prompt.versions.len(),
        }
    }
}

/// Generate markdown body for a prompt
fn generate_body(prompt: &Prompt) -> String {
    let mut body = format!("# {}\n\n", prompt.title);

    if !prompt.content.is_empty() {
        body.push_str(&prompt.content);
        if !prompt.content.ends_with('\n') {
            body.push('\n');
        }
    }

    if !prompt.versions.is_empty() {
        body.push_str("\n## History\n\n");
        for version in &prompt.versions {
            body.push_str(&format!(
                "- {} `{}` {}\n",
                format_date(version.saved_at),
                short_id(&version.id),
                version.title
            ));
        }
    }

    body
}

/// Directory name for each folder, unique even when names collide
pub fn folder_dirs(folders: &[Folder]) -> HashMap<String, String> {
    let mut used = HashSet::from([UNFILED_DIR.to_string()]);
    folders
        .iter()
        .map(|folder| {
            let slug = slugify(&folder.name);
            let dir = if used.insert(slug.clone()) {
                slug
            } else {
                let unique = format!("{}-{}", slug, short_id(&folder.id));
                used.insert(unique.clone());
                unique
            };
            (folder.id.clone(), dir)
        })
        .collect()
}

/// Generate a unique filename, handling collisions
fn unique_filename(base_slug: &str, id: &str, used_slugs: &mut HashSet<String>) -> String {
    let candidate = base_slug.to_string();

    if used_slugs.insert(candidate.clone()) {
        format!("{}.md", candidate)
    } else {
        // Collision: append short id
        let unique = format!("{}-{}", base_slug, short_id(id));
        used_slugs.insert(unique.clone());
        format!("{}.md", unique)
    }
}

/// Generate one markdown file per prompt under `prompts/<folder>/`
pub fn generate(vault: &Vault, snapshot_dir: &Path) -> Result<Vec<GeneratedFile>> {
    let mut generated = Vec::new();
    let dirs = folder_dirs(vault.folders());

    // Oldest first so earlier prompts keep the unsuffixed filename
    let mut sorted: Vec<&Prompt> = vault.prompts().iter().collect();
    sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let mut used_by_dir: HashMap<String, HashSet<String>> = HashMap::new();

    for prompt in sorted {
        let folder = prompt
            .folder_id
            .as_deref()
            .and_then(|id| vault.get_folder(id));
        let dir = folder
            .and_then(|f| dirs.get(&f.id))
            .cloned()
            .unwrap_or_else(|| UNFILED_DIR.to_string());

        let frontmatter = PromptFrontmatter::from_prompt(prompt, folder);
        let content = format!("{}{}", yaml_frontmatter(&frontmatter)?, generate_body(prompt));

        let used = used_by_dir.entry(dir.clone()).or_default();
        let filename = unique_filename(&slugify(&prompt.title), &prompt.id, used);
        let relative_path = format!("prompts/{}/{}", dir, filename);

        write_snapshot_file(&snapshot_dir.join(&relative_path), &content)?;

        generated.push(GeneratedFile {
            relative_path,
            prompt_id: prompt.id.clone(),
        });
    }

    Ok(generated)
}
