// src/snapshot/readme.rs
//! README index generation for snapshot

use std::collections::HashMap;
use std::path::Path;

use crate::entity::Prompt;
use crate::vault::Vault;
use crate::Result;

use super::current_timestamp;
use super::utils::{format_date, write_snapshot_file};
use super::{GeneratedFile, SnapshotStats};

fn prompt_line(prompt: &Prompt, link: &str) -> String {
    let mut markers = String::new();
    if prompt.is_pinned {
        markers.push_str(" 📌");
    }
    if prompt.is_favorite {
        markers.push_str(" ⭐");
    }
    let tags = if prompt.tags.is_empty() {
        String::new()
    } else {
        format!(
            " {}",
            prompt
                .tags
                .iter()
                .map(|t| format!("`{}`", t))
                .collect::<Vec<_>>()
                .join(" ")
        )
    };
    format!("- [{}]({}){}{}\n", prompt.title, link, markers, tags)
}

/// Prompts of one group, pinned first then most recently updated
fn sorted_group<'a>(prompts: impl Iterator<Item = &'a Prompt>) -> Vec<&'a Prompt> {
    let mut group: Vec<&Prompt> = prompts.collect();
    group.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
    group
}

/// Generate README.md index
pub fn generate(
    vault: &Vault,
    snapshot_dir: &Path,
    files: &[GeneratedFile],
    stats: &SnapshotStats,
) -> Result<()> {
    let links: HashMap<&str, &str> = files
        .iter()
        .map(|f| (f.prompt_id.as_str(), f.relative_path.as_str()))
        .collect();
    let link_for = |prompt: &Prompt| links.get(prompt.id.as_str()).copied().unwrap_or("#");

    let mut content = String::from("# Prompt Vault\n\n");
    content.push_str("> Auto-generated by promptvault. Do not edit directly.\n\n");

    // Summary table
    content.push_str("## Summary\n\n");
    content.push_str("| Type | Count |\n");
    content.push_str("|------|-------|\n");
    content.push_str(&format!("| Prompts | {} |\n", stats.prompts));
    content.push_str(&format!("| Folders | {} |\n", stats.folders));
    content.push_str(&format!("| Favorites | {} |\n", stats.favorites));
    content.push('\n');

    if stats.prompts == 0 {
        content.push_str("*No prompts yet. Use `promptvault add` to create your first prompt.*\n\n");
    } else {
        // Recent Activity (top 5)
        content.push_str("## Recently Updated\n\n");
        let mut recent: Vec<&Prompt> = vault.prompts().iter().collect();
        recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        for prompt in recent.iter().take(5) {
            content.push_str(&format!(
                "- [{}]({})  \n  _{}_\n",
                prompt.title,
                link_for(prompt),
                format_date(prompt.updated_at),
            ));
        }
        content.push('\n');

        content.push_str("## Folders\n\n");
        for folder in vault.folders() {
            let group = sorted_group(
                vault
                    .prompts()
                    .iter()
                    .filter(|p| p.folder_id.as_deref() == Some(folder.id.as_str())),
            );
            content.push_str(&format!("### {} {}\n\n", folder.icon, folder.name));
            if group.is_empty() {
                content.push_str("*Empty*\n");
            }
            for prompt in group {
                content.push_str(&prompt_line(prompt, link_for(prompt)));
            }
            content.push('\n');
        }

        let unfiled = sorted_group(vault.prompts().iter().filter(|p| p.folder_id.is_none()));
        if !unfiled.is_empty() {
            content.push_str("### Unfiled\n\n");
            for prompt in unfiled {
                content.push_str(&prompt_line(prompt, link_for(prompt)));
            }
            content.push('\n');
        }
    }

    // Footer
    content.push_str("---\n\n");
    content.push_str(&format!("*Generated: {}*\n", current_timestamp()));

    let readme_path = snapshot_dir.join("README.md");
    write_snapshot_file(&readme_path, &content)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_line_markers_and_tags() {
        let mut prompt = Prompt::new("Review".to_string(), "c".to_string(), None, 0);
        prompt.is_pinned = true;
        prompt.is_favorite = true;
        prompt.tags = vec!["eng".to_string(), "code".to_string()];

        let line = prompt_line(&prompt, "prompts/unfiled/review.md");
        assert_eq!(
            line,
            "- [Review](prompts/unfiled/review.md) 📌 ⭐ `eng` `code`\n"
        );
    }

    #[test]
    fn test_sorted_group_pinned_first() {
        let mut old_pinned = Prompt::new("a".to_string(), "c".to_string(), None, 1);
        old_pinned.is_pinned = true;
        let newer = Prompt::new("b".to_string(), "c".to_string(), None, 5);
        let prompts = [newer, old_pinned];

        let group = sorted_group(prompts.iter());
        assert_eq!(group[0].title, "a");
        assert_eq!(group[1].title, "b");
    }
}
