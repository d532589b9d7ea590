use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{StorageBackend, VAULT_DIR_ENV};
use crate::entity::{Folder, Prompt};
use crate::error::{Result, VaultError};
use crate::optimize::{optimize_prompt, CommandOptimizer};
use crate::search::{search, SortOption};
use crate::snapshot::{check_output_dir, format_date, generate_snapshot, short_id};
use crate::storage::{export_json, import_document, PromptStorage, Workspace, VAULT_DIR};
use crate::template::{default_values, extract_variables, parse_assignment, replace_variables};
use crate::vault::{FolderUpdate, NewPrompt, PromptUpdate, Vault};

/// Find the vault directory by looking for .promptvault/ from the current
/// directory upwards. `PROMPTVAULT_DIR` overrides the search.
fn find_vault_dir() -> PathBuf {
    if let Some(dir) = env::var_os(VAULT_DIR_ENV) {
        return PathBuf::from(dir);
    }

    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(VAULT_DIR).is_dir() {
            return current.join(VAULT_DIR);
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd.join(VAULT_DIR),
        }
    }
}

/// An opened workspace with its vault loaded into memory
struct Session {
    workspace: Workspace,
    storage: Box<dyn PromptStorage>,
    vault: Vault,
}

impl Session {
    fn open() -> Result<Self> {
        let workspace = Workspace::open(&find_vault_dir())?;
        let storage = workspace.storage()?;
        let vault = storage.load()?;
        debug!(
            dir = %workspace.dir().display(),
            prompts = vault.prompts().len(),
            "opened vault"
        );
        Ok(Self {
            workspace,
            storage,
            vault,
        })
    }

    fn save(&self) -> Result<()> {
        self.storage.save(&self.vault)
    }

    fn prompt(&self, id: &str) -> Result<&Prompt> {
        let id = self.vault.resolve_prompt_id(id)?;
        self.vault
            .get_prompt(&id)
            .ok_or(VaultError::PromptNotFound(id))
    }

    /// Folder for new prompts: the given one, else the configured default if
    /// it still exists
    fn target_folder(&self, folder: Option<String>) -> Result<Option<String>> {
        match folder {
            Some(folder) => Ok(Some(self.vault.resolve_folder_id(&folder)?)),
            None => Ok(self
                .workspace
                .config()
                .default_folder_id
                .clone()
                .filter(|id| self.vault.get_folder(id).is_some())),
        }
    }

    fn folder_name(&self, folder_id: Option<&str>) -> Option<&str> {
        folder_id
            .and_then(|id| self.vault.get_folder(id))
            .map(|f| f.name.as_str())
    }
}

fn read_stdin() -> Result<String> {
    let mut content = String::new();
    io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

/// Ask for confirmation on an interactive terminal. Non-interactive callers
/// must pass `--force`.
fn confirm(question: &str, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }

    eprintln!("{} [y/N] ", question);

    if atty::is(atty::Stream::Stdin) {
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(false);
        }
        Ok(true)
    } else {
        Err(VaultError::Validation(
            "Use --force to delete in non-interactive mode".to_string(),
        ))
    }
}

fn print_prompt_line(prompt: &Prompt, show_word_count: bool) {
    let mut line = format!("  {}  {}", short_id(&prompt.id), prompt.title);
    if prompt.is_pinned {
        line.push_str(" 📌");
    }
    if prompt.is_favorite {
        line.push_str(" ⭐");
    }
    if show_word_count {
        line.push_str(&format!(" ({} words)", prompt.word_count()));
    }
    println!("{}", line);
    if !prompt.tags.is_empty() {
        println!("      tags: {}", prompt.tags.join(", "));
    }
}

pub fn handle_init(backend: String) -> Result<()> {
    let backend: StorageBackend = backend.parse().map_err(VaultError::Validation)?;
    let dir = match env::var_os(VAULT_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => env::current_dir()?.join(VAULT_DIR),
    };

    Workspace::init(&dir, backend)?;

    println!(
        "Initialized prompt vault in {} ({} storage)",
        dir.display(),
        backend
    );

    Ok(())
}

pub fn handle_new(folder: Option<String>, json: bool) -> Result<()> {
    let mut session = Session::open()?;
    let folder_id = session.target_folder(folder)?;

    let prompt = session.vault.create_default_prompt(folder_id)?;
    session.save()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    } else {
        println!("Created prompt ({}) - {}", short_id(&prompt.id), prompt.title);
    }

    Ok(())
}

pub fn handle_add(
    title: String,
    content: Option<String>,
    stdin: bool,
    tags: Vec<String>,
    folder: Option<String>,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;

    let content = if stdin {
        read_stdin()?
    } else {
        content.unwrap_or_default()
    };
    let folder_id = session.target_folder(folder)?;

    let prompt = session.vault.create_prompt(NewPrompt {
        title,
        content,
        tags,
        folder_id,
    })?;
    session.save()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    } else {
        println!("Created prompt ({}) - {}", short_id(&prompt.id), prompt.title);
    }

    Ok(())
}

pub fn handle_list(query: Option<String>, sort: String, json: bool) -> Result<()> {
    let session = Session::open()?;
    let sort: SortOption = sort.parse().map_err(VaultError::Validation)?;
    let query = query.unwrap_or_default();

    let results = search(session.vault.prompts(), &query, sort);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        if query.is_empty() {
            println!("No prompts found.");
        } else {
            println!("No results found for '{}'.", query);
        }
    } else {
        println!("Prompts:\n");
        let show_word_count = session.workspace.config().show_word_count;
        for prompt in results {
            print_prompt_line(prompt, show_word_count);
        }
    }

    Ok(())
}

pub fn handle_get(id: String, json: bool) -> Result<()> {
    let session = Session::open()?;
    let prompt = session.prompt(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(prompt)?);
        return Ok(());
    }

    println!("Prompt ({})", prompt.id);
    println!("Title: {}", prompt.title);
    if let Some(folder) = session.folder_name(prompt.folder_id.as_deref()) {
        println!("Folder: {}", folder);
    }
    if !prompt.tags.is_empty() {
        println!("Tags: {}", prompt.tags.join(", "));
    }
    if prompt.is_favorite || prompt.is_pinned {
        let mut flags = Vec::new();
        if prompt.is_pinned {
            flags.push("pinned");
        }
        if prompt.is_favorite {
            flags.push("favorite");
        }
        println!("Flags: {}", flags.join(", "));
    }
    println!("Created: {}", format_date(prompt.created_at));
    println!("Updated: {}", format_date(prompt.updated_at));
    if !prompt.versions.is_empty() {
        println!("Versions: {}", prompt.versions.len());
    }
    let variables = extract_variables(&prompt.content);
    if !variables.is_empty() {
        let names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
        println!("Variables: {}", names.join(", "));
    }
    if !prompt.content.is_empty() {
        println!("\n{}", prompt.content);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_edit(
    id: String,
    title: Option<String>,
    content: Option<String>,
    stdin: bool,
    tags: Vec<String>,
    untags: Vec<String>,
    folder: Option<String>,
    unfile: bool,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;
    let id = session.vault.resolve_prompt_id(&id)?;

    let content = if stdin { Some(read_stdin()?) } else { content };
    let folder_id = if unfile {
        Some(None)
    } else {
        match folder {
            Some(folder) => Some(Some(session.vault.resolve_folder_id(&folder)?)),
            None => None,
        }
    };

    let updated = session.vault.update_prompt(
        &id,
        PromptUpdate {
            title,
            content,
            add_tags: tags,
            remove_tags: untags,
            folder_id,
        },
    )?;
    session.save()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("Updated prompt ({}) - {}", short_id(&updated.id), updated.title);
    }

    Ok(())
}

pub fn handle_delete(id: String, force: bool) -> Result<()> {
    let mut session = Session::open()?;
    let prompt = session.prompt(&id)?.clone();

    let question = format!("Delete prompt ({}) - {}?", short_id(&prompt.id), prompt.title);
    if !confirm(&question, force)? {
        return Ok(());
    }

    session.vault.delete_prompt(&prompt.id)?;
    session.save()?;

    println!("Deleted prompt ({}) - {}", short_id(&prompt.id), prompt.title);

    Ok(())
}

pub fn handle_duplicate(id: String) -> Result<()> {
    let mut session = Session::open()?;
    let id = session.vault.resolve_prompt_id(&id)?;

    let copy = session.vault.duplicate_prompt(&id)?;
    session.save()?;

    println!("Created prompt ({}) - {}", short_id(&copy.id), copy.title);

    Ok(())
}

pub fn handle_favorite(id: String) -> Result<()> {
    let mut session = Session::open()?;
    let id = session.vault.resolve_prompt_id(&id)?;

    let prompt = session.vault.toggle_favorite(&id)?;
    session.save()?;

    let state = if prompt.is_favorite { "Favorited" } else { "Unfavorited" };
    println!("{} prompt ({}) - {}", state, short_id(&prompt.id), prompt.title);

    Ok(())
}

pub fn handle_pin(id: String) -> Result<()> {
    let mut session = Session::open()?;
    let id = session.vault.resolve_prompt_id(&id)?;

    let prompt = session.vault.toggle_pin(&id)?;
    session.save()?;

    let state = if prompt.is_pinned { "Pinned" } else { "Unpinned" };
    println!("{} prompt ({}) - {}", state, short_id(&prompt.id), prompt.title);

    Ok(())
}

pub fn handle_history(id: String, json: bool) -> Result<()> {
    let session = Session::open()?;
    let prompt = session.prompt(&id)?;
    let versions = session.vault.prompt_versions(&prompt.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(versions)?);
    } else if versions.is_empty() {
        println!("No saved versions for '{}'.", prompt.title);
    } else {
        println!("Versions of '{}' (newest first):\n", prompt.title);
        for version in versions {
            println!(
                "  {}  {}  {}",
                short_id(&version.id),
                format_date(version.saved_at),
                version.title
            );
        }
    }

    Ok(())
}

pub fn handle_restore(id: String, version_id: String) -> Result<()> {
    let mut session = Session::open()?;
    let id = session.vault.resolve_prompt_id(&id)?;

    let prompt = session.vault.restore_version(&id, &version_id)?;
    session.save()?;

    println!(
        "Restored version {} of prompt ({}) - {}",
        version_id,
        short_id(&prompt.id),
        prompt.title
    );

    Ok(())
}

pub fn handle_vars(id: String, json: bool) -> Result<()> {
    let session = Session::open()?;
    let prompt = session.prompt(&id)?;
    let variables = extract_variables(&prompt.content);

    if json {
        println!("{}", serde_json::to_string_pretty(&variables)?);
    } else if variables.is_empty() {
        println!("No variables in '{}'.", prompt.title);
    } else {
        for variable in variables {
            match variable.default_value {
                Some(default) => println!("  {} (default: {})", variable.name, default),
                None => println!("  {}", variable.name),
            }
        }
    }

    Ok(())
}

/// Print the prompt with every variable filled in. Unspecified variables take
/// their default, or an empty string.
pub fn handle_render(id: String, vars: Vec<String>) -> Result<()> {
    let session = Session::open()?;
    let prompt = session.prompt(&id)?;

    let mut values = default_values(&extract_variables(&prompt.content));
    for assignment in &vars {
        let (name, value) = parse_assignment(assignment).ok_or_else(|| {
            VaultError::Validation(format!(
                "invalid variable '{}', expected name=value",
                assignment
            ))
        })?;
        values.insert(name, value);
    }

    println!("{}", replace_variables(&prompt.content, &values));

    Ok(())
}

pub fn handle_folder_add(name: String, json: bool) -> Result<()> {
    let mut session = Session::open()?;

    let folder = session.vault.create_folder(&name)?;
    session.save()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&folder)?);
    } else {
        println!(
            "Created folder ({}) - {} {}",
            short_id(&folder.id),
            folder.icon,
            folder.name
        );
    }

    Ok(())
}

pub fn handle_folder_list(json: bool) -> Result<()> {
    let session = Session::open()?;
    let folders = session.vault.folders();

    if json {
        println!("{}", serde_json::to_string_pretty(folders)?);
    } else if folders.is_empty() {
        println!("No folders found.");
    } else {
        println!("Folders:\n");
        for folder in folders {
            let count = session
                .vault
                .prompts()
                .iter()
                .filter(|p| p.folder_id.as_deref() == Some(folder.id.as_str()))
                .count();
            println!(
                "  {}  {} {}  {}  ({} prompts)",
                short_id(&folder.id),
                folder.icon,
                folder.name,
                folder.color,
                count
            );
        }
    }

    Ok(())
}

pub fn handle_folder_edit(
    id: String,
    name: Option<String>,
    icon: Option<String>,
    color: Option<String>,
) -> Result<()> {
    let mut session = Session::open()?;
    let id = session.vault.resolve_folder_id(&id)?;

    let folder = session
        .vault
        .update_folder(&id, FolderUpdate { name, icon, color })?;
    session.save()?;

    println!(
        "Updated folder ({}) - {} {}",
        short_id(&folder.id),
        folder.icon,
        folder.name
    );

    Ok(())
}

pub fn handle_folder_delete(id: String, force: bool) -> Result<()> {
    let mut session = Session::open()?;
    let id = session.vault.resolve_folder_id(&id)?;
    let folder: Folder = session
        .vault
        .get_folder(&id)
        .cloned()
        .ok_or_else(|| VaultError::FolderNotFound(id.clone()))?;

    let question = format!(
        "Delete folder ({}) - {}? Its prompts will be kept.",
        short_id(&folder.id),
        folder.name
    );
    if !confirm(&question, force)? {
        return Ok(());
    }

    let (folder, unfiled) = session.vault.delete_folder(&id)?;
    session.save()?;

    println!(
        "Deleted folder ({}) - {} ({} prompts unfiled)",
        short_id(&folder.id),
        folder.name,
        unfiled
    );

    Ok(())
}

pub fn handle_export(output: Option<PathBuf>) -> Result<()> {
    let session = Session::open()?;
    let json = export_json(&session.vault)?;

    match output {
        Some(path) => {
            fs::write(&path, json)?;
            let stats = session.vault.stats();
            println!(
                "Exported {} prompts and {} folders to {}",
                stats.prompts,
                stats.folders,
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

pub fn handle_import(file: PathBuf) -> Result<()> {
    let mut session = Session::open()?;
    let raw = fs::read_to_string(&file)?;

    let data = import_document(&raw)?;
    let (prompts, folders) = (data.prompts.len(), data.folders.len());
    session.vault.replace_all(data.prompts, data.folders);
    session.save()?;

    println!(
        "Imported {} prompts and {} folders from {} (schema v{})",
        prompts,
        folders,
        file.display(),
        data.source_version
    );

    Ok(())
}

pub fn handle_snapshot(output: Option<PathBuf>) -> Result<()> {
    let session = Session::open()?;
    let snapshot_dir = output.unwrap_or_else(|| session.workspace.dir().join("snapshot"));
    check_output_dir(&snapshot_dir, session.workspace.dir())?;

    let stats = generate_snapshot(&session.vault, &snapshot_dir)?;

    println!("Generated snapshot in {}", display_path(&snapshot_dir));
    println!("  {} prompts in {} folders", stats.prompts, stats.folders);
    println!("  {} files written", stats.files_generated.len());

    Ok(())
}

fn display_path(path: &Path) -> String {
    env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

pub fn handle_stats(json: bool) -> Result<()> {
    let session = Session::open()?;
    let stats = session.vault.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Prompts:   {}", stats.prompts);
        println!("Folders:   {}", stats.folders);
        println!("Favorites: {}", stats.favorites);
        println!("Pinned:    {}", stats.pinned);
        println!("Backend:   {}", session.workspace.config().backend);
    }

    Ok(())
}

pub fn handle_optimize(id: String) -> Result<()> {
    let mut session = Session::open()?;
    let id = session.vault.resolve_prompt_id(&id)?;

    let argv = session
        .workspace
        .config()
        .optimizer_command
        .clone()
        .ok_or_else(|| {
            VaultError::Optimizer(
                "no optimizer_command configured in .promptvault/config.json".to_string(),
            )
        })?;
    let optimizer = CommandOptimizer::from_argv(&argv)?;

    let before = session.prompt(&id)?.clone();
    let prompt = optimize_prompt(&mut session.vault, &id, &optimizer)?;

    if prompt == before {
        if prompt.content.trim().is_empty() {
            println!("Prompt ({}) is empty, nothing to optimize.", short_id(&prompt.id));
        } else {
            println!("Optimizer returned nothing, prompt ({}) unchanged.", short_id(&prompt.id));
        }
        return Ok(());
    }

    session.save()?;
    println!("Optimized prompt ({}) - {}", short_id(&prompt.id), prompt.title);

    Ok(())
}

pub fn handle_config(
    default_folder: Option<String>,
    clear_default_folder: bool,
    word_count: Option<bool>,
    optimizer: Option<Vec<String>>,
    clear_optimizer: bool,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;
    let mut changed = false;

    if let Some(folder) = default_folder {
        let folder_id = session.vault.resolve_folder_id(&folder)?;
        session.workspace.config_mut().default_folder_id = Some(folder_id);
        changed = true;
    } else if clear_default_folder {
        session.workspace.config_mut().default_folder_id = None;
        changed = true;
    }

    if let Some(show) = word_count {
        session.workspace.config_mut().show_word_count = show;
        changed = true;
    }

    if let Some(argv) = optimizer {
        CommandOptimizer::from_argv(&argv)?;
        session.workspace.config_mut().optimizer_command = Some(argv);
        changed = true;
    } else if clear_optimizer {
        session.workspace.config_mut().optimizer_command = None;
        changed = true;
    }

    if changed {
        session.workspace.save_config()?;
        debug!(dir = %session.workspace.dir().display(), "saved config");
    }

    let config = session.workspace.config();
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    if changed {
        println!("Updated config.");
    }
    println!("Backend:        {}", config.backend);
    match config.default_folder_id.as_deref() {
        Some(id) => println!(
            "Default folder: {} ({})",
            session.folder_name(Some(id)).unwrap_or("missing"),
            short_id(id)
        ),
        None => println!("Default folder: none"),
    }
    println!("Word counts:    {}", config.show_word_count);
    match &config.optimizer_command {
        Some(argv) => println!("Optimizer:      {}", argv.join(" ")),
        None => println!("Optimizer:      none"),
    }

    Ok(())
}
