use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "promptvault")]
#[command(version, about = "A local prompt library with templates, folders and version history")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new prompt vault in the current directory
    Init {
        /// Storage backend (document, sqlite)
        #[arg(long, default_value = "document")]
        backend: String,
    },

    /// Create an empty "New Prompt"
    New {
        /// Folder ID or name
        #[arg(long, short = 'f')]
        folder: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a prompt with a title and content
    Add {
        /// Prompt title
        title: String,

        /// Prompt content
        #[arg(long, short = 'c', conflicts_with = "stdin")]
        content: Option<String>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,

        /// Tags (can be specified multiple times)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Folder ID or name
        #[arg(long, short = 'f')]
        folder: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List prompts, optionally filtered by a search query
    List {
        /// Search text with optional filters (tag:x, folder:id, folder:none, is:favorite, is:pinned)
        query: Option<String>,

        /// Sort order (newest, oldest, az, pinned)
        #[arg(long, short = 's', default_value = "newest")]
        sort: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single prompt
    Get {
        /// Prompt ID or unique prefix
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit a prompt
    Edit {
        /// Prompt ID or unique prefix
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New content
        #[arg(long, short = 'c', conflicts_with = "stdin")]
        content: Option<String>,

        /// Read new content from stdin
        #[arg(long)]
        stdin: bool,

        /// Add tags (can be specified multiple times)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Remove tags (can be specified multiple times)
        #[arg(long = "untag")]
        untags: Vec<String>,

        /// Move into a folder (ID or name)
        #[arg(long, short = 'f', conflicts_with = "unfile")]
        folder: Option<String>,

        /// Remove from its folder
        #[arg(long)]
        unfile: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a prompt
    Delete {
        /// Prompt ID or unique prefix
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Copy a prompt under a new ID
    Duplicate {
        /// Prompt ID or unique prefix
        id: String,
    },

    /// Toggle the favorite flag
    Favorite {
        /// Prompt ID or unique prefix
        id: String,
    },

    /// Toggle the pinned flag
    Pin {
        /// Prompt ID or unique prefix
        id: String,
    },

    /// Show saved versions of a prompt, newest first
    History {
        /// Prompt ID or unique prefix
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore a saved version
    Restore {
        /// Prompt ID or unique prefix
        id: String,

        /// Version ID or unique prefix
        version_id: String,
    },

    /// List the template variables of a prompt
    Vars {
        /// Prompt ID or unique prefix
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fill in template variables and print the result
    Render {
        /// Prompt ID or unique prefix
        id: String,

        /// Variable value in format "name=value" (can be specified multiple times)
        #[arg(long = "var")]
        vars: Vec<String>,
    },

    /// Manage folders
    Folder(FolderCommand),

    /// Export the vault as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Replace the vault with the contents of an export file
    Import {
        /// Export file (current or legacy format)
        file: PathBuf,
    },

    /// Write a markdown copy of the vault
    Snapshot {
        /// Output directory (default: .promptvault/snapshot)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show vault statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a prompt with the configured optimizer command
    Optimize {
        /// Prompt ID or unique prefix
        id: String,
    },

    /// Show or change vault settings
    Config {
        /// Folder (ID or name) for new prompts
        #[arg(long, conflicts_with = "clear_default_folder")]
        default_folder: Option<String>,

        /// Stop assigning new prompts to a folder
        #[arg(long)]
        clear_default_folder: bool,

        /// Show word counts in listings (true, false)
        #[arg(long)]
        word_count: Option<bool>,

        /// Optimizer program and its arguments
        #[arg(long, num_args = 1.., allow_hyphen_values = true, conflicts_with = "clear_optimizer")]
        optimizer: Option<Vec<String>>,

        /// Remove the optimizer command
        #[arg(long)]
        clear_optimizer: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct FolderCommand {
    #[command(subcommand)]
    pub action: FolderAction,
}

#[derive(Subcommand, Debug)]
pub enum FolderAction {
    /// Create a folder
    Add {
        /// Folder name
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List folders
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rename or restyle a folder
    Edit {
        /// Folder ID, name or unique prefix
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New icon
        #[arg(long)]
        icon: Option<String>,

        /// New color (one of the palette colors)
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a folder; its prompts become unfiled
    Delete {
        /// Folder ID, name or unique prefix
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}
