use clap::Parser;
use promptvault::cli::{
    handle_add, handle_config, handle_delete, handle_duplicate, handle_edit, handle_export, handle_favorite,
    handle_folder_add, handle_folder_delete, handle_folder_edit, handle_folder_list, handle_get,
    handle_history, handle_import, handle_init, handle_list, handle_new, handle_optimize,
    handle_pin, handle_render, handle_restore, handle_snapshot, handle_stats, handle_vars, Cli,
    Commands, FolderAction,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("promptvault=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("promptvault=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init { backend } => handle_init(backend),
        Commands::New { folder, json } => handle_new(folder, json),
        Commands::Add {
            title,
            content,
            stdin,
            tags,
            folder,
            json,
        } => handle_add(title, content, stdin, tags, folder, json),
        Commands::List { query, sort, json } => handle_list(query, sort, json),
        Commands::Get { id, json } => handle_get(id, json),
        Commands::Edit {
            id,
            title,
            content,
            stdin,
            tags,
            untags,
            folder,
            unfile,
            json,
        } => handle_edit(id, title, content, stdin, tags, untags, folder, unfile, json),
        Commands::Delete { id, force } => handle_delete(id, force),
        Commands::Duplicate { id } => handle_duplicate(id),
        Commands::Favorite { id } => handle_favorite(id),
        Commands::Pin { id } => handle_pin(id),
        Commands::History { id, json } => handle_history(id, json),
        Commands::Restore { id, version_id } => handle_restore(id, version_id),
        Commands::Vars { id, json } => handle_vars(id, json),
        Commands::Render { id, vars } => handle_render(id, vars),
        Commands::Folder(folder_cmd) => match folder_cmd.action {
            FolderAction::Add { name, json } => handle_folder_add(name, json),
            FolderAction::List { json } => handle_folder_list(json),
            FolderAction::Edit {
                id,
                name,
                icon,
                color,
            } => handle_folder_edit(id, name, icon, color),
            FolderAction::Delete { id, force } => handle_folder_delete(id, force),
        },
        Commands::Export { output } => handle_export(output),
        Commands::Import { file } => handle_import(file),
        Commands::Snapshot { output } => handle_snapshot(output),
        Commands::Stats { json } => handle_stats(json),
        Commands::Optimize { id } => handle_optimize(id),
        Commands::Config {
            default_folder,
            clear_default_folder,
            word_count,
            optimizer,
            clear_optimizer,
            json,
        } => handle_config(
            default_folder,
            clear_default_folder,
            word_count,
            optimizer,
            clear_optimizer,
            json,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
