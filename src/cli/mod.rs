mod commands;
mod handlers;

pub use commands::{Cli, Commands, FolderAction, FolderCommand};
pub use handlers::{
    handle_add, handle_config, handle_delete, handle_duplicate, handle_edit, handle_export, handle_favorite,
    handle_folder_add, handle_folder_delete, handle_folder_edit, handle_folder_list, handle_get,
    handle_history, handle_import, handle_init, handle_list, handle_new, handle_optimize,
    handle_pin, handle_render, handle_restore, handle_snapshot, handle_stats, handle_vars,
};
