pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod migration;
pub mod optimize;
pub mod search;
pub mod snapshot;
pub mod storage;
pub mod template;
pub mod vault;

pub use error::{ImportError, Result, VaultError};
pub use storage::{DocumentStore, PromptStorage, SqliteStore, Workspace};
pub use vault::Vault;
