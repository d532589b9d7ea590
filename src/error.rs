use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Not in a promptvault project. Run 'promptvault init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .promptvault/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Ambiguous id '{0}' matches more than one record")]
    AmbiguousId(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Optimizer failed: {0}")]
    Optimizer(String),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons an import document was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("expected a prompt array or an object with a 'prompts' field")]
    UnrecognizedShape,

    #[error("document schema version {0} is newer than this build supports")]
    UnsupportedVersion(u32),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;
