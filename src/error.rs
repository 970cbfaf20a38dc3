//! Custom error types for kmerge

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for kmerge operations
#[derive(Error, Debug)]
pub enum KmergeError {
    #[error("'{0}' is not available\n\n  Install kubectl:\n    brew install kubectl\n    # or: https://kubernetes.io/docs/tasks/tools/")]
    ToolNotAvailable(String),

    #[error("source kubeconfig not found: {0}")]
    SourceFileMissing(PathBuf),

    #[error("merge failed: {0}")]
    MergeExecutionFailed(String),

    #[error("listing contexts failed: {0}")]
    ListingFailed(String),

    #[error("cannot update shell profile {path}: {source}")]
    ProfileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported shell: {0}. Helper installation supports: bash, zsh, fish")]
    UnsupportedShell(String),

    #[error("invalid settings file {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("cannot resolve home directory\n\n  HOME environment variable may not be set")]
    NoHomeDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for kmerge operations
pub type Result<T> = std::result::Result<T, KmergeError>;
