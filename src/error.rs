//! Error types and exit codes for tracescope

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for tracescope operations
#[derive(Error, Debug)]
pub enum TraceScopeError {
    #[error("Trace database not found: {path}")]
    MissingDb { path: String },

    #[error("Not a trace database (no treenodes table): {path}")]
    InvalidDb { path: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Source root not found: {name}")]
    SourceRootNotFound { name: String },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("Watcher error: {message}")]
    Watcher { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TraceScopeError {
    /// Convert error to exit code:
    /// - 1: IO error
    /// - 2: Missing or invalid trace database
    /// - 3: Query failure
    /// - 4: Config error
    /// - 5: Other internal failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io(_) => ExitCode::from(1),
            Self::MissingDb { .. } => ExitCode::from(2),
            Self::InvalidDb { .. } => ExitCode::from(2),
            Self::Query { .. } => ExitCode::from(3),
            Self::Config { .. } => ExitCode::from(4),
            Self::SourceRootNotFound { .. } => ExitCode::from(5),
            Self::Watcher { .. } => ExitCode::from(5),
        }
    }
}

impl From<rusqlite::Error> for TraceScopeError {
    fn from(err: rusqlite::Error) -> Self {
        TraceScopeError::Query {
            message: err.to_string(),
        }
    }
}

/// Result type alias for tracescope operations
pub type Result<T> = std::result::Result<T, TraceScopeError>;
