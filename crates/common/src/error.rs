//! Error types shared across burnsub crates.

use std::path::PathBuf;

/// Top-level error type for burnsub operations.
#[derive(Debug, thiserror::Error)]
pub enum BurnsubError {
    #[error("Preparation error: {message}")]
    Preparation { message: String },

    #[error("Launch error: {message}")]
    Launch { message: String },

    #[error("Runtime error: {message}")]
    Runtime { message: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Subtitle error: {message}")]
    Subtitle { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using BurnsubError.
pub type BurnsubResult<T> = Result<T, BurnsubError>;

/// Phase of a render invocation in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Inputs could not be prepared; no process was launched.
    Preparation,
    /// The encoder could not be started.
    Launch,
    /// The encoder ran but did not produce a valid result.
    Runtime,
}

impl BurnsubError {
    pub fn preparation(msg: impl Into<String>) -> Self {
        Self::Preparation {
            message: msg.into(),
        }
    }

    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch {
            message: msg.into(),
        }
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime {
            message: msg.into(),
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn subtitle(msg: impl Into<String>) -> Self {
        Self::Subtitle {
            message: msg.into(),
        }
    }

    /// Classify this error into the render failure taxonomy.
    ///
    /// Anything that is not explicitly a launch or runtime failure happened
    /// before the encoder was started.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Launch { .. } => FailureKind::Launch,
            Self::Runtime { .. } => FailureKind::Runtime,
            _ => FailureKind::Preparation,
        }
    }
}
