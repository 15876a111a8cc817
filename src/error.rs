//! Error types for the recommendation engine
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Fatal error raised while loading the knowledge-base snapshot.
///
/// A load failure is never retried: the engine cannot serve without the
/// embedding model, the idf table and both corpora.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Knowledge-base artifact not found: '{path}'")]
    MissingArtifact { path: PathBuf },

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Artifact '{path}' is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error(
        "Embedding dimension mismatch in '{path}' at entry {entry}: expected {expected}, got {actual}"
    )]
    DimensionMismatch {
        path: PathBuf,
        entry: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Embedding model '{path}' contains no vectors")]
    EmptyModel { path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl LoadError {
    /// Get a stable status code for this error type.
    pub fn status_code(&self) -> String {
        match self {
            Self::MissingArtifact { .. } => "ARTIFACT_MISSING",
            Self::Io { .. } => "ARTIFACT_IO_ERROR",
            Self::Corrupt { .. } => "ARTIFACT_CORRUPT",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::EmptyModel { .. } => "EMPTY_MODEL",
            Self::Config { .. } => "CONFIG_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::MissingArtifact { .. } => vec![
                "Check `data.dir` and the artifact file names in .apirec/settings.toml",
                "Override the location with APIREC_DATA__DIR=/path/to/snapshot",
            ],
            Self::Io { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::Corrupt { .. } => vec![
                "Re-export the knowledge-base snapshot",
                "Verify `data.embedding_format` matches the model file (text or binary)",
            ],
            Self::DimensionMismatch { .. } | Self::EmptyModel { .. } => vec![
                "All word vectors must come from the same embedding model",
                "Verify `data.embedding_format` matches the model file (text or binary)",
            ],
            Self::Config { .. } => vec!["Run 'apirec config' to inspect the active settings"],
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::MissingArtifact { path }
        } else {
            Self::Io { path, source }
        }
    }
}

/// Errors surfaced by [`crate::IndexService`].
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    /// The one-time load failed. Every caller sees the same failure.
    #[error("Knowledge base failed to load: {0}")]
    Load(Arc<LoadError>),
}

impl ServiceError {
    /// The underlying load failure.
    pub fn load_error(&self) -> &LoadError {
        match self {
            Self::Load(e) => e,
        }
    }
}

/// Errors surfaced by [`crate::pool::WorkerPool`].
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Worker pool is shut down; no worker accepted the task")]
    Disconnected,

    #[error("Worker dropped the task before replying (worker thread panicked)")]
    WorkerLost,

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Errors from [`crate::eval::evaluate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("{predictions} prediction list(s) but {answers} answer set(s)")]
    LengthMismatch { predictions: usize, answers: usize },
}

/// Result type alias for load operations
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for pool operations
pub type PoolResult<T> = Result<T, PoolError>;
