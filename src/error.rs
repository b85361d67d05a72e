//! Unified error type for evaluation runs.
//!
//! Per-file errors (`GroupCountMismatch`, `MalformedRecord`, `InvalidDocument`,
//! `Io`, `Json`) are local: the batch reports them and moves on. `UnknownRoute`
//! and `Config` abort a run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while ingesting, aggregating or rendering fixes.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A fix group does not have one fix per reference point.
    #[error("{}: fix count mismatch, got {observed} fixes for {expected} reference points", file.display())]
    GroupCountMismatch {
        file: PathBuf,
        observed: usize,
        expected: usize,
    },

    /// A record is missing its coordinates or carries non-numeric ones.
    #[error("{}: malformed record {index}: {reason}", file.display())]
    MalformedRecord {
        file: PathBuf,
        index: String,
        reason: String,
    },

    /// The top-level JSON value is neither an object nor an array.
    #[error("{}: invalid fix document: {reason}", file.display())]
    InvalidDocument { file: PathBuf, reason: String },

    /// An accuracy mode has no samples.
    #[error("no error samples for accuracy mode '{mode}'")]
    EmptyPopulation { mode: String },

    /// A route directory was discovered without a matching route definition.
    #[error("no route definition for directory {}", directory.display())]
    UnknownRoute { directory: PathBuf },

    /// Samples were submitted for a mode that is not configured.
    #[error("accuracy mode '{mode}' is not configured")]
    UnknownMode { mode: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("rendering failed: {0}")]
    Render(String),
}

impl EvalError {
    /// Whether this error aborts the whole batch rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EvalError::UnknownRoute { .. } | EvalError::Config(_))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EvalError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Convert missing statistics into explicit errors.
pub trait OptionExt<T> {
    /// Map `None` to [`EvalError::EmptyPopulation`] for `mode`.
    fn ok_or_empty_population(self, mode: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_empty_population(self, mode: &str) -> Result<T> {
        self.ok_or_else(|| EvalError::EmptyPopulation {
            mode: mode.to_string(),
        })
    }
}
