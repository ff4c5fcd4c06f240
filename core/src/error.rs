//! Error types for the debriefing pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// A single grammar's reason for rejecting a telemetry log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (byte {offset})")]
pub struct GrammarError {
    pub offset: usize,
    pub reason: String,
}

impl GrammarError {
    pub fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

/// Neither log grammar could make sense of the input.
#[derive(Debug, Clone, Error)]
#[error("telemetry log matches no known grammar (structured: {structured}; flat: {flat})")]
pub struct StructuralParseError {
    /// The offending log text.
    pub input: String,
    pub structured: GrammarError,
    pub flat: GrammarError,
}

/// Errors surfaced by the debriefing pipeline.
#[derive(Debug, Error)]
pub enum DebriefError {
    #[error(transparent)]
    Parse(#[from] StructuralParseError),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot watch {path:?}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("invalid mission snapshot {path:?}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot synthesize mission outcome: {0}")]
    Synthesis(String),
}

impl DebriefError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn watch(path: impl Into<PathBuf>, source: notify::Error) -> Self {
        Self::Watch {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DebriefError>;
