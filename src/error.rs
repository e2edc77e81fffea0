//! Error taxonomy. Mirrors the five kinds in the design's error-handling
//! section: argument, state, lookup, I/O and invariant errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("argument error: {0}")]
    Argument(String),

    #[error("state error: {0}")]
    State(String),

    #[error("lookup error: {0}")]
    Lookup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invariant error: {0}")]
    Invariant(String),
}

impl FsError {
    pub fn argument(msg: impl Into<String>) -> Self {
        FsError::Argument(msg.into())
    }
    pub fn state(msg: impl Into<String>) -> Self {
        FsError::State(msg.into())
    }
    pub fn lookup(msg: impl Into<String>) -> Self {
        FsError::Lookup(msg.into())
    }
    pub fn invariant(msg: impl Into<String>) -> Self {
        FsError::Invariant(msg.into())
    }
}

/// A command's user-visible failure: a friendly phrase prepended to the
/// technical error, as mandated for the dispatcher's output.
#[derive(Debug, Error)]
#[error("{friendly} Error {source}")]
pub struct CommandError {
    pub friendly: String,
    #[source]
    pub source: FsError,
}

impl CommandError {
    pub fn new(friendly: impl Into<String>, source: FsError) -> Self {
        CommandError {
            friendly: friendly.into(),
            source,
        }
    }
}
