use std::io;
use std::time::Duration;

use thiserror::Error;

/// Input rejected at the session boundary before it reaches the scheduler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username must be 1-20 alphanumeric characters, got {0:?}")]
    BadUsername(String),

    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("not a queue index: {0:?}")]
    InvalidIndex(String),

    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
}

/// Failures turning a submitted URL or search query into something playable.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("could not run resolver: {0}")]
    Spawn(#[from] io::Error),

    #[error("resolver exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("unreadable resolver output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("nothing found for {0:?}")]
    NoResult(String),
}

/// Failures talking to the playback backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("an add is already in flight")]
    ConcurrencyViolation,

    #[error("backend rejected {command:?}: {message}")]
    Command { command: String, message: String },

    #[error("backend protocol error: {0}")]
    Protocol(String),

    #[error("backend connection error: {0}")]
    Io(#[from] io::Error),
}

/// Everything that can end a play attempt early.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("backend did not finish the song within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
