//! Sync client errors

use thiserror::Error;

/// Failures talking to the backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode {endpoint} response: {reason}")]
    Decode {
        endpoint: &'static str,
        reason: String,
    },

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Errors surfaced by session operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// Rejected locally, nothing was sent
    #[error("Address is empty")]
    EmptyAddress,

    /// Rejected locally, nothing was sent
    #[error("{0} is not a registered miner")]
    NotRegistered(String),

    /// Rejected locally, nothing was sent
    #[error("Miner {0} has already submitted this round")]
    AlreadySubmitted(String),

    /// Rejected locally, nothing was sent
    #[error("Submission for {0} is still in flight")]
    SubmissionPending(String),

    #[error("No round has been started")]
    NoActiveRound,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SyncError {
    /// True for policy violations rejected before any network call
    pub fn is_local(&self) -> bool {
        !matches!(self, SyncError::Backend(_))
    }
}

/// Errors parsing a console action
#[derive(Error, Debug, PartialEq)]
pub enum ActionParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Action `{action}` requires <{argument}>")]
    MissingArgument {
        action: &'static str,
        argument: &'static str,
    },

    #[error("Invalid time: {0}")]
    InvalidTime(String),
}
