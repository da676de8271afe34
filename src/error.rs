use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the review pipeline.
///
/// Failures that the lifecycle controller recovers from by restarting a job are
/// described by [`RestartCause`] and only escape through
/// [`ReviewError::RestartLimit`] when a finite restart cap is configured.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("credential exchange failed: {0}")]
    Auth(String),

    #[error("{source_label}: job submission was rejected")]
    SubmissionRejected { source_label: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}")]
    UnexpectedStatus { endpoint: &'static str, status: u16 },

    #[error("invalid JSON from remote: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("result payload is not a findings list: {0}")]
    Translation(String),

    #[error("{source_label}: giving up after {restarts} restarts (last cause: {cause})")]
    RestartLimit {
        source_label: String,
        restarts: u32,
        cause: RestartCause,
    },

    #[error("{tracker} rejected issue: {detail}")]
    Tracker {
        tracker: &'static str,
        detail: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why a polled job was abandoned in favour of a fresh submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartCause {
    RemoteFailure,
    TimeoutExceeded { elapsed: Duration },
    TransportRetriesExhausted { attempts: u32, last_error: String },
}

impl std::fmt::Display for RestartCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestartCause::RemoteFailure => write!(f, "remote reported FAILURE"),
            RestartCause::TimeoutExceeded { elapsed } => {
                write!(f, "execution took too long ({} seconds)", elapsed.as_secs())
            }
            RestartCause::TransportRetriesExhausted {
                attempts,
                last_error,
            } => write!(f, "{attempts} poll errors, last: {last_error}"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
