use std::path::PathBuf;
use thiserror::Error;

/// Generic message shown when no interpretable response came back.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze video. Please try again.";

/// Error text stored in the synthetic result of a transport failure.
pub const NETWORK_ERROR: &str = "network error";

/// Input problems caught before any network call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a video file")]
    MissingFile,

    #[error("The selected video file is empty")]
    EmptyFile,

    #[error("Please select an analysis type")]
    MissingAnalysisType,

    #[error("Please enter a custom prompt for custom analysis")]
    MissingCustomPrompt,

    #[error("An analysis is already in progress")]
    RequestInFlight,
}

/// No interpretable response: network failure, timeout, or an undecodable body.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response (HTTP {status}): {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The backend answered but reported a failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{detail}")]
pub struct RemoteAnalysisError {
    pub status: Option<u16>,
    pub detail: String,
}

/// Outcome of a failed backend call.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Remote(#[from] RemoteAnalysisError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(TransportError::Network(err))
    }
}

#[derive(Error, Debug)]
#[error("could not fetch options")]
pub struct OptionsFetchError {
    #[source]
    pub source: ClientError,
}

#[derive(Error, Debug)]
pub enum InterpreterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    OptionsFetch(#[from] OptionsFetchError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, InterpreterError>;
