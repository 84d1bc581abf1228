pub mod types;
pub mod client;

pub use types::*;
pub use client::*;

use std::time::Duration;

use thiserror::Error;

/// Failures of the remote classification call. None of these are terminal:
/// the orchestrator records them and falls back to the local pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("No remote classification endpoint configured")]
    NotConfigured,

    #[error("Remote classifier is not reachable at {0}")]
    Connection(String),

    #[error("Remote classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("Remote classifier returned error (status {status}): {body}")]
    Http { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Remote label not recognised: {0}")]
    UnknownLabel(String),

    #[error("Remote confidence out of range: {0}")]
    InvalidConfidence(f32),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
