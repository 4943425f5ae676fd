use riff_library::LibraryError;
use thiserror::Error;

/// Errors surfaced by the studio and its proxy client.
#[derive(Debug, Error)]
pub enum StudioError {
    /// The proxy could not be reached or the connection broke mid-request.
    #[error("request failed: {0}")]
    Transport(String),

    /// The proxy answered with a non-2xx status; `message` is its `error` field.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// A 2xx response whose body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("library error: {0}")]
    Library(#[from] LibraryError),

    #[error("invalid proxy URL: {0}")]
    InvalidUrl(String),

    #[error("no track in slot {0}")]
    InvalidIndex(usize),

    /// A user-facing failure of a studio action.
    #[error("{0}")]
    Failed(String),
}

impl StudioError {
    /// `true` when the proxy itself answered with an error status.
    pub fn is_rejection(&self) -> bool {
        matches!(self, StudioError::Rejected { .. })
    }
}

impl From<reqwest::Error> for StudioError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StudioError::Decode(e.to_string())
        } else {
            StudioError::Transport(e.to_string())
        }
    }
}
