//! Error types for the station HTTP clients

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the stream-status, token and music-service clients
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The access token was rejected (401)
    #[error("access token rejected")]
    Unauthorized,

    /// Any other non-success status
    #[error("unexpected HTTP status: {0}")]
    Status(u16),

    /// A track payload without the fields needed to display it
    #[error("malformed track payload: {0}")]
    MalformedTrack(&'static str),

    /// The token endpoint answered OK without a usable token
    #[error("token endpoint returned an empty token")]
    MalformedToken,
}

impl Error {
    /// Whether the music service asked for a fresh token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized)
    }
}
