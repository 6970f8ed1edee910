//! Error types for token cache operations

/// Errors from building a token cache or refreshing its token.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid token cache configuration: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token request timed out: {0}")]
    Timeout(String),

    #[error("token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid token response: {0}")]
    Decode(String),
}

impl From<common::Error> for Error {
    fn from(err: common::Error) -> Self {
        match err {
            common::Error::Config(msg) => Error::Config(msg),
            other => Error::Config(other.to_string()),
        }
    }
}

/// Result alias for token cache operations.
pub type Result<T> = std::result::Result<T, Error>;
