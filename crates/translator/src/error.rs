//! Error types for translation calls

/// Errors from resolving a token cache or calling the translator endpoint.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid state configuration: {0}")]
    Config(String),

    #[error("state not found: {0}")]
    NotFound(String),

    #[error("state '{0}' is not a translation token cache")]
    Type(String),

    #[error("access token unavailable: {0}")]
    Auth(#[from] ms_auth::Error),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("translator request timed out: {0}")]
    Timeout(String),

    #[error("translator endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid translation response: {0}")]
    Decode(String),
}

impl Error {
    /// Stable label for metrics and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::NotFound(_) => "not_found",
            Error::Type(_) => "type",
            Error::Auth(_) => "auth",
            Error::Http(_) => "http",
            Error::Timeout(_) => "timeout",
            Error::Status { .. } => "status",
            Error::Decode(_) => "decode",
        }
    }

    /// Whether an upstream call ran out of time, on either endpoint.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::Auth(ms_auth::Error::Timeout(_)))
    }
}

/// Result alias for translation operations.
pub type Result<T> = std::result::Result<T, Error>;
