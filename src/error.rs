use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Network(String),

    #[error("http {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("invalid json: {0}")]
    Parse(String),

    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Parse and url failures are final; everything else may succeed on another attempt.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::Parse(_) | FetchError::InvalidUrl(_))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        FetchError::InvalidUrl(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot json: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no cache directory available")]
    NoCacheDir,
}

pub type FetchResult<T> = Result<T, FetchError>;
