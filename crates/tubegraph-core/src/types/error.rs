//! Error types and handling for tubegraph
//!
//! Every core operation returns [`Result`]. The five error kinds are the
//! only outcomes a caller has to distinguish; nested store and media errors
//! collapse into them through [`Error::kind`].

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing input, self-subscription, duplicate playlist entry
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced entity or edge is absent
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Actor is not the owner of the entity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Unexpected concurrent state that could not be reconciled
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal failure, including incomplete cascades
    #[error("Internal error: {0}")]
    Internal(String),

    /// Entity store failures
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Media store failures
    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}

/// Entity store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store observed a state for a unique key it cannot reconcile
    #[error("Conflicting concurrent write: {0}")]
    Conflict(String),

    /// A stored row could not be (de)serialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row is structurally invalid
    #[error("Data corruption detected: {0}")]
    Corruption(String),

    /// The backing store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Media store errors
#[derive(Error, Debug)]
pub enum MediaError {
    /// The locator does not reference stored media
    #[error("Media not found: {0}")]
    NotFound(String),

    /// The media store did not answer in time
    #[error("Media operation timed out after {0} ms")]
    Timeout(u64),

    /// Underlying I/O failure
    #[error("Media I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The media store refused the request
    #[error("Media store rejected request: {0}")]
    Rejected(String),
}

/// The five outcomes a caller maps to a transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 400
    InvalidArgument,
    /// 404
    NotFound,
    /// 401
    Unauthorized,
    /// 409
    Conflict,
    /// 500
    Internal,
}

impl ErrorKind {
    /// Transport status for this kind
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::InvalidArgument => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Conflict(_) | Error::Storage(StoreError::Conflict(_)) => ErrorKind::Conflict,
            Error::Internal(_) | Error::Storage(_) | Error::Media(_) => ErrorKind::Internal,
        }
    }

    /// Transport status code for this error
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

/// Parse an identifier-shaped parameter, failing as InvalidArgument
pub fn parse_id(what: &str, raw: &str) -> Result<crate::types::ID16> {
    raw.trim()
        .parse()
        .map_err(|reason| Error::invalid_argument(format!("{what} id '{raw}' is malformed: {reason}")))
}
