/// Error types for sunpath calculations
use thiserror::Error;

/// Main error type for the calculation pipeline
#[derive(Error, Debug)]
pub enum SunpathError {
    /// Out-of-range coordinates, date, object height or time window
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The astronomical engine returned an unexpected or empty shape
    #[error("Astronomical data missing: {0}")]
    UpstreamDataMissing(String),

    /// The cache store could not be reached
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Unexpected arithmetic failure or malformed intermediate state
    #[error("Computation failed: {0}")]
    ComputationError(String),

    /// Failed to encode or decode a JSON payload
    #[error("Failed to serialize data: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SunpathError {
    /// True for errors caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SunpathError::InvalidInput(_))
    }

    /// Message safe to hand back to a caller.
    ///
    /// Input errors carry their description; everything else collapses to a
    /// generic message so internal state is not leaked.
    pub fn public_message(&self) -> String {
        match self {
            SunpathError::InvalidInput(_) => self.to_string(),
            SunpathError::UpstreamDataMissing(_)
            | SunpathError::ComputationError(_)
            | SunpathError::Serialization(_) => "Internal calculation error".to_string(),
            SunpathError::CacheUnavailable(_) => "Cache unavailable".to_string(),
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SunpathError::InvalidInput(msg.into())
    }
}

/// Type alias for Results using SunpathError
pub type Result<T> = std::result::Result<T, SunpathError>;
