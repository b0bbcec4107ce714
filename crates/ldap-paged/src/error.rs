//! Paged search error types
//!
//! Error definitions with transient/permanent classification. Release
//! failures are produced by collaborators but never escape
//! [`PaginatedResultIterator::close`](crate::iterator::PaginatedResultIterator::close).

use thiserror::Error;

/// Error that can occur while collecting or releasing paged search results.
#[derive(Debug, Error)]
pub enum PagingError {
    // Caller errors (permanent)
    /// The caller supplied absent or malformed input.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Client configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Directory errors
    /// Failed to establish a connection to the directory server.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The bind was rejected.
    #[error("authentication failed: invalid credentials")]
    AuthenticationFailed,

    /// A search request failed.
    #[error("search failed: {message}")]
    SearchFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server returned data we could not interpret.
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    // Cleanup errors
    /// Releasing the resources behind one result page failed.
    #[error("failed to release result handle: {message}")]
    ResourceReleaseFailure {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PagingError {
    /// Check if this error is transient and the operation may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PagingError::ConnectionFailed { .. } | PagingError::SearchFailed { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            PagingError::InvalidInput { .. } => "INVALID_INPUT",
            PagingError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            PagingError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            PagingError::AuthenticationFailed => "AUTH_FAILED",
            PagingError::SearchFailed { .. } => "SEARCH_FAILED",
            PagingError::InvalidData { .. } => "INVALID_DATA",
            PagingError::ResourceReleaseFailure { .. } => "RELEASE_FAILED",
        }
    }

    // Convenience constructors

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        PagingError::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        PagingError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        PagingError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PagingError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a search failed error.
    pub fn search_failed(message: impl Into<String>) -> Self {
        PagingError::SearchFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a search failed error with source.
    pub fn search_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PagingError::SearchFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a release failure.
    pub fn release_failed(message: impl Into<String>) -> Self {
        PagingError::ResourceReleaseFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Create a release failure with source.
    pub fn release_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PagingError::ResourceReleaseFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for paged search operations.
pub type PagingResult<T> = Result<T, PagingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        let transient = vec![
            PagingError::connection_failed("down"),
            PagingError::search_failed("busy"),
        ];

        for err in transient {
            assert!(err.is_transient(), "Expected {} to be transient", err.error_code());
        }
    }

    #[test]
    fn test_permanent_errors() {
        let permanent = vec![
            PagingError::invalid_input("no entries given"),
            PagingError::invalid_configuration("host is required"),
            PagingError::AuthenticationFailed,
            PagingError::release_failed("gone"),
        ];

        for err in permanent {
            assert!(err.is_permanent(), "Expected {} to be permanent", err.error_code());
        }
    }

    #[test]
    fn test_error_display() {
        let err = PagingError::invalid_input("No entries given");
        assert_eq!(err.to_string(), "invalid input: No entries given");
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let err = PagingError::release_failed("page 3");
        assert_eq!(err.to_string(), "failed to release result handle: page 3");
    }

    #[test]
    fn test_error_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "socket closed");
        let err = PagingError::release_failed_with_source("page 1", io);

        match &err {
            PagingError::ResourceReleaseFailure { source, .. } => assert!(source.is_some()),
            other => panic!("Expected ResourceReleaseFailure, got {other:?}"),
        }
        assert!(std::error::Error::source(&err).is_some());
    }
}
