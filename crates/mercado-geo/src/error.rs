use thiserror::Error;

/// Failure reported by a [`crate::MarketDataSource`] implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SourceError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("data source unavailable: {0}")]
    Upstream(#[from] SourceError),

    #[error("operation cancelled")]
    Cancelled,
}

impl GeoError {
    /// `true` when the caller sent bad input, as opposed to a server-side failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, GeoError::InvalidArgument(_))
    }
}
