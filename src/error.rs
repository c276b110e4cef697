//! Error types for the digest pipeline.

use crate::llm::ModelError;
use webdigest_search::SearchError;

/// Broad error categories, used to decide how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credential or invalid configuration, raised before a run starts.
    Configuration,
    /// A search or model call failed; the run is aborted.
    Collaborator,
    /// The run produced no usable data.
    Data,
    /// The run was cancelled by the caller.
    Cancelled,
}

/// Top-level error type for a digest run.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Search collaborator failure.
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Model collaborator failure.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// An external call exceeded its per-call deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The run was cancelled.
    #[error("run cancelled")]
    Cancelled,

    /// Nothing survived deduplication and the recency window.
    #[error("no recent results found for this topic and window ({window_days} days)")]
    NoRecentResults {
        /// The active recency window.
        window_days: u32,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DigestError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Search(e) if e.is_config() => ErrorKind::Configuration,
            Self::Model(e) if e.code() == crate::llm::error_codes::CONFIG_INVALID => {
                ErrorKind::Configuration
            }
            Self::Search(_) | Self::Model(_) | Self::Timeout(_) | Self::Io(_) => {
                ErrorKind::Collaborator
            }
            Self::NoRecentResults { .. } => ErrorKind::Data,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, DigestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_configuration_kind() {
        assert_eq!(
            DigestError::Config("rounds".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            DigestError::from(SearchError::Config("no key".into())).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            DigestError::from(ModelError::ConfigError("no key".into())).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn transport_errors_are_collaborator_kind() {
        assert_eq!(
            DigestError::from(SearchError::Http("500".into())).kind(),
            ErrorKind::Collaborator
        );
        assert_eq!(
            DigestError::from(ModelError::AuthError("401".into())).kind(),
            ErrorKind::Collaborator
        );
        assert_eq!(
            DigestError::Timeout("search".into()).kind(),
            ErrorKind::Collaborator
        );
    }

    #[test]
    fn empty_pool_is_data_kind() {
        let err = DigestError::NoRecentResults { window_days: 7 };
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.to_string().contains("7 days"));
    }

    #[test]
    fn cancelled_kind() {
        assert_eq!(DigestError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn model_error_display_keeps_code() {
        let err = DigestError::from(ModelError::RequestError("boom".into()));
        assert!(err.to_string().contains("REQUEST_FAILED"));
    }
}
