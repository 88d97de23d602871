//! Error types for the SmartMeds domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the top-level [`Error`]
//! aggregates them for callers that drive a whole pipeline.

use thiserror::Error;

/// The top-level error type for all SmartMeds operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Record store errors ---
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    // --- Classification errors ---
    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    // --- Advice errors ---
    #[error("Advice error: {0}")]
    Advice(#[from] AdviceError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the text-generation service transport.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of the external record store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Connection or authentication to the store failed. Nothing was written.
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// The column to write does not line up with the snapshot it came from.
    #[error("Column alignment mismatch: snapshot has {expected} rows, got {actual} values")]
    Alignment { expected: usize, actual: usize },

    /// The bulk write was rejected by the store.
    #[error("Write to {range} failed: {reason}")]
    WriteFailed { range: String, reason: String },

    #[error("Malformed table: {0}")]
    Malformed(String),
}

/// Failures while classifying a single record.
#[derive(Debug, Clone, Error)]
pub enum ClassifyError {
    /// The text-generation call failed or timed out.
    #[error("External service error: {0}")]
    ExternalService(#[from] ProviderError),
}

/// Failures of the single-case advice path.
#[derive(Debug, Clone, Error)]
pub enum AdviceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Advice generation failed: {0}")]
    Generation(#[source] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn alignment_error_names_both_lengths() {
        let err = Error::Store(StoreError::Alignment {
            expected: 3,
            actual: 2,
        });
        let text = err.to_string();
        assert!(text.contains("3 rows"));
        assert!(text.contains("2 values"));
    }

    #[test]
    fn classify_error_wraps_provider_error() {
        let err: ClassifyError = ProviderError::Timeout("120s".into()).into();
        assert!(matches!(err, ClassifyError::ExternalService(ProviderError::Timeout(_))));
        assert!(err.to_string().contains("External service error"));
    }

    #[test]
    fn advice_generation_keeps_source() {
        use std::error::Error as _;
        let err = AdviceError::Generation(ProviderError::Network("reset".into()));
        assert!(err.source().is_some());
    }
}
