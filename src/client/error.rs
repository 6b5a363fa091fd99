//! Error types for backend lookups.
//!
//! This module defines structured errors for PubChem lookup operations,
//! providing context-rich error messages for debugging and user feedback.

use thiserror::Error;

/// Errors that can occur during a backend lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error querying {query}: {source}")]
    Network {
        /// The query that failed.
        query: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout querying {query}")]
    Timeout {
        /// The query that timed out.
        query: String,
    },

    /// HTTP error response that survived the retry budget.
    #[error("HTTP {status} querying {query}")]
    HttpStatus {
        /// The query that returned an error status.
        query: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present (for 429 responses).
        retry_after: Option<String>,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {detail}")]
    Build {
        /// What went wrong during construction.
        detail: String,
    },
}

impl LookupError {
    /// Creates a network error from a reqwest error.
    pub fn network(query: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            query: query.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(query: impl Into<String>) -> Self {
        Self::Timeout {
            query: query.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(query: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            query: query.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error with a Retry-After header value.
    pub fn http_status_with_retry_after(
        query: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            query: query.into(),
            status,
            retry_after,
        }
    }

    /// Creates a client construction error.
    pub fn build(detail: impl Into<String>) -> Self {
        Self::Build {
            detail: detail.into(),
        }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` because our error
// variants require context (the query) that the source error doesn't provide.
// The helper constructors are the correct pattern here as they force callers
// to attach that context.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_error_timeout_display() {
        let error = LookupError::timeout("curcumin");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("curcumin"));
    }

    #[test]
    fn test_lookup_error_http_status_display() {
        let error = LookupError::http_status("quercetin", 503);
        let msg = error.to_string();
        assert!(msg.contains("503"), "Expected '503' in: {msg}");
        assert!(msg.contains("quercetin"), "Expected query in: {msg}");
    }

    #[test]
    fn test_lookup_error_http_status_retains_retry_after() {
        let error =
            LookupError::http_status_with_retry_after("curcumin", 429, Some("30".to_string()));
        if let LookupError::HttpStatus { retry_after, .. } = &error {
            assert_eq!(retry_after.as_deref(), Some("30"));
        } else {
            panic!("expected HttpStatus variant");
        }
    }

    #[test]
    fn test_lookup_error_build_display() {
        let error = LookupError::build("invalid timeout");
        let msg = error.to_string();
        assert!(msg.contains("build"), "Expected 'build' in: {msg}");
        assert!(msg.contains("invalid timeout"), "Expected detail in: {msg}");
    }
}
