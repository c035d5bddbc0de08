//! Error types for the file-share control plane
//!
//! Provides structured error types for catalog access, backend dispatch,
//! lifecycle orchestration, and the REST surface.

use thiserror::Error;

/// Unified error type for the control plane
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Request Errors
    // =========================================================================
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request canceled by caller")]
    Canceled,

    // =========================================================================
    // Resource Errors
    // =========================================================================
    #[error("Resource not found: {kind}/{id}")]
    NotFound { kind: String, id: String },

    #[error("Conflict on {kind}/{id}: {reason}")]
    Conflict {
        kind: String,
        id: String,
        reason: String,
    },

    // =========================================================================
    // Catalog Errors
    // =========================================================================
    #[error("Catalog failure: {0}")]
    CatalogFailure(String),

    // =========================================================================
    // Dispatch Errors
    // =========================================================================
    #[error("Backend dispatch failed: {operation}: {reason}")]
    DispatchFailed { operation: String, reason: String },

    #[error("Driver unreachable: {0}")]
    DriverUnreachable(#[from] reqwest::Error),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a typed not-found error.
    pub fn not_found(kind: &str, id: &str) -> Self {
        Error::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Check if this error is transient and worth retrying at the dispatch layer
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::DriverUnreachable(_) | Error::CatalogFailure(_)
        )
    }

    /// HTTP status family this error maps to. Every failure path surfaces
    /// exactly one externally observable status.
    pub fn status_family(&self) -> StatusFamily {
        match self {
            Error::NotFound { .. } => StatusFamily::NotFound,
            Error::InvalidRequest(_) => StatusFamily::BadRequest,
            Error::Conflict { .. } => StatusFamily::Conflict,
            Error::Canceled
            | Error::Internal(_)
            | Error::Configuration(_)
            | Error::CatalogFailure(_)
            | Error::DispatchFailed { .. }
            | Error::DriverUnreachable(_)
            | Error::JsonParse(_)
            | Error::Io(_) => StatusFamily::ServerError,
        }
    }
}

/// Coarse HTTP status mapping used by the REST layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFamily {
    BadRequest,
    NotFound,
    Conflict,
    ServerError,
}

/// Result type alias for the control plane
pub type Result<T> = std::result::Result<T, Error>;
