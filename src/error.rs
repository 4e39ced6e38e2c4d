//! Error types for the dashboard client.
//!
//! Failures are split by where they happen so each category can be logged
//! distinctly: the one-time range fetch at startup, and the per-interaction
//! refresh. Malformed individual records are not errors at this level; the
//! decoder skips them and logs a warning.

use thiserror::Error;

/// Failures talking to the backend API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status code.
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The payload was not the expected JSON shape.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures surfaced by the dashboard controller.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Value ranges could not be loaded; the dashboard cannot start.
    #[error("startup range fetch failed: {0}")]
    Startup(#[source] ApiError),

    /// A refresh failed; the previous render is still in place.
    #[error("refresh failed: {0}")]
    Refresh(#[source] ApiError),
}

/// Result alias for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;
