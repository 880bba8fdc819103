// src/error.rs
//! Failure taxonomy shared by the rendering collaborator, the extractors and the
//! shop fan-out. None of these ever escape the reconciler / fan-out boundary.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScrapeError {
    /// Site unreachable, navigation aborted, or the page load exceeded its budget.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A required selector or condition did not materialize in time.
    #[error("timed out after {}ms waiting for {what}", .after.as_millis())]
    Timeout { what: String, after: Duration },

    /// Expected elements are absent or zero rows parsed ("wrong layout" / "page changed").
    #[error("page structure mismatch: {0}")]
    Structure(String),

    /// A selector string failed to parse.
    #[error("invalid selector `{0}`")]
    Selector(String),

    /// Engine/profile/page missing, not started, or already closed.
    #[error("browser engine unavailable: {0}")]
    Engine(String),
}

impl ScrapeError {
    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn engine(reason: impl ToString) -> Self {
        Self::Engine(reason.to_string())
    }

    /// Short label used as a metrics/log outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Navigation { .. } => "navigation",
            ScrapeError::Timeout { .. } => "timeout",
            ScrapeError::Structure(_) => "structure",
            ScrapeError::Selector(_) => "selector",
            ScrapeError::Engine(_) => "engine",
        }
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
