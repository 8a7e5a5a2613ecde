use thiserror::Error;

/// Failures from the fallible edges of the shell (settings files, the search service).
/// Tab operations themselves never fail; they degrade to no-ops.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("search server error: {0}")]
    Server(String),
}

/// Errors reported by an embedded content view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentViewError {
    /// The view exists but has no committed URL yet (mid-navigation, crashed renderer...).
    #[error("content view url is not available")]
    UrlUnavailable,

    #[error("content view is gone: {0}")]
    Detached(String),
}
