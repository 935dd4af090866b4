use std::path::PathBuf;

/// Convenience result type used across taxcomp.
pub type TaxcompResult<T> = Result<T, TaxcompError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum TaxcompError {
    /// The tabular source is missing, corrupt, or lacks the expected sheet.
    #[error("source unreadable: {0}")]
    SourceUnreadable(String),

    /// No cache artifact exists for the requested key.
    #[error("cache not found: '{}'", path.display())]
    CacheNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A cache artifact exists but does not have the expected shape.
    #[error("cache malformed: {0}")]
    CacheMalformed(String),

    /// Chart rasterization or animation encoding failed.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid configuration or caller-provided arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TaxcompError {
    /// Build a [`TaxcompError::SourceUnreadable`] value.
    pub fn source_unreadable(msg: impl Into<String>) -> Self {
        Self::SourceUnreadable(msg.into())
    }

    /// Build a [`TaxcompError::CacheNotFound`] value.
    pub fn cache_not_found(path: impl Into<PathBuf>) -> Self {
        Self::CacheNotFound { path: path.into() }
    }

    /// Build a [`TaxcompError::CacheMalformed`] value.
    pub fn cache_malformed(msg: impl Into<String>) -> Self {
        Self::CacheMalformed(msg.into())
    }

    /// Build a [`TaxcompError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`TaxcompError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether this error is the expected "no cache yet" branch.
    pub fn is_cache_not_found(&self) -> bool {
        matches!(self, Self::CacheNotFound { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
