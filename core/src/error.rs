use thiserror::Error;

/// Domain failures that callers branch on.
///
/// These travel inside `anyhow::Error`; use [`RecipeBoxError::classify`] to
/// recover the variant at an outer boundary (HTTP status, CLI exit code).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecipeBoxError {
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
}

impl RecipeBoxError {
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Find a domain error anywhere in the error chain.
    #[must_use]
    pub fn classify(err: &anyhow::Error) -> Option<&Self> {
        err.chain().find_map(|cause| cause.downcast_ref::<Self>())
    }
}
