//! Actions adapter error types.

use codematic_domain::error::CodematicError;

/// Errors raised while setting up the built-in handlers.
#[derive(Debug, thiserror::Error)]
pub enum ActionsError {
    /// The HTTP client backing the `request` action could not be built.
    #[error("failed to build HTTP client")]
    HttpClient(#[from] reqwest::Error),
}

impl From<ActionsError> for CodematicError {
    fn from(err: ActionsError) -> Self {
        Self::Setup(Box::new(err))
    }
}
