use thiserror::Error;

use super::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum BookError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("book {id} not found")]
    NotFound { id: String },
    /// Store or connectivity failure.
    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl BookError {
    pub fn not_found(id: impl Into<String>) -> Self { Self::NotFound { id: id.into() } }
}
