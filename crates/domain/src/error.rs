use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("No listing found on this page")]
    ListingNotFound,

    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Sign in required")]
    Unauthenticated,

    #[error("Only the author can do this")]
    Forbidden,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Page agent unavailable: {0}")]
    ResolverUnavailable(String),

    #[error("Store failure: {0}")]
    StoreFailure(String),
}

impl BoardError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BoardError::ListingNotFound | BoardError::CommentNotFound(_))
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        BoardError::StoreFailure(err.to_string())
    }
}
