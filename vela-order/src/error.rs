use crate::store::StoreError;

/// Error taxonomy surfaced by the order operations. The HTTP layer maps each
/// variant to a distinguishable response class.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Actor not authorized: {0}")]
    Forbidden(String),

    #[error("Operation illegal in current state: {0}")]
    InvalidState(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Concurrent update lost after retries: {0}")]
    Conflict(String),

    #[error("Collaborator failure: {0}")]
    Dependency(String),

    #[error("Invalid order input: {0}")]
    Validation(String),
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => OrderError::NotFound(id.to_string()),
            StoreError::RevisionConflict(id) => OrderError::Conflict(id.to_string()),
            StoreError::Backend(msg) => OrderError::Dependency(msg),
        }
    }
}
