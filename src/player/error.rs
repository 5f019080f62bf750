use thiserror::Error;

use crate::library::error::ValidationError;

/// What a caller of the player gets to see when an operation did not happen.
///
/// Store failures arrive here already logged, with their detail dropped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("the library store is unavailable, changes cannot be saved")]
    StoreUnavailable,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("could not save changes ({0})")]
    Persistence(String),
}
