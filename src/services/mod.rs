pub mod users;

use thiserror::Error;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::models::ValidationErrors;

pub use users::UserService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}
