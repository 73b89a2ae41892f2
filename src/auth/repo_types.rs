use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;

use crate::db::ConnectError;

/// User record in the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,                 // store-assigned, opaque
    pub email: String,              // normalized (lowercase)
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 PHC string, never exposed
    pub created_at: OffsetDateTime, // set once at insert
}

/// Fields written by registration; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a user with this email already exists")]
    Duplicate,
    #[error("store did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error(transparent)]
    Connect(ConnectError),
    #[error("store query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl From<ConnectError> for StoreError {
    fn from(e: ConnectError) -> Self {
        match e {
            ConnectError::Timeout(d) => StoreError::Timeout(d),
            other => StoreError::Connect(other),
        }
    }
}
