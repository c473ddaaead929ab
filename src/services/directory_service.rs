//! Domain service for the user directory: CRUD and paginated listing over
//! user records, plus the status-gated update policy.

use thiserror::Error;

use crate::db::{NewUser, SortDirection, User, UserPatch, UserSortField, UserStoreError};

/// Errors specific to directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Username already exists")]
    UsernameTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Cannot update names for inactive users")]
    InactiveNameChange,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UserStoreError> for DirectoryError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::UsernameTaken => Self::UsernameTaken,
            UserStoreError::NotFound => Self::UserNotFound,
            UserStoreError::Database(e) => Self::Database(e.to_string()),
            UserStoreError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<anyhow::Error> for DirectoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// One page of the user listing.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub items: Vec<User>,
    pub total_items: u64,
    pub current_page: u64,
    pub last_page: u64,
}

/// Domain service trait for the user directory.
///
/// The service performs mutations unconditionally; detecting "this affects
/// my own session" is the caller's job.
#[async_trait::async_trait]
pub trait UserDirectoryService: Send + Sync {
    /// Administrative create; no session is minted.
    async fn create(&self, candidate: NewUser) -> Result<User, DirectoryError>;

    /// Paginated, sortable listing. `page` is 1-based.
    async fn list(
        &self,
        page: u64,
        limit: u64,
        sort: UserSortField,
        direction: SortDirection,
    ) -> Result<UserPage, DirectoryError>;

    /// Partial update. A patch touching either name of a currently inactive
    /// user fails with [`DirectoryError::InactiveNameChange`], even when the
    /// same patch reactivates the user.
    async fn update(&self, id: &str, patch: UserPatch) -> Result<User, DirectoryError>;

    /// Removes the user and every session it owns.
    async fn delete(&self, id: &str) -> Result<(), DirectoryError>;
}
