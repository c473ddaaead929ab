//! Domain service for sign-in, sign-up and sign-out.
//!
//! Composes the credential store and the session store; the session id it
//! hands out is the bearer token for subsequent requests.

use thiserror::Error;

use crate::db::{NewUser, User, UserStoreError};

/// Errors specific to identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Uniform failure for every sign-in gate (unknown user, wrong
    /// password, inactive account) so callers cannot probe which one fired.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UserStoreError> for IdentityError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::UsernameTaken => Self::UsernameTaken,
            UserStoreError::NotFound => Self::InvalidCredentials,
            UserStoreError::Database(e) => Self::Database(e.to_string()),
            UserStoreError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<anyhow::Error> for IdentityError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A freshly authenticated session paired with the digest-free user.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: String,
    pub user: User,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Verifies credentials, increments the login counter and mints a session.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCredentials`] if any gate fails.
    async fn sign_in(&self, username: &str, password: &str) -> Result<AuthSession, IdentityError>;

    /// Creates a user and immediately signs it in. The returned user already
    /// reports a login counter of 1 (registration counts as the first
    /// authentication event).
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UsernameTaken`] on a duplicate username.
    async fn sign_up(&self, candidate: NewUser) -> Result<AuthSession, IdentityError>;

    /// Terminates a session. Unknown or already-terminated ids are success.
    async fn logout(&self, session_id: &str) -> Result<(), IdentityError>;
}
