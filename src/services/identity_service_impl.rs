//! `SeaORM` implementation of the `IdentityService` trait.

use async_trait::async_trait;

use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, UserStatus};
use crate::services::identity_service::{AuthSession, IdentityError, IdentityService};

pub struct SeaOrmIdentityService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmIdentityService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl IdentityService for SeaOrmIdentityService {
    async fn sign_in(&self, username: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let is_valid = self.store.verify_user_password(username, password).await?;
        if !is_valid {
            return Err(IdentityError::InvalidCredentials);
        }

        let mut user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        // Status gate fails with the same message as the credential gates
        if user.status == UserStatus::Inactive {
            return Err(IdentityError::InvalidCredentials);
        }

        self.store.increment_login_counter(&user.id).await?;
        user.logins_counter += 1;

        let session = self.store.create_session(&user.id).await?;

        tracing::info!("User logged in: {}", user.username);

        Ok(AuthSession {
            session_id: session.id,
            user,
        })
    }

    async fn sign_up(&self, candidate: NewUser) -> Result<AuthSession, IdentityError> {
        let mut user = self.store.create_user(candidate, &self.security).await?;

        // Registration is the first authentication event. Increment in
        // storage, then reflect it on the already-loaded user instead of
        // fetching the row again.
        self.store.increment_login_counter(&user.id).await?;
        user.logins_counter = 1;

        let session = self.store.create_session(&user.id).await?;

        tracing::info!("User registered: {}", user.username);

        Ok(AuthSession {
            session_id: session.id,
            user,
        })
    }

    async fn logout(&self, session_id: &str) -> Result<(), IdentityError> {
        self.store.terminate_session(session_id).await?;
        Ok(())
    }
}
