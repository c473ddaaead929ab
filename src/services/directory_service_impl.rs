//! `SeaORM` implementation of the `UserDirectoryService` trait.

use async_trait::async_trait;

use crate::config::SecurityConfig;
use crate::db::{NewUser, SortDirection, Store, User, UserPatch, UserSortField, UserStatus};
use crate::services::directory_service::{DirectoryError, UserDirectoryService, UserPage};

pub struct SeaOrmDirectoryService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmDirectoryService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl UserDirectoryService for SeaOrmDirectoryService {
    async fn create(&self, candidate: NewUser) -> Result<User, DirectoryError> {
        let user = self.store.create_user(candidate, &self.security).await?;

        tracing::info!("User created: {}", user.username);

        Ok(user)
    }

    async fn list(
        &self,
        page: u64,
        limit: u64,
        sort: UserSortField,
        direction: SortDirection,
    ) -> Result<UserPage, DirectoryError> {
        let (items, total_items) = self
            .store
            .find_users_paged(page, limit, sort, direction)
            .await?;

        Ok(UserPage {
            items,
            total_items,
            current_page: page,
            last_page: total_items.div_ceil(limit),
        })
    }

    async fn update(&self, id: &str, patch: UserPatch) -> Result<User, DirectoryError> {
        let user = self
            .store
            .get_user_by_id(id)
            .await?
            .ok_or(DirectoryError::UserNotFound)?;

        // The gate checks the state *before* the patch: a patch that both
        // reactivates the user and renames it is still rejected.
        if user.status == UserStatus::Inactive && patch.touches_names() {
            return Err(DirectoryError::InactiveNameChange);
        }

        let updated = self.store.update_user(id, patch, &self.security).await?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), DirectoryError> {
        // Sessions first: a crash in between leaves a user without sessions,
        // which is recoverable, whereas orphaned live sessions are not.
        self.store.delete_sessions_for_user(id).await?;
        self.store.delete_user(id).await?;

        tracing::info!("User deleted: {id}");

        Ok(())
    }
}
