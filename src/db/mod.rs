use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::session::Session;
pub use repositories::user::{
    NewUser, SortDirection, User, UserPatch, UserSortField, UserStatus, UserStoreError,
};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // Every pooled connection to :memory: would open its own empty db
        let max_connections = if db_url.contains(":memory:") {
            1
        } else {
            max_connections
        };
        let min_connections = min_connections.min(max_connections);

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    // ========== Credential store ==========

    pub async fn create_user(
        &self,
        new_user: NewUser,
        security: &SecurityConfig,
    ) -> Result<User, UserStoreError> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserStoreError> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, UserStoreError> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, UserStoreError> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user(
        &self,
        id: &str,
        patch: UserPatch,
        security: &SecurityConfig,
    ) -> Result<User, UserStoreError> {
        self.user_repo().update(id, patch, security).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), UserStoreError> {
        self.user_repo().delete(id).await
    }

    pub async fn increment_login_counter(&self, id: &str) -> Result<(), UserStoreError> {
        self.user_repo().increment_login_counter(id).await
    }

    pub async fn find_users_paged(
        &self,
        page: u64,
        limit: u64,
        sort: UserSortField,
        direction: SortDirection,
    ) -> Result<(Vec<User>, u64), UserStoreError> {
        self.user_repo()
            .find_paged(page, limit, sort, direction)
            .await
    }

    // ========== Session store ==========

    pub async fn create_session(&self, user_id: &str) -> Result<Session> {
        self.session_repo().create(user_id).await
    }

    pub async fn terminate_session(&self, session_id: &str) -> Result<()> {
        self.session_repo().terminate(session_id).await
    }

    pub async fn resolve_live_session(&self, session_id: &str) -> Result<Option<Session>> {
        self.session_repo().resolve_live(session_id).await
    }

    pub async fn delete_sessions_for_user(&self, user_id: &str) -> Result<u64> {
        self.session_repo().delete_for_user(user_id).await
    }
}
