use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;

/// Errors from the credential store. The unique-constraint violation is kept
/// distinct so the services can surface it as a conflict instead of a
/// generic storage failure.
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("username already exists")]
    UsernameTaken,

    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Columns callers may sort the user listing by. Anything outside this set
/// is rejected at the boundary, so a raw sort key never reaches the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Username,
    FirstName,
    Status,
    LoginsCounter,
    CreatedAt,
    UpdatedAt,
}

impl UserSortField {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "username" => Some(Self::Username),
            "firstName" => Some(Self::FirstName),
            "status" => Some(Self::Status),
            "loginsCounter" => Some(Self::LoginsCounter),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    const fn column(self) -> users::Column {
        match self {
            Self::Username => users::Column::Username,
            Self::FirstName => users::Column::FirstName,
            Self::Status => users::Column::Status,
            Self::LoginsCounter => users::Column::LoginsCounter,
            Self::CreatedAt => users::Column::CreatedAt,
            Self::UpdatedAt => users::Column::UpdatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    const fn order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

/// User data returned from the repository. The password hash never leaves
/// the store; verification happens inside [`UserRepository::verify_password`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub logins_counter: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            // Unknown status text fails closed to inactive
            status: UserStatus::parse(&model.status).unwrap_or(UserStatus::Inactive),
            logins_counter: model.logins_counter,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Candidate for user creation; `password` is plaintext and is hashed with a
/// fresh salt before anything is persisted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub status: Option<UserStatus>,
}

/// Partial update; absent fields are left untouched. A present `password`
/// is re-hashed with a fresh salt.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: Option<UserStatus>,
    pub password: Option<String>,
}

impl UserPatch {
    /// True if the patch would change either name field.
    #[must_use]
    pub const fn touches_names(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a user. The username's unique column constraint is the
    /// race-safe uniqueness check; a violation maps to
    /// [`UserStoreError::UsernameTaken`].
    pub async fn create(
        &self,
        new_user: NewUser,
        security: &SecurityConfig,
    ) -> Result<User, UserStoreError> {
        let password = new_user.password;
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .map_err(|e| UserStoreError::Internal(format!("Hashing task panicked: {e}")))??;

        let now = chrono::Utc::now().to_rfc3339();
        let status = new_user.status.unwrap_or(UserStatus::Active);

        let active = users::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(new_user.username),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            password_hash: Set(password_hash),
            status: Set(status.as_str().to_string()),
            logins_counter: Set(0),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(User::from(model)),
            Err(e) => {
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(UserStoreError::UsernameTaken);
                }
                Err(e.into())
            }
        }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserStoreError> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, UserStoreError> {
        let user = users::Entity::find_by_id(id).one(&self.conn).await?;

        Ok(user.map(User::from))
    }

    /// Verify a plaintext password for a user.
    ///
    /// An unknown username reports `false` rather than a distinct error, so
    /// the caller's failure path stays uniform. Argon2 verification is
    /// CPU-intensive and runs under `spawn_blocking`; the comparison happens
    /// inside the argon2 crate against the parsed digest.
    pub async fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, UserStoreError> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| UserStoreError::Internal(format!("Invalid password hash: {e}")))?;

            let argon2 = Argon2::default();
            Ok::<bool, UserStoreError>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .map_err(|e| UserStoreError::Internal(format!("Verification task panicked: {e}")))??;

        Ok(is_valid)
    }

    /// Apply a partial update. The target's absence is a [`UserStoreError::NotFound`].
    pub async fn update(
        &self,
        id: &str,
        patch: UserPatch,
        security: &SecurityConfig,
    ) -> Result<User, UserStoreError> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or(UserStoreError::NotFound)?;

        let mut active: users::ActiveModel = user.into();

        if let Some(first_name) = patch.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = patch.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(status) = patch.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(password) = patch.password {
            let security = security.clone();
            let new_hash = task::spawn_blocking(move || hash_password(&password, &security))
                .await
                .map_err(|e| UserStoreError::Internal(format!("Hashing task panicked: {e}")))??;
            active.password_hash = Set(new_hash);
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(User::from(updated))
    }

    pub async fn delete(&self, id: &str) -> Result<(), UserStoreError> {
        let result = users::Entity::delete_by_id(id).exec(&self.conn).await?;

        if result.rows_affected == 0 {
            return Err(UserStoreError::NotFound);
        }

        Ok(())
    }

    /// Atomic relative increment; concurrent logins never lose a count.
    pub async fn increment_login_counter(&self, id: &str) -> Result<(), UserStoreError> {
        users::Entity::update_many()
            .col_expr(
                users::Column::LoginsCounter,
                Expr::col(users::Column::LoginsCounter).add(1),
            )
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    /// Paged listing. `page` is 1-based. Ties on the sort column are broken
    /// by id so pages stay deterministic across requests.
    pub async fn find_paged(
        &self,
        page: u64,
        limit: u64,
        sort: UserSortField,
        direction: SortDirection,
    ) -> Result<(Vec<User>, u64), UserStoreError> {
        let query = users::Entity::find()
            .order_by(sort.column(), direction.order())
            .order_by_asc(users::Column::Id);

        let paginator = query.paginate(&self.conn, limit);
        let total_items = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items.into_iter().map(User::from).collect(), total_items))
    }
}

/// Hash a password with Argon2id using the configured cost parameters and a
/// fresh random salt.
pub fn hash_password(password: &str, security: &SecurityConfig) -> Result<String, UserStoreError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        security.argon2_memory_cost_kib,
        security.argon2_time_cost,
        security.argon2_parallelism,
        None,
    )
    .map_err(|e| UserStoreError::Internal(format!("Invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| UserStoreError::Internal(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}
