use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::RegisterRequest;
use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto, UserListDto, validation};
use crate::db::{UserPatch, UserStatus};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: Option<UserStatus>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    fn validate(self) -> Result<UserPatch, ApiError> {
        if let Some(first_name) = &self.first_name {
            validation::validate_name(first_name, "firstName")?;
        }
        if let Some(last_name) = &self.last_name {
            validation::validate_name(last_name, "lastName")?;
        }
        if let Some(password) = &self.password {
            validation::validate_password(password)?;
        }

        Ok(UserPatch {
            first_name: self.first_name,
            last_name: self.last_name,
            status: self.status,
            password: self.password,
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /users
/// Administrative create; unlike register, no session is minted
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let candidate = payload.validate()?;

    let user = state.directory().create(candidate).await?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// GET /users?page=1&limit=10&sortField=createdAt&sortDirection=DESC
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<UserListDto>>, ApiError> {
    let page = validation::validate_page(query.page)?;
    let limit = validation::validate_limit(query.limit)?;
    let sort = validation::validate_sort_field(query.sort_field.as_deref())?;
    let direction = validation::validate_sort_direction(query.sort_direction.as_deref())?;

    let result = state.directory().list(page, limit, sort, direction).await?;

    Ok(Json(ApiResponse::success(UserListDto {
        items: result.items.into_iter().map(UserDto::from).collect(),
        total_count: result.total_items,
        current_page: result.current_page,
        last_page: result.last_page,
    })))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let patch = payload.validate()?;

    let user = state.directory().update(&id, patch).await?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// DELETE /users/{id}
/// Removes the user and cascades to its sessions
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.directory().delete(&id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "User deleted".to_string(),
    })))
}
