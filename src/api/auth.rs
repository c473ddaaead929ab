use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, AuthSessionDto, MessageResponse, validation};
use crate::db::{NewUser, UserStatus};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub status: Option<UserStatus>,
}

impl RegisterRequest {
    pub(super) fn validate(&self) -> Result<NewUser, ApiError> {
        validation::validate_username(&self.username)?;
        validation::validate_password(&self.password)?;
        validation::validate_name(&self.first_name, "firstName")?;
        validation::validate_name(&self.last_name, "lastName")?;

        Ok(NewUser {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            password: self.password.clone(),
            status: self.status,
        })
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware: resolves `Authorization: Bearer <sessionId>`
/// to a live session. A terminated session never passes.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_bearer_token(&headers)
        && let Ok(Some(session)) = state.store().resolve_live_session(&token).await
    {
        tracing::Span::current().record("user_id", &session.user_id);
        return Ok(next.run(request).await);
    }

    let response = (StatusCode::UNAUTHORIZED, "Unauthorized");
    Ok(response.into_response())
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password, returns a session id on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthSessionDto>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let auth = state
        .identity()
        .sign_in(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(AuthSessionDto {
        session_id: auth.session_id,
        user: auth.user.into(),
    })))
}

/// POST /auth/register
/// Create an account and sign it in; the new user reports one login
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<AuthSessionDto>>, ApiError> {
    let candidate = payload.validate()?;

    let auth = state.identity().sign_up(candidate).await?;

    Ok(Json(ApiResponse::success(AuthSessionDto {
        session_id: auth.session_id,
        user: auth.user.into(),
    })))
}

/// POST /auth/logout
/// Terminate the presented session. Succeeds even for unknown or
/// already-terminated tokens.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if let Some(token) = extract_bearer_token(&headers) {
        state.identity().logout(&token).await?;
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logged out successfully".to_string(),
    })))
}
