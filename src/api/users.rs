use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{normalize_email, validate_password};
use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::db::UserPatch;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// POST /api/users/create
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let email = normalize_email(&payload.email)?;
    validate_password(&payload.password)?;

    let existing = state
        .store()
        .get_user_by_email(&email)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to query user: {e}")))?;

    if existing.is_some() {
        return Err(ApiError::validation("User with this email already exists"));
    }

    let user = state
        .store()
        .create_user(&email, &payload.password, &payload.name, state.security())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create user: {e}")))?;

    tracing::info!("User created: {}", user.email);

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// GET /api/users/me
pub async fn get_me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(UserDto::from(user)))
}

/// PATCH /api/users/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let email = match payload.email {
        Some(raw) => {
            let normalized = normalize_email(&raw)?;

            let existing = state
                .store()
                .get_user_by_email(&normalized)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to query user: {e}")))?;

            if existing.is_some_and(|u| u.id != user.id) {
                return Err(ApiError::validation("User with this email already exists"));
            }

            Some(normalized)
        }
        None => None,
    };

    if let Some(ref password) = payload.password {
        validate_password(password)?;
    }

    let patch = UserPatch {
        email,
        name: payload.name,
        password: payload.password,
    };

    let updated = state
        .store()
        .update_user(user.id, patch, state.security())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update user: {e}")))?;

    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}
