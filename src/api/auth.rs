use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, TokenDto};
use crate::db::User;

/// Authenticated user attached to the request by the middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

/// Authentication middleware: resolves `Authorization: Bearer <token>` against
/// the token store and attaches the owning user to the request. Anything else
/// is rejected with 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(key) = extract_bearer_token(&headers) else {
        return Err(ApiError::Unauthorized(
            "Authentication credentials were not provided".to_string(),
        ));
    };

    let user = state
        .store()
        .verify_token(&key)
        .await
        .map_err(|e| ApiError::internal(format!("Token verification error: {e}")))?;

    let Some(user) = user else {
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    };

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

/// POST /api/users/token
/// Issue a bearer token for email + password. Invalid credentials are a
/// validation-style failure (400), matching the create-user surface.
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<ApiResponse<TokenDto>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .store()
        .verify_user_password(&payload.email, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?
        .ok_or_else(|| {
            ApiError::validation("Unable to authenticate with provided credentials")
        })?;

    let token = state
        .store()
        .issue_token(user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to issue token: {e}")))?;

    Ok(Json(ApiResponse::success(TokenDto { token })))
}
