use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_label_name;
use super::{ApiError, ApiResponse, AppState, LabelDto, LabelListQuery, RenameRequest};

/// GET /api/tags — the caller's tags, newest names first.
/// `?assigned_only=1` keeps only tags linked to at least one recipe.
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<LabelListQuery>,
) -> Result<Json<ApiResponse<Vec<LabelDto>>>, ApiError> {
    let tags = state
        .store()
        .list_tags(user.id, query.assigned_only != 0)
        .await?;

    Ok(Json(ApiResponse::success(
        tags.into_iter().map(LabelDto::from).collect(),
    )))
}

/// GET /api/tags/{id}
pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<LabelDto>>, ApiError> {
    let tag = state
        .store()
        .get_tag(user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tag", id))?;

    Ok(Json(ApiResponse::success(LabelDto::from(tag))))
}

/// PATCH /api/tags/{id}
pub async fn rename_tag(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<RenameRequest>,
) -> Result<Json<ApiResponse<LabelDto>>, ApiError> {
    validate_label_name(&payload.name)?;

    let tag = state
        .store()
        .rename_tag(user.id, id, &payload.name)
        .await?
        .ok_or_else(|| ApiError::not_found("Tag", id))?;

    Ok(Json(ApiResponse::success(LabelDto::from(tag))))
}

/// DELETE /api/tags/{id} — recipe links go with the row.
pub async fn delete_tag(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let deleted = state.store().remove_tag(user.id, id).await?;

    if deleted {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("Tag", id))
    }
}
