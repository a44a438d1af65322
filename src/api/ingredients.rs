use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_label_name;
use super::{ApiError, ApiResponse, AppState, LabelDto, LabelListQuery, RenameRequest};

/// GET /api/ingredients — same shape and filters as the tag list.
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<LabelListQuery>,
) -> Result<Json<ApiResponse<Vec<LabelDto>>>, ApiError> {
    let ingredients = state
        .store()
        .list_ingredients(user.id, query.assigned_only != 0)
        .await?;

    Ok(Json(ApiResponse::success(
        ingredients.into_iter().map(LabelDto::from).collect(),
    )))
}

/// GET /api/ingredients/{id}
pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<LabelDto>>, ApiError> {
    let ingredient = state
        .store()
        .get_ingredient(user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient", id))?;

    Ok(Json(ApiResponse::success(LabelDto::from(ingredient))))
}

/// PATCH /api/ingredients/{id}
pub async fn rename_ingredient(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<RenameRequest>,
) -> Result<Json<ApiResponse<LabelDto>>, ApiError> {
    validate_label_name(&payload.name)?;

    let ingredient = state
        .store()
        .rename_ingredient(user.id, id, &payload.name)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient", id))?;

    Ok(Json(ApiResponse::success(LabelDto::from(ingredient))))
}

/// DELETE /api/ingredients/{id}
pub async fn delete_ingredient(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let deleted = state.store().remove_ingredient(user.id, id).await?;

    if deleted {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::not_found("Ingredient", id))
    }
}
