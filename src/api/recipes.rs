use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{
    parse_id_list, validate_label_names, validate_price, validate_title,
};
use super::{ApiError, ApiResponse, AppState, LabelPayload, RecipeDetailDto, RecipeDto};
use crate::db::{RecipeInput, RecipePatch};

const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Payload shared by POST (create) and PUT (full replace). Omitted optional
/// scalars fall back to defaults. An absent relation key means "no tags" on
/// create but "leave links alone" on replace; only a present list (including
/// an empty one) rewrites the link set.
#[derive(Debug, Deserialize)]
pub struct RecipeWriteRequest {
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    pub tags: Option<Vec<LabelPayload>>,
    pub ingredients: Option<Vec<LabelPayload>>,
}

#[derive(Debug, Deserialize)]
pub struct RecipePatchRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<f64>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<LabelPayload>>,
    pub ingredients: Option<Vec<LabelPayload>>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeListQuery {
    /// Comma-separated tag ids; keeps recipes linked to at least one.
    pub tags: Option<String>,
    /// Comma-separated ingredient ids.
    pub ingredients: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct RecipeImageDto {
    pub id: i32,
    pub image: Option<String>,
}

fn label_names(payloads: Vec<LabelPayload>) -> Result<Vec<String>, ApiError> {
    let names: Vec<String> = payloads.into_iter().map(|p| p.name).collect();
    validate_label_names(&names)?;
    Ok(names)
}

impl RecipeWriteRequest {
    fn into_input(self) -> Result<RecipeInput, ApiError> {
        validate_title(&self.title)?;
        validate_price(self.price)?;

        Ok(RecipeInput {
            title: self.title,
            time_minutes: self.time_minutes,
            price: self.price,
            link: self.link,
            description: self.description,
            tags: self.tags.map(label_names).transpose()?.unwrap_or_default(),
            ingredients: self
                .ingredients
                .map(label_names)
                .transpose()?
                .unwrap_or_default(),
        })
    }

    fn into_replace_patch(self) -> Result<RecipePatch, ApiError> {
        validate_title(&self.title)?;
        validate_price(self.price)?;

        Ok(RecipePatch {
            title: Some(self.title),
            time_minutes: Some(self.time_minutes),
            price: Some(self.price),
            link: Some(self.link),
            description: Some(self.description),
            tags: self.tags.map(label_names).transpose()?,
            ingredients: self.ingredients.map(label_names).transpose()?,
        })
    }
}

impl RecipePatchRequest {
    fn into_patch(self) -> Result<RecipePatch, ApiError> {
        if let Some(ref title) = self.title {
            validate_title(title)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }

        Ok(RecipePatch {
            title: self.title,
            time_minutes: self.time_minutes,
            price: self.price,
            link: self.link,
            description: self.description,
            tags: self.tags.map(label_names).transpose()?,
            ingredients: self.ingredients.map(label_names).transpose()?,
        })
    }
}

/// GET /api/recipes
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<ApiResponse<Vec<RecipeDto>>>, ApiError> {
    let tag_ids = query.tags.as_deref().map(parse_id_list).transpose()?;
    let ingredient_ids = query
        .ingredients
        .as_deref()
        .map(parse_id_list)
        .transpose()?;

    let recipes = state
        .store()
        .list_recipes(
            user.id,
            tag_ids.as_deref().unwrap_or(&[]),
            ingredient_ids.as_deref().unwrap_or(&[]),
        )
        .await?;

    let (tags, ingredients) = state.store().load_recipe_relations(&recipes).await?;

    let dtos: Vec<RecipeDto> = recipes
        .into_iter()
        .zip(tags)
        .zip(ingredients)
        .map(|((recipe, tags), ingredients)| RecipeDto::from_parts(recipe, tags, ingredients))
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /api/recipes
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<RecipeWriteRequest>,
) -> Result<Json<ApiResponse<RecipeDetailDto>>, ApiError> {
    let input = payload.into_input()?;

    let recipe = state.store().create_recipe(user.id, input).await?;

    detail_response(&state, recipe).await
}

/// GET /api/recipes/{id}
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RecipeDetailDto>>, ApiError> {
    let recipe = state
        .store()
        .get_recipe(user.id, id)
        .await?
        .ok_or_else(|| ApiError::recipe_not_found(id))?;

    detail_response(&state, recipe).await
}

/// PUT /api/recipes/{id} — full replace of the scalar fields. An absent
/// relation key leaves the link set untouched; a present list (even empty)
/// replaces it.
pub async fn replace_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<RecipeWriteRequest>,
) -> Result<Json<ApiResponse<RecipeDetailDto>>, ApiError> {
    let patch = payload.into_replace_patch()?;

    let recipe = state
        .store()
        .update_recipe(user.id, id, patch)
        .await?
        .ok_or_else(|| ApiError::recipe_not_found(id))?;

    detail_response(&state, recipe).await
}

/// PATCH /api/recipes/{id} — partial update; absent relation keys leave links alone.
pub async fn patch_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<RecipePatchRequest>,
) -> Result<Json<ApiResponse<RecipeDetailDto>>, ApiError> {
    let patch = payload.into_patch()?;

    let recipe = state
        .store()
        .update_recipe(user.id, id, patch)
        .await?
        .ok_or_else(|| ApiError::recipe_not_found(id))?;

    detail_response(&state, recipe).await
}

/// DELETE /api/recipes/{id}
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let deleted = state.store().remove_recipe(user.id, id).await?;

    if deleted {
        Ok(Json(ApiResponse::success(true)))
    } else {
        Err(ApiError::recipe_not_found(id))
    }
}

/// POST /api/recipes/{id}/upload-image — multipart field `image`.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<RecipeImageDto>>, ApiError> {
    if state.store().get_recipe(user.id, id).await?.is_none() {
        return Err(ApiError::recipe_not_found(id));
    }

    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|n| std::path::Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ApiError::validation("Image file name must carry an extension"))?;

        if !ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApiError::validation(format!(
                "Unsupported image extension: {}",
                extension
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read image data: {e}")))?;

        if bytes.is_empty() {
            return Err(ApiError::validation("Uploaded image is empty"));
        }

        image = Some((extension, bytes.to_vec()));
        break;
    }

    let Some((extension, bytes)) = image else {
        return Err(ApiError::validation("No 'image' field in upload"));
    };

    let file_name = format!("recipe-{}-{}.{}", id, uuid::Uuid::new_v4(), extension);
    let media_root = state.media_path().to_path_buf();
    let file_path = media_root.join(&file_name);

    tokio::fs::create_dir_all(&media_root)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create media dir: {e}")))?;
    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store image: {e}")))?;

    let Some((recipe, previous)) = state.store().set_recipe_image(user.id, id, &file_name).await?
    else {
        return Err(ApiError::recipe_not_found(id));
    };

    // Replaced file is best-effort cleanup
    if let Some(old) = previous {
        let _ = tokio::fs::remove_file(media_root.join(old)).await;
    }

    tracing::info!("Image stored for recipe {}: {}", id, file_name);

    Ok(Json(ApiResponse::success(RecipeImageDto {
        id: recipe.id,
        image: recipe.image.map(|p| format!("/media/{p}")),
    })))
}

async fn detail_response(
    state: &Arc<AppState>,
    recipe: crate::entities::recipes::Model,
) -> Result<Json<ApiResponse<RecipeDetailDto>>, ApiError> {
    let (mut tags, mut ingredients) = state
        .store()
        .load_recipe_relations(std::slice::from_ref(&recipe))
        .await?;

    let tags = tags.pop().unwrap_or_default();
    let ingredients = ingredients.pop().unwrap_or_default();

    Ok(Json(ApiResponse::success(RecipeDetailDto::from_parts(
        recipe,
        tags,
        ingredients,
    ))))
}
