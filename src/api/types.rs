use serde::{Deserialize, Serialize};

use crate::entities::{ingredients, recipes, tags};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub name: String,
}

impl From<crate::db::User> for UserDto {
    fn from(user: crate::db::User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub token: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct LabelDto {
    pub id: i32,
    pub name: String,
}

impl From<tags::Model> for LabelDto {
    fn from(model: tags::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

impl From<ingredients::Model> for LabelDto {
    fn from(model: ingredients::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// List-shaped recipe; the detail endpoint additionally carries `description`.
#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: String,
    pub tags: Vec<LabelDto>,
    pub ingredients: Vec<LabelDto>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeDetailDto {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: String,
    pub description: String,
    pub tags: Vec<LabelDto>,
    pub ingredients: Vec<LabelDto>,
    pub image: Option<String>,
}

fn image_url(path: Option<String>) -> Option<String> {
    path.map(|p| format!("/media/{p}"))
}

impl RecipeDto {
    #[must_use]
    pub fn from_parts(
        recipe: recipes::Model,
        tags: Vec<tags::Model>,
        ingredients: Vec<ingredients::Model>,
    ) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: tags.into_iter().map(LabelDto::from).collect(),
            ingredients: ingredients.into_iter().map(LabelDto::from).collect(),
            image: image_url(recipe.image),
        }
    }
}

impl RecipeDetailDto {
    #[must_use]
    pub fn from_parts(
        recipe: recipes::Model,
        tags: Vec<tags::Model>,
        ingredients: Vec<ingredients::Model>,
    ) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            description: recipe.description,
            tags: tags.into_iter().map(LabelDto::from).collect(),
            ingredients: ingredients.into_iter().map(LabelDto::from).collect(),
            image: image_url(recipe.image),
        }
    }
}

/// Nested relation payload: `{name}` resolved per-user by reconciliation.
#[derive(Debug, Deserialize)]
pub struct LabelPayload {
    pub name: String,
}

/// Shared query params for the tag/ingredient list endpoints.
/// `assigned_only` is a 0/1 flag, defaulting to 0.
#[derive(Debug, Deserialize)]
pub struct LabelListQuery {
    #[serde(default)]
    pub assigned_only: u8,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}
