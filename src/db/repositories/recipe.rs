use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    LoaderTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use crate::entities::{
    ingredients, prelude::*, recipe_ingredients, recipe_tags, recipes, tags,
};

/// Full payload for create and PUT-style replace.
#[derive(Debug, Clone)]
pub struct RecipeInput {
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: String,
    pub description: String,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
}

/// Partial payload for PATCH. `None` relation lists leave existing links
/// untouched; `Some(vec![])` clears them.
#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<f64>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// List the user's recipes, newest first. Non-empty id lists restrict to
    /// recipes linked to at least one of the given tags / ingredients.
    pub async fn list(
        &self,
        user_id: i32,
        tag_ids: &[i32],
        ingredient_ids: &[i32],
    ) -> Result<Vec<recipes::Model>> {
        let mut query = Recipes::find().filter(recipes::Column::UserId.eq(user_id));

        if !tag_ids.is_empty() {
            query = query
                .join(JoinType::InnerJoin, recipe_tags::Relation::Recipe.def().rev())
                .filter(recipe_tags::Column::TagId.is_in(tag_ids.to_vec()));
        }

        if !ingredient_ids.is_empty() {
            query = query
                .join(
                    JoinType::InnerJoin,
                    recipe_ingredients::Relation::Recipe.def().rev(),
                )
                .filter(recipe_ingredients::Column::IngredientId.is_in(ingredient_ids.to_vec()));
        }

        if !tag_ids.is_empty() || !ingredient_ids.is_empty() {
            query = query.distinct();
        }

        let recipes = query
            .order_by_desc(recipes::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(recipes)
    }

    pub async fn get(&self, user_id: i32, id: i32) -> Result<Option<recipes::Model>> {
        let recipe = Recipes::find_by_id(id)
            .filter(recipes::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?;

        Ok(recipe)
    }

    /// Insert a recipe, then resolve and attach its nested tags/ingredients,
    /// all inside one transaction.
    pub async fn create(&self, user_id: i32, input: RecipeInput) -> Result<recipes::Model> {
        let txn = self.conn.begin().await?;

        let recipe = recipes::ActiveModel {
            user_id: Set(user_id),
            title: Set(input.title),
            time_minutes: Set(input.time_minutes),
            price: Set(input.price),
            link: Set(input.link),
            description: Set(input.description),
            image: Set(None),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let tag_ids = get_or_create_tags(&txn, user_id, &input.tags).await?;
        attach_tags(&txn, recipe.id, &tag_ids).await?;

        let ingredient_ids = get_or_create_ingredients(&txn, user_id, &input.ingredients).await?;
        attach_ingredients(&txn, recipe.id, &ingredient_ids).await?;

        txn.commit().await?;
        Ok(recipe)
    }

    /// Apply a partial update. A present relation list replaces the link set
    /// wholesale (clear, then re-resolve); an absent one is left alone.
    /// Returns `None` when the id is not owned by the user.
    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        patch: RecipePatch,
    ) -> Result<Option<recipes::Model>> {
        let txn = self.conn.begin().await?;

        let Some(recipe) = Recipes::find_by_id(id)
            .filter(recipes::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        let recipe_id = recipe.id;
        let mut active: recipes::ActiveModel = recipe.clone().into();

        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(time_minutes) = patch.time_minutes {
            active.time_minutes = Set(time_minutes);
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(link) = patch.link {
            active.link = Set(link);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }

        // A relation-only patch leaves no dirty columns; updating anyway
        // would be rejected as RecordNotUpdated
        let recipe = if active.is_changed() {
            active.update(&txn).await?
        } else {
            recipe
        };

        if let Some(names) = patch.tags {
            RecipeTags::delete_many()
                .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
                .exec(&txn)
                .await?;

            let tag_ids = get_or_create_tags(&txn, user_id, &names).await?;
            attach_tags(&txn, recipe_id, &tag_ids).await?;
        }

        if let Some(names) = patch.ingredients {
            RecipeIngredients::delete_many()
                .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
                .exec(&txn)
                .await?;

            let ingredient_ids = get_or_create_ingredients(&txn, user_id, &names).await?;
            attach_ingredients(&txn, recipe_id, &ingredient_ids).await?;
        }

        txn.commit().await?;
        Ok(Some(recipe))
    }

    pub async fn remove(&self, user_id: i32, id: i32) -> Result<bool> {
        let result = Recipes::delete_many()
            .filter(recipes::Column::Id.eq(id))
            .filter(recipes::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Record the stored image path; returns the previous path (for file
    /// cleanup) or `None` when the recipe is not owned.
    pub async fn set_image(
        &self,
        user_id: i32,
        id: i32,
        image_path: &str,
    ) -> Result<Option<(recipes::Model, Option<String>)>> {
        let Some(recipe) = self.get(user_id, id).await? else {
            return Ok(None);
        };

        let previous = recipe.image.clone();

        let mut active: recipes::ActiveModel = recipe.into();
        active.image = Set(Some(image_path.to_string()));
        let model = active.update(&self.conn).await?;

        Ok(Some((model, previous)))
    }

    /// Load the related tags and ingredients for a batch of recipes, aligned
    /// index-for-index with the input slice.
    pub async fn load_relations(
        &self,
        recipes: &[recipes::Model],
    ) -> Result<(Vec<Vec<tags::Model>>, Vec<Vec<ingredients::Model>>)> {
        let tags = recipes
            .load_many_to_many(Tags, RecipeTags, &self.conn)
            .await?;
        let ingredients = recipes
            .load_many_to_many(Ingredients, RecipeIngredients, &self.conn)
            .await?;

        Ok((tags, ingredients))
    }
}

/// Find-or-create tag rows scoped to `(user_id, name)`, returning their ids
/// de-duplicated (a name appearing twice resolves to the same row once).
async fn get_or_create_tags<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    names: &[String],
) -> Result<Vec<i32>> {
    let mut ids = Vec::with_capacity(names.len());

    for name in names {
        let existing = Tags::find()
            .filter(tags::Column::UserId.eq(user_id))
            .filter(tags::Column::Name.eq(name.as_str()))
            .one(conn)
            .await?;

        let id = match existing {
            Some(tag) => tag.id,
            None => {
                tags::ActiveModel {
                    user_id: Set(user_id),
                    name: Set(name.clone()),
                    ..Default::default()
                }
                .insert(conn)
                .await?
                .id
            }
        };

        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    Ok(ids)
}

async fn get_or_create_ingredients<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    names: &[String],
) -> Result<Vec<i32>> {
    let mut ids = Vec::with_capacity(names.len());

    for name in names {
        let existing = Ingredients::find()
            .filter(ingredients::Column::UserId.eq(user_id))
            .filter(ingredients::Column::Name.eq(name.as_str()))
            .one(conn)
            .await?;

        let id = match existing {
            Some(ingredient) => ingredient.id,
            None => {
                ingredients::ActiveModel {
                    user_id: Set(user_id),
                    name: Set(name.clone()),
                    ..Default::default()
                }
                .insert(conn)
                .await?
                .id
            }
        };

        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    Ok(ids)
}

async fn attach_tags<C: ConnectionTrait>(conn: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }

    let links: Vec<recipe_tags::ActiveModel> = tag_ids
        .iter()
        .map(|&tag_id| recipe_tags::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag_id),
        })
        .collect();

    RecipeTags::insert_many(links).exec(conn).await?;
    Ok(())
}

async fn attach_ingredients<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    ingredient_ids: &[i32],
) -> Result<()> {
    if ingredient_ids.is_empty() {
        return Ok(());
    }

    let links: Vec<recipe_ingredients::ActiveModel> = ingredient_ids
        .iter()
        .map(|&ingredient_id| recipe_ingredients::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(ingredient_id),
        })
        .collect();

    RecipeIngredients::insert_many(links).exec(conn).await?;
    Ok(())
}
