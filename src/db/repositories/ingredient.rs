use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::entities::{ingredients, prelude::*};

pub struct IngredientRepository {
    conn: DatabaseConnection,
}

impl IngredientRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// List the user's ingredients, name-descending; `assigned_only` keeps only
    /// ingredients linked to at least one recipe, de-duplicated.
    pub async fn list(
        &self,
        user_id: i32,
        assigned_only: bool,
    ) -> Result<Vec<ingredients::Model>> {
        let mut query = Ingredients::find().filter(ingredients::Column::UserId.eq(user_id));

        if assigned_only {
            query = query
                .join(
                    JoinType::InnerJoin,
                    crate::entities::recipe_ingredients::Relation::Ingredient
                        .def()
                        .rev(),
                )
                .distinct();
        }

        let ingredients = query
            .order_by_desc(ingredients::Column::Name)
            .all(&self.conn)
            .await?;

        Ok(ingredients)
    }

    pub async fn get(&self, user_id: i32, id: i32) -> Result<Option<ingredients::Model>> {
        let ingredient = Ingredients::find_by_id(id)
            .filter(ingredients::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?;

        Ok(ingredient)
    }

    pub async fn rename(
        &self,
        user_id: i32,
        id: i32,
        name: &str,
    ) -> Result<Option<ingredients::Model>> {
        let Some(ingredient) = self.get(user_id, id).await? else {
            return Ok(None);
        };

        let mut active: ingredients::ActiveModel = ingredient.into();
        active.name = Set(name.to_string());
        let model = active.update(&self.conn).await?;

        Ok(Some(model))
    }

    pub async fn remove(&self, user_id: i32, id: i32) -> Result<bool> {
        let result = Ingredients::delete_many()
            .filter(ingredients::Column::Id.eq(id))
            .filter(ingredients::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
