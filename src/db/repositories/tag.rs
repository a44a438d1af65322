use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::entities::{prelude::*, tags};

pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// List the user's tags, name-descending. With `assigned_only` the list is
    /// restricted to tags linked to at least one recipe, de-duplicated.
    pub async fn list(&self, user_id: i32, assigned_only: bool) -> Result<Vec<tags::Model>> {
        let mut query = Tags::find().filter(tags::Column::UserId.eq(user_id));

        if assigned_only {
            query = query
                .join(
                    JoinType::InnerJoin,
                    crate::entities::recipe_tags::Relation::Tag.def().rev(),
                )
                .distinct();
        }

        let tags = query
            .order_by_desc(tags::Column::Name)
            .all(&self.conn)
            .await?;

        Ok(tags)
    }

    pub async fn get(&self, user_id: i32, id: i32) -> Result<Option<tags::Model>> {
        let tag = Tags::find_by_id(id)
            .filter(tags::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?;

        Ok(tag)
    }

    /// Rename a tag; returns the updated row or `None` when the id is not owned.
    pub async fn rename(&self, user_id: i32, id: i32, name: &str) -> Result<Option<tags::Model>> {
        let Some(tag) = self.get(user_id, id).await? else {
            return Ok(None);
        };

        let mut active: tags::ActiveModel = tag.into();
        active.name = Set(name.to_string());
        let model = active.update(&self.conn).await?;

        Ok(Some(model))
    }

    /// Delete an owned tag; `false` when the id is missing or not owned.
    pub async fn remove(&self, user_id: i32, id: i32) -> Result<bool> {
        let result = Tags::delete_many()
            .filter(tags::Column::Id.eq(id))
            .filter(tags::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
