use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owner; never changed after insert.
    pub user_id: i32,

    pub title: String,

    pub time_minutes: i32,

    pub price: f64,

    pub link: String,

    pub description: String,

    /// Path of the uploaded image relative to the media root.
    pub image: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_tags::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::recipe_tags::Relation::Recipe.def().rev())
    }
}

impl Related<super::ingredients::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_ingredients::Relation::Ingredient.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::recipe_ingredients::Relation::Recipe.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
