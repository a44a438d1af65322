use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{ingredients, recipes, tags};

pub mod migrator;
pub mod repositories;

pub use repositories::recipe::{RecipeInput, RecipePatch};
pub use repositories::user::{User, UserPatch};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("memory") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> repositories::tag::TagRepository {
        repositories::tag::TagRepository::new(self.conn.clone())
    }

    fn ingredient_repo(&self) -> repositories::ingredient::IngredientRepository {
        repositories::ingredient::IngredientRepository::new(self.conn.clone())
    }

    // ========== Users & tokens ==========

    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo().create(email, password, name, config).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn update_user(
        &self,
        id: i32,
        patch: UserPatch,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo().update(id, patch, config).await
    }

    pub async fn issue_token(&self, user_id: i32) -> Result<String> {
        self.user_repo().issue_token(user_id).await
    }

    pub async fn verify_token(&self, key: &str) -> Result<Option<User>> {
        self.user_repo().verify_token(key).await
    }

    // ========== Recipes ==========

    pub async fn list_recipes(
        &self,
        user_id: i32,
        tag_ids: &[i32],
        ingredient_ids: &[i32],
    ) -> Result<Vec<recipes::Model>> {
        self.recipe_repo()
            .list(user_id, tag_ids, ingredient_ids)
            .await
    }

    pub async fn get_recipe(&self, user_id: i32, id: i32) -> Result<Option<recipes::Model>> {
        self.recipe_repo().get(user_id, id).await
    }

    pub async fn create_recipe(&self, user_id: i32, input: RecipeInput) -> Result<recipes::Model> {
        self.recipe_repo().create(user_id, input).await
    }

    pub async fn update_recipe(
        &self,
        user_id: i32,
        id: i32,
        patch: RecipePatch,
    ) -> Result<Option<recipes::Model>> {
        self.recipe_repo().update(user_id, id, patch).await
    }

    pub async fn remove_recipe(&self, user_id: i32, id: i32) -> Result<bool> {
        self.recipe_repo().remove(user_id, id).await
    }

    pub async fn set_recipe_image(
        &self,
        user_id: i32,
        id: i32,
        image_path: &str,
    ) -> Result<Option<(recipes::Model, Option<String>)>> {
        self.recipe_repo().set_image(user_id, id, image_path).await
    }

    pub async fn load_recipe_relations(
        &self,
        recipes: &[recipes::Model],
    ) -> Result<(Vec<Vec<tags::Model>>, Vec<Vec<ingredients::Model>>)> {
        self.recipe_repo().load_relations(recipes).await
    }

    // ========== Tags ==========

    pub async fn list_tags(&self, user_id: i32, assigned_only: bool) -> Result<Vec<tags::Model>> {
        self.tag_repo().list(user_id, assigned_only).await
    }

    pub async fn get_tag(&self, user_id: i32, id: i32) -> Result<Option<tags::Model>> {
        self.tag_repo().get(user_id, id).await
    }

    pub async fn rename_tag(
        &self,
        user_id: i32,
        id: i32,
        name: &str,
    ) -> Result<Option<tags::Model>> {
        self.tag_repo().rename(user_id, id, name).await
    }

    pub async fn remove_tag(&self, user_id: i32, id: i32) -> Result<bool> {
        self.tag_repo().remove(user_id, id).await
    }

    // ========== Ingredients ==========

    pub async fn list_ingredients(
        &self,
        user_id: i32,
        assigned_only: bool,
    ) -> Result<Vec<ingredients::Model>> {
        self.ingredient_repo().list(user_id, assigned_only).await
    }

    pub async fn get_ingredient(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<Option<ingredients::Model>> {
        self.ingredient_repo().get(user_id, id).await
    }

    pub async fn rename_ingredient(
        &self,
        user_id: i32,
        id: i32,
        name: &str,
    ) -> Result<Option<ingredients::Model>> {
        self.ingredient_repo().rename(user_id, id, name).await
    }

    pub async fn remove_ingredient(&self, user_id: i32, id: i32) -> Result<bool> {
        self.ingredient_repo().remove(user_id, id).await
    }
}
