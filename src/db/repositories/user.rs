use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{auth_tokens, users};

/// User data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Partial update for the `me` endpoint; `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        email: &str,
        password: &str,
        name: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        let password = password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let model = users::ActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            name: Set(name.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Verify credentials; returns the user on success.
    /// Note: uses `spawn_blocking` because Argon2 verification is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    /// Apply a partial profile update; password is re-hashed when present.
    pub async fn update(&self, id: i32, patch: UserPatch, config: &SecurityConfig) -> Result<User> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();

        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(password) = patch.password {
            let config = config.clone();
            let new_hash = task::spawn_blocking(move || hash_password(&password, &config))
                .await
                .context("Password hashing task panicked")??;
            active.password_hash = Set(new_hash);
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&self.conn).await?;

        Ok(User::from(model))
    }

    /// Return the user's bearer token, creating one on first issue.
    pub async fn issue_token(&self, user_id: i32) -> Result<String> {
        let existing = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query auth token")?;

        if let Some(token) = existing {
            return Ok(token.key);
        }

        let key = generate_token_key();

        auth_tokens::ActiveModel {
            key: Set(key.clone()),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert auth token")?;

        Ok(key)
    }

    /// Resolve a bearer token to its user.
    pub async fn verify_token(&self, key: &str) -> Result<Option<User>> {
        let token = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::Key.eq(key))
            .one(&self.conn)
            .await
            .context("Failed to query auth token by key")?;

        let Some(token) = token else {
            return Ok(None);
        };

        self.get_by_id(token.user_id).await
    }
}

/// Hash a password using Argon2id with the configured params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random bearer token (64 character hex string)
#[must_use]
pub fn generate_token_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
