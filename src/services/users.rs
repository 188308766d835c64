//! Authentication and operator management service

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::{AuthConfig, BootstrapAdminConfig},
    error::{AppError, AppResult},
    models::user::{CreateUser, User, UserClaims},
    repository::UserStore,
};

#[derive(Clone)]
pub struct UsersService {
    store: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(store: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    /// Authenticate user by login and return a JWT token
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .store
            .get_user_by_login(login)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        if !verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!(user_id = user.id, login = %user.login, "Operator logged in");
        Ok((token, user))
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.login.clone(),
            user_id: user.id,
            is_admin: user.is_admin,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.store.get_user(id).await
    }

    /// Load the account behind a token, refusing removed or disabled ones
    pub async fn ensure_active(&self, id: i32) -> AppResult<User> {
        let user = match self.store.get_user(id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("Account not found".to_string()))
            }
            Err(e) => return Err(e),
        };
        if !user.is_active {
            tracing::warn!(user_id = id, "Rejected token of disabled account");
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }
        Ok(user)
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.store.list_users().await
    }

    /// Create a new operator
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        user.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let hash = hash_password(&user.password)?;
        let created = self
            .store
            .create_user(user.login.trim(), &hash, user.full_name, user.is_admin)
            .await?;
        tracing::info!(user_id = created.id, login = %created.login, "User created");
        Ok(created)
    }

    /// Create the configured administrator when no account exists yet
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdminConfig) -> AppResult<Option<User>> {
        if self.store.count_users().await? > 0 {
            return Ok(None);
        }
        let hash = hash_password(&admin.password)?;
        let user = self
            .store
            .create_user(&admin.login, &hash, admin.full_name.clone(), true)
            .await?;
        tracing::info!(login = %user.login, "Bootstrap administrator created");
        Ok(Some(user))
    }
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}
