//! Users repository for database operations

use async_trait::async_trait;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::user::User,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: i32) -> AppResult<User>;

    async fn get_user_by_login(&self, login: &str) -> AppResult<Option<User>>;

    async fn list_users(&self) -> AppResult<Vec<User>>;

    async fn count_users(&self) -> AppResult<i64>;

    /// `password_hash` is already hashed
    async fn create_user(
        &self,
        login: &str,
        password_hash: &str,
        full_name: Option<String>,
        is_admin: bool,
    ) -> AppResult<User>;
}

#[async_trait]
impl UserStore for Repository {
    async fn get_user(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn get_user_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(login) = LOWER($1)")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY login")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn count_users(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_user(
        &self,
        login: &str,
        password_hash: &str,
        full_name: Option<String>,
        is_admin: bool,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (login, password, full_name, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .bind(full_name)
        .bind(is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("Login '{}' already exists", login)))
    }
}
