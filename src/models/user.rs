//! User (operator) model and authentication claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Operator account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub login: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub crea_date: DateTime<Utc>,
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 150, message = "Login must be at least 3 characters"))]
    pub login: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// The authenticated actor recorded on history rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub id: i32,
    pub login: String,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn operator(&self) -> Operator {
        Operator {
            id: self.user_id,
            login: self.sub.clone(),
        }
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}
