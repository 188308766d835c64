//! Operator management endpoints (administrators only)

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::user::{CreateUser, User},
    AppState,
};

use super::AuthenticatedUser;

/// List operators
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of operators", body = Vec<User>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<User>>> {
    claims.require_admin()?;

    let users = state.services.users.list().await?;
    Ok(Json(users))
}

/// Create a new operator
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Administrator privileges required"),
        (status = 409, description = "Login already exists")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(user): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_admin()?;

    let created = state.services.users.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
