//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, models::user::User, AppState};

use super::AuthenticatedUser;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the Authorization header
    pub token: String,
    pub token_type: String,
    pub user: UserInfo,
}

/// Operator as seen by clients
#[derive(Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i32,
    pub login: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            full_name: user.full_name,
            is_admin: user.is_admin,
        }
    }
}

/// Log in with login and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, user) = state
        .services
        .users
        .authenticate(&request.login, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        user: user.into(),
    }))
}

/// Log out. Tokens are stateless; clients drop theirs.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(AuthenticatedUser(claims): AuthenticatedUser) -> StatusCode {
    tracing::info!(user_id = claims.user_id, login = %claims.sub, "Operator logged out");
    StatusCode::NO_CONTENT
}

/// Current operator
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current operator", body = UserInfo),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserInfo>> {
    let user = state.services.users.get_by_id(claims.user_id).await?;
    Ok(Json(user.into()))
}
