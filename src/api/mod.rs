//! API handlers for the inventory REST endpoints

pub mod auth;
pub mod health;
pub mod history;
pub mod items;
pub mod openapi;
pub mod options;
pub mod peripherals;
pub mod users;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{audit::AuditExtra, error::AppError, models::item::OperationNote, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let mut claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        // Tokens outlive account changes; the stored account decides
        let user = state.services.users.ensure_active(claims.user_id).await?;
        claims.is_admin = user.is_admin;

        Ok(AuthenticatedUser(claims))
    }
}

/// Optional note body of confirmations, returns and deletions.
///
/// An empty body means no note; anything else must be a valid `OperationNote`.
pub struct Note(pub AuditExtra);

#[async_trait]
impl<S> FromRequest<S> for Note
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Note(AuditExtra::default()));
        }

        let Json(note) = Json::<OperationNote>::from_bytes(&bytes)
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(Note(note.into()))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        // Items
        .route("/items", get(items::list_items).post(items::create_item))
        .route(
            "/items/:id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route("/items/:id/purge", delete(items::purge_item))
        .route("/items/:id/history", get(items::item_history))
        // Lending
        .route("/items/:id/loan", post(items::lend_item))
        .route("/items/:id/loan/confirm", post(items::confirm_loan))
        .route("/items/:id/return", post(items::return_item))
        .route("/items/:id/return/confirm", post(items::confirm_return))
        // Peripherals
        .route(
            "/items/:id/peripherals/:peripheral_id",
            post(peripherals::attach_peripheral).delete(peripherals::detach_peripheral),
        )
        .route(
            "/items/:id/peripherals/:peripheral_id/replace",
            post(peripherals::replace_peripheral),
        )
        .route(
            "/peripherals",
            get(peripherals::list_peripherals).post(peripherals::create_peripheral),
        )
        .route(
            "/peripherals/:id",
            get(peripherals::get_peripheral).delete(peripherals::delete_peripheral),
        )
        // History
        .route("/history", get(history::list_history))
        .route("/history/:id", get(history::get_history))
        .route("/history/:id/reverse", post(history::reverse_history))
        // Choice lists
        .route("/options", get(options::get_options))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        models::user::User,
        repository::{
            history::MockHistoryStore, items::MockItemStore, peripherals::MockPeripheralStore,
            users::MockUserStore, Repository,
        },
        services::Services,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    // Token holder as stored in the users table
    fn account(is_admin: bool, is_active: bool) -> User {
        User {
            id: 3,
            login: "joao".to_string(),
            password: String::new(),
            full_name: None,
            is_admin,
            is_active,
            crea_date: chrono::Utc::now(),
        }
    }

    // Only the users store answers; the pool never connects
    fn app_for(is_admin: bool, is_active: bool) -> Router {
        let config = AppConfig::default();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();

        let mut users = MockUserStore::new();
        users
            .expect_get_user()
            .returning(move |_| Ok(account(is_admin, is_active)));
        let services = Services::from_stores(
            Arc::new(users),
            Arc::new(MockItemStore::new()),
            Arc::new(MockPeripheralStore::new()),
            Arc::new(MockHistoryStore::new()),
            config.auth.clone(),
        );

        create_router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
            repository: Repository::new(pool),
        })
    }

    fn app() -> Router {
        app_for(false, true)
    }

    fn bearer(is_admin: bool) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = UserClaims {
            sub: "joao".to_string(),
            user_id: 3,
            is_admin,
            exp: now + 3600,
            iat: now,
        };
        let token = claims
            .create_token(&AppConfig::default().auth.jwt_secret)
            .unwrap();
        format!("Bearer {}", token)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = app()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_items_require_a_token() {
        let response = app()
            .oneshot(Request::get("/api/v1/items").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app()
            .oneshot(
                Request::get("/api/v1/items")
                    .header(AUTHORIZATION, "Basic abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_disabled_account_token_is_rejected() {
        let request = Request::post("/api/v1/items")
            .header(AUTHORIZATION, bearer(false))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"tipo": "Celular"}"#))
            .unwrap();
        let response = app_for(false, false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_flag_comes_from_the_account() {
        // token still claims admin after the account lost it
        let request = Request::delete("/api/v1/items/1/purge")
            .header(AUTHORIZATION, bearer(true))
            .body(Body::empty())
            .unwrap();
        let response = app_for(false, true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_invalid_form_is_rejected_before_the_database() {
        let request = Request::post("/api/v1/items")
            .header(AUTHORIZATION, bearer(false))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"tipo": "Celular"}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["code"], 19);
        for field in ["brand", "model", "revenda", "nota_fiscal", "fornecedor", "identificador"] {
            assert!(body["fields"][field].is_array(), "{}", field);
        }
    }

    #[tokio::test]
    async fn test_malformed_note_is_rejected() {
        let request = Request::post("/api/v1/items/1/loan/confirm")
            .header(AUTHORIZATION, bearer(false))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"details": 12"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_note_body_is_optional() {
        let request = Request::post("/").body(Body::empty()).unwrap();
        let Note(extra) = Note::from_request(request, &()).await.unwrap();
        assert_eq!(extra, AuditExtra::default());

        let request = Request::post("/")
            .body(Body::from(r#"{"details": "entregue na portaria"}"#))
            .unwrap();
        let Note(extra) = Note::from_request(request, &()).await.unwrap();
        assert_eq!(extra.details.as_deref(), Some("entregue na portaria"));

        let request = Request::post("/").body(Body::from("not json")).unwrap();
        let result = Note::from_request(request, &()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_purge_requires_admin() {
        let request = Request::delete("/api/v1/items/1/purge")
            .header(AUTHORIZATION, bearer(false))
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_options_lists_branches() {
        let response = app()
            .oneshot(Request::get("/api/v1/options").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["revendas"][0], "Revalle Juazeiro");
    }
}
