//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, health, history, items, options, peripherals, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory API",
        version = "1.0.0",
        description = "IT equipment inventory with lending lifecycle and audit trail"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::logout,
        auth::me,
        // Users
        users::list_users,
        users::create_user,
        // Items
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        items::purge_item,
        items::lend_item,
        items::confirm_loan,
        items::return_item,
        items::confirm_return,
        items::item_history,
        // Peripherals
        peripherals::list_peripherals,
        peripherals::get_peripheral,
        peripherals::create_peripheral,
        peripherals::delete_peripheral,
        peripherals::attach_peripheral,
        peripherals::detach_peripheral,
        peripherals::replace_peripheral,
        // History
        history::list_history,
        history::get_history,
        history::reverse_history,
        // Options
        options::get_options,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            // Users
            crate::models::user::User,
            crate::models::user::CreateUser,
            // Items
            crate::models::item::Item,
            crate::models::item::ItemDetails,
            crate::models::item::ItemForm,
            crate::models::item::LoanRequest,
            crate::models::item::OperationNote,
            items::ItemChange,
            // Peripherals
            crate::models::peripheral::Peripheral,
            crate::models::peripheral::CreatePeripheral,
            crate::models::peripheral::ReplacePeripheral,
            peripherals::PeripheralChange,
            // History
            crate::models::history::History,
            crate::models::history::HistoryQuery,
            // Enums
            crate::models::enums::EquipmentType,
            crate::models::enums::ItemStatus,
            crate::models::enums::PeripheralStatus,
            crate::models::enums::Operation,
            crate::models::enums::Poe,
            // Options
            options::OptionsResponse,
            options::TypeRules,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "Operator management"),
        (name = "items", description = "Equipment items"),
        (name = "lending", description = "Loan and return lifecycle"),
        (name = "peripherals", description = "Peripherals and item attachment"),
        (name = "history", description = "Audit trail"),
        (name = "options", description = "Choice lists")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/items/{id}/loan/confirm",
            "/items/{id}/peripherals/{peripheral_id}/replace",
            "/history/{id}/reverse",
            "/options",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{}", path);
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
