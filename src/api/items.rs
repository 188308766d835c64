//! Item endpoints: registration, edits, deletion and the lending lifecycle

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        history::History,
        item::{Item, ItemDetails, ItemForm, LoanRequest, OperationNote},
    },
    AppState,
};

use super::{AuthenticatedUser, Note};

/// Item after a change, with the history entry recording it
#[derive(Serialize, ToSchema)]
pub struct ItemChange {
    pub item: Item,
    pub history: History,
}

impl From<(Item, History)> for ItemChange {
    fn from((item, history): (Item, History)) -> Self {
        Self { item, history }
    }
}

/// List active items
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active items, id ascending", body = Vec<Item>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Item>>> {
    let items = state.services.items.list().await?;
    Ok(Json(items))
}

/// Get an item with its attached peripherals
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item details", body = ItemDetails),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ItemDetails>> {
    let item = state.services.items.get(id).await?;
    Ok(Json(item))
}

/// Register a new item
#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    security(("bearer_auth" = [])),
    request_body = ItemForm,
    responses(
        (status = 201, description = "Item registered", body = ItemChange),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<ItemForm>,
) -> AppResult<(StatusCode, Json<ItemChange>)> {
    let created = state.services.items.create(form, claims.operator()).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Edit an item's descriptive and technical fields
#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    request_body = ItemForm,
    responses(
        (status = 200, description = "Item updated", body = ItemChange),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 404, description = "Item not found")
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<ItemForm>,
) -> AppResult<Json<ItemChange>> {
    let updated = state.services.items.update(id, form, claims.operator()).await?;
    Ok(Json(updated.into()))
}

/// Soft delete an item
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    request_body(content = OperationNote, description = "Optional note"),
    responses(
        (status = 200, description = "Item deleted", body = History),
        (status = 404, description = "Item not found"),
        (status = 422, description = "Item is on loan")
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Note(extra): Note,
) -> AppResult<Json<History>> {
    let history = state
        .services
        .items
        .delete(id, extra, claims.operator())
        .await?;
    Ok(Json(history))
}

/// Permanently remove an item, keeping its history
#[utoipa::path(
    delete,
    path = "/items/{id}/purge",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    request_body(content = OperationNote, description = "Optional note"),
    responses(
        (status = 200, description = "Item purged", body = History),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn purge_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Note(extra): Note,
) -> AppResult<Json<History>> {
    claims.require_admin()?;

    let history = state
        .services
        .items
        .purge(id, extra, claims.operator())
        .await?;
    Ok(Json(history))
}

/// Lend an available item
#[utoipa::path(
    post,
    path = "/items/{id}/loan",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    request_body = LoanRequest,
    responses(
        (status = 200, description = "Loan pending confirmation", body = ItemChange),
        (status = 400, description = "Borrower missing", body = crate::error::ErrorResponse),
        (status = 422, description = "Item is not available")
    )
)]
pub async fn lend_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<LoanRequest>,
) -> AppResult<Json<ItemChange>> {
    let change = state.services.items.lend(id, request, claims.operator()).await?;
    Ok(Json(change.into()))
}

/// Confirm a pending loan
#[utoipa::path(
    post,
    path = "/items/{id}/loan/confirm",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    request_body(content = OperationNote, description = "Optional note and attachments"),
    responses(
        (status = 200, description = "Loan confirmed", body = ItemChange),
        (status = 422, description = "No pending loan")
    )
)]
pub async fn confirm_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Note(extra): Note,
) -> AppResult<Json<ItemChange>> {
    let change = state
        .services
        .items
        .confirm_loan(id, extra, claims.operator())
        .await?;
    Ok(Json(change.into()))
}

/// Start the return of a lent item
#[utoipa::path(
    post,
    path = "/items/{id}/return",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    request_body(content = OperationNote, description = "Optional note and attachments"),
    responses(
        (status = 200, description = "Return pending confirmation", body = ItemChange),
        (status = 422, description = "Item is not lent")
    )
)]
pub async fn return_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Note(extra): Note,
) -> AppResult<Json<ItemChange>> {
    let change = state
        .services
        .items
        .give_back(id, extra, claims.operator())
        .await?;
    Ok(Json(change.into()))
}

/// Confirm a pending return; the item becomes available again
#[utoipa::path(
    post,
    path = "/items/{id}/return/confirm",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    request_body(content = OperationNote, description = "Optional note and attachments"),
    responses(
        (status = 200, description = "Return confirmed", body = ItemChange),
        (status = 422, description = "No pending return")
    )
)]
pub async fn confirm_return(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Note(extra): Note,
) -> AppResult<Json<ItemChange>> {
    let change = state
        .services
        .items
        .confirm_return(id, extra, claims.operator())
        .await?;
    Ok(Json(change.into()))
}

/// History of one item, newest first
#[utoipa::path(
    get,
    path = "/items/{id}/history",
    tag = "history",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "History entries", body = Vec<History>)
    )
)]
pub async fn item_history(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<History>>> {
    let entries = state.services.history.for_item(id).await?;
    Ok(Json(entries))
}
