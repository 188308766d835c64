//! Peripheral endpoints and item attachment

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
        item::OperationNote,
        peripheral::{CreatePeripheral, Peripheral, ReplacePeripheral},
    },
    AppState,
};

use super::{AuthenticatedUser, Note};

#[derive(Serialize, ToSchema)]
pub struct PeripheralChange {
    pub peripheral: Peripheral,
    pub history: History,
}

/// List active peripherals
#[utoipa::path(
    get,
    path = "/peripherals",
    tag = "peripherals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active peripherals", body = Vec<Peripheral>)
    )
)]
pub async fn list_peripherals(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Peripheral>>> {
    let peripherals = state.services.peripherals.list().await?;
    Ok(Json(peripherals))
}

#[utoipa::path(
    get,
    path = "/peripherals/{id}",
    tag = "peripherals",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Peripheral ID")
    ),
    responses(
        (status = 200, description = "Peripheral", body = Peripheral),
        (status = 404, description = "Peripheral not found")
    )
)]
pub async fn get_peripheral(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Peripheral>> {
    let peripheral = state.services.peripherals.get(id).await?;
    Ok(Json(peripheral))
}

/// Register a peripheral
#[utoipa::path(
    post,
    path = "/peripherals",
    tag = "peripherals",
    security(("bearer_auth" = [])),
    request_body = CreatePeripheral,
    responses(
        (status = 201, description = "Peripheral registered", body = PeripheralChange),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Identifier already in use")
    )
)]
pub async fn create_peripheral(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreatePeripheral>,
) -> AppResult<(StatusCode, Json<PeripheralChange>)> {
    let (peripheral, history) = state
        .services
        .peripherals
        .create(data, claims.operator())
        .await?;
    Ok((StatusCode::CREATED, Json(PeripheralChange { peripheral, history })))
}

/// Soft delete a peripheral that is not attached anywhere
#[utoipa::path(
    delete,
    path = "/peripherals/{id}",
    tag = "peripherals",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Peripheral ID")
    ),
    request_body(content = OperationNote, description = "Optional note"),
    responses(
        (status = 200, description = "Peripheral deleted", body = History),
        (status = 404, description = "Peripheral not found"),
        (status = 422, description = "Peripheral is attached to an item")
    )
)]
pub async fn delete_peripheral(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Note(extra): Note,
) -> AppResult<Json<History>> {
    let history = state
        .services
        .peripherals
        .delete(id, extra, claims.operator())
        .await?;
    Ok(Json(history))
}

/// Attach a peripheral to an item
#[utoipa::path(
    post,
    path = "/items/{id}/peripherals/{peripheral_id}",
    tag = "peripherals",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID"),
        ("peripheral_id" = i32, Path, description = "Peripheral ID")
    ),
    request_body(content = OperationNote, description = "Optional note"),
    responses(
        (status = 200, description = "Peripheral attached", body = History),
        (status = 404, description = "Item or peripheral not found"),
        (status = 409, description = "Already attached to this item"),
        (status = 422, description = "Peripheral was replaced")
    )
)]
pub async fn attach_peripheral(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((item_id, peripheral_id)): Path<(i32, i32)>,
    Note(extra): Note,
) -> AppResult<Json<History>> {
    let history = state
        .services
        .peripherals
        .attach(item_id, peripheral_id, extra, claims.operator())
        .await?;
    Ok(Json(history))
}

/// Detach a peripheral from an item
#[utoipa::path(
    delete,
    path = "/items/{id}/peripherals/{peripheral_id}",
    tag = "peripherals",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID"),
        ("peripheral_id" = i32, Path, description = "Peripheral ID")
    ),
    request_body(content = OperationNote, description = "Optional note"),
    responses(
        (status = 200, description = "Peripheral detached", body = History),
        (status = 404, description = "Peripheral is not attached to this item")
    )
)]
pub async fn detach_peripheral(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((item_id, peripheral_id)): Path<(i32, i32)>,
    Note(extra): Note,
) -> AppResult<Json<History>> {
    let history = state
        .services
        .peripherals
        .detach(item_id, peripheral_id, extra, claims.operator())
        .await?;
    Ok(Json(history))
}

/// Replace an attached peripheral by another one
#[utoipa::path(
    post,
    path = "/items/{id}/peripherals/{peripheral_id}/replace",
    tag = "peripherals",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID"),
        ("peripheral_id" = i32, Path, description = "Peripheral being replaced")
    ),
    request_body = ReplacePeripheral,
    responses(
        (status = 200, description = "Peripheral replaced", body = History),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Item or peripheral not found")
    )
)]
pub async fn replace_peripheral(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((item_id, peripheral_id)): Path<(i32, i32)>,
    Json(request): Json<ReplacePeripheral>,
) -> AppResult<Json<History>> {
    let history = state
        .services
        .peripherals
        .replace(item_id, peripheral_id, request, claims.operator())
        .await?;
    Ok(Json(history))
}
