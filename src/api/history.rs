//! Audit log endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        history::{History, HistoryQuery},
        item::OperationNote,
    },
    AppState,
};

use super::{AuthenticatedUser, Note};

/// List history entries, newest first
#[utoipa::path(
    get,
    path = "/history",
    tag = "history",
    security(("bearer_auth" = [])),
    params(HistoryQuery),
    responses(
        (status = 200, description = "History entries", body = Vec<History>)
    )
)]
pub async fn list_history(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<History>>> {
    let entries = state.services.history.list(&query).await?;
    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/history/{id}",
    tag = "history",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "History entry ID")
    ),
    responses(
        (status = 200, description = "History entry", body = History),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn get_history(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<History>> {
    let entry = state.services.history.get(id).await?;
    Ok(Json(entry))
}

/// Reverse a pending loan or return
#[utoipa::path(
    post,
    path = "/history/{id}/reverse",
    tag = "history",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Entry to reverse")
    ),
    request_body(content = OperationNote, description = "Optional note"),
    responses(
        (status = 200, description = "Reversal recorded", body = History),
        (status = 404, description = "Entry not found"),
        (status = 422, description = "Entry cannot be reversed")
    )
)]
pub async fn reverse_history(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Note(extra): Note,
) -> AppResult<Json<History>> {
    let entry = state
        .services
        .history
        .reverse(id, extra, claims.operator())
        .await?;
    Ok(Json(entry))
}
