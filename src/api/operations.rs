// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{auth::Auth, error::ApiError, state::AppState, storage::OperationRecord};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OperationListResponse {
    pub operations: Vec<OperationRecord>,
    pub total: usize,
}

/// Operation history of the caller, newest first.
#[utoipa::path(
    get,
    path = "/v1/operations",
    tag = "Operations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Operation records", body = OperationListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_operations(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<OperationListResponse>, ApiError> {
    let operations = state.operations.find_by_user(&user.user_id).await?;
    let total = operations.len();
    Ok(Json(OperationListResponse { operations, total }))
}

/// One operation record. Records of other users are reported as missing.
#[utoipa::path(
    get,
    path = "/v1/operations/{operation_id}",
    tag = "Operations",
    security(("bearer_auth" = [])),
    params(
        ("operation_id" = String, Path, description = "Operation ID")
    ),
    responses(
        (status = 200, description = "Operation record", body = OperationRecord),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Operation not found")
    )
)]
pub async fn get_operation(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(operation_id): Path<String>,
) -> Result<Json<OperationRecord>, ApiError> {
    state
        .operations
        .find_by_id(&operation_id)
        .await?
        .filter(|record| record.user_id == user.user_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Operation {operation_id} not found")))
}
