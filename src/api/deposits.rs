// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Anchor deposit endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::Auth,
    deposits::{DepositInitiated, DepositStatus},
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDepositRequest {
    /// Account that receives the deposited asset
    pub public_key: String,
    pub asset_code: String,
    /// Decimal amount (`^\d+(\.\d+)?$`)
    pub amount: String,
}

/// Start an interactive deposit with the anchor.
#[utoipa::path(
    post,
    path = "/v1/deposits",
    tag = "Deposits",
    security(("bearer_auth" = [])),
    request_body = CreateDepositRequest,
    responses(
        (status = 201, description = "Deposit initiated", body = DepositInitiated),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Anchor request failed")
    )
)]
pub async fn create_deposit(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateDepositRequest>,
) -> Result<(StatusCode, Json<DepositInitiated>), ApiError> {
    let initiated = state
        .deposits
        .initiate(
            &user.user_id,
            request.public_key.trim(),
            request.asset_code.trim(),
            request.amount.trim(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(initiated)))
}

/// Reconcile a deposit with the anchor and return its current state.
#[utoipa::path(
    get,
    path = "/v1/deposits/{operation_id}/status",
    tag = "Deposits",
    security(("bearer_auth" = [])),
    params(
        ("operation_id" = String, Path, description = "Deposit operation ID")
    ),
    responses(
        (status = 200, description = "Deposit state", body = DepositStatus),
        (status = 400, description = "Operation is not a deposit"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Deposit not found"),
        (status = 502, description = "Anchor request failed")
    )
)]
pub async fn deposit_status(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(operation_id): Path<String>,
) -> Result<Json<DepositStatus>, ApiError> {
    let status = state
        .deposits
        .check_status(&user.user_id, &operation_id)
        .await?;
    Ok(Json(status))
}
