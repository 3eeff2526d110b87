// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test account funding and balance reads.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    state::AppState,
    stellar::{BalanceLine, HorizonError, StellarKeypair},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TestAccountResponse {
    pub public_key: String,
    /// Secret seed of the funded account. Never stored by the server.
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalancesResponse {
    pub public_key: String,
    pub balances: Vec<BalanceLine>,
}

/// Create and fund a throwaway account through friendbot.
#[utoipa::path(
    post,
    path = "/v1/accounts/test-account",
    tag = "Accounts",
    responses(
        (status = 201, description = "Account funded", body = TestAccountResponse),
        (status = 400, description = "Friendbot is not available on this network"),
        (status = 503, description = "Friendbot request failed")
    )
)]
pub async fn create_test_account(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TestAccountResponse>), ApiError> {
    if state.network.friendbot_url.is_none() {
        return Err(ApiError::bad_request(
            "Test accounts are only available on the test network",
        ));
    }

    let (keypair, secret) = StellarKeypair::generate()
        .map_err(|e| ApiError::internal(format!("Key generation failed: {e}")))?;
    let public_key = keypair.public_key().to_string();

    state
        .ledger
        .fund_test_account(&public_key)
        .await
        .map_err(|e| match e {
            HorizonError::FriendbotUnavailable => ApiError::bad_request(e.to_string()),
            other => {
                warn!(public_key = %public_key, error = %other, "Friendbot funding failed");
                ApiError::service_unavailable(format!("Failed to fund test account: {other}"))
            }
        })?;

    info!(public_key = %public_key, "Test account funded");

    Ok((
        StatusCode::CREATED,
        Json(TestAccountResponse { public_key, secret }),
    ))
}

/// Current balances of any account.
#[utoipa::path(
    get,
    path = "/v1/accounts/{public_key}/balances",
    tag = "Accounts",
    params(
        ("public_key" = String, Path, description = "Stellar account address (G...)")
    ),
    responses(
        (status = 200, description = "Account balances", body = BalancesResponse),
        (status = 400, description = "Malformed address"),
        (status = 404, description = "Account not found"),
        (status = 503, description = "Network unavailable")
    )
)]
pub async fn get_balances(
    State(state): State<AppState>,
    Path(public_key): Path<String>,
) -> Result<Json<BalancesResponse>, ApiError> {
    let balances = state.balances.get_balances(&public_key).await?;
    Ok(Json(BalancesResponse {
        public_key,
        balances,
    }))
}
