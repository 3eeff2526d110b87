// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Payment and path payment endpoints.
//!
//! `build` endpoints return an unsigned envelope for client-side signing.
//! `execute` endpoints take the caller's secret for the duration of the
//! request, sign server-side and record the outcome in the operation ledger.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::Auth,
    error::ApiError,
    state::AppState,
    stellar::{
        format_amount, is_valid_public_key, make_asset, AssetDescriptor, AssetRequest,
        ExecutionOutcome, PathPaymentIntent, PathPaymentRequest, PaymentIntent, PaymentRequest,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BuildPaymentRequest {
    pub source_public_key: String,
    pub destination: String,
    pub amount: String,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
    #[serde(default)]
    pub memo_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BuildPaymentResponse {
    /// Unsigned base64 XDR transaction envelope
    pub xdr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExecutePaymentRequest {
    /// Destination address, or the name of one of the caller's contacts
    pub destination: String,
    pub amount: String,
    pub secret_key: String,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
    #[serde(default)]
    pub memo_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BuildPathPaymentRequest {
    pub source_public_key: String,
    pub destination: String,
    pub source_asset: AssetRequest,
    pub dest_asset: AssetRequest,
    pub dest_amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BuildPathPaymentResponse {
    pub xdr: String,
    /// Most the source account will spend
    pub send_max: String,
    /// Intermediate assets of the selected route
    pub path: Vec<AssetDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExecutePathPaymentRequest {
    /// Destination address, or the name of one of the caller's contacts
    pub destination: String,
    pub source_asset: AssetRequest,
    pub dest_asset: AssetRequest,
    pub dest_amount: String,
    pub secret_key: String,
}

/// Result of an executed transfer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExecutionResponse {
    pub success: bool,
    pub operation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Network result codes (`tx_failed: op_underfunded`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_codes: Option<String>,
}

fn execution_response(outcome: ExecutionOutcome) -> (StatusCode, Json<ExecutionResponse>) {
    match outcome {
        ExecutionOutcome::Completed {
            operation_id, hash, ..
        } => (
            StatusCode::OK,
            Json(ExecutionResponse {
                success: true,
                operation_id,
                hash: Some(hash),
                error: None,
                result_codes: None,
            }),
        ),
        ExecutionOutcome::Rejected {
            operation_id,
            failure,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ExecutionResponse {
                success: false,
                operation_id,
                hash: None,
                error: Some(failure.reason()),
                result_codes: failure.result_codes(),
            }),
        ),
        ExecutionOutcome::Failed {
            operation_id,
            error,
        } => {
            let mapped = ApiError::from(error);
            (
                mapped.status,
                Json(ExecutionResponse {
                    success: false,
                    operation_id,
                    hash: None,
                    error: Some(mapped.message),
                    result_codes: None,
                }),
            )
        }
    }
}

/// Accept an address as is, otherwise resolve it as one of the caller's
/// contact names.
async fn resolve_destination(
    state: &AppState,
    user_id: &str,
    destination: &str,
) -> Result<String, ApiError> {
    let destination = destination.trim();
    if is_valid_public_key(destination) {
        return Ok(destination.to_string());
    }
    match state.contacts.find_by_name(user_id, destination).await? {
        Some(contact) => Ok(contact.stellar_public_key),
        None => Err(ApiError::bad_request(format!(
            "Destination {destination} is neither a valid address nor a known contact"
        ))),
    }
}

#[utoipa::path(
    post,
    path = "/v1/payments/build",
    tag = "Payments",
    request_body = BuildPaymentRequest,
    responses(
        (status = 200, description = "Unsigned envelope", body = BuildPaymentResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Source account not found"),
        (status = 503, description = "Network unavailable")
    )
)]
pub async fn build_payment(
    State(state): State<AppState>,
    Json(request): Json<BuildPaymentRequest>,
) -> Result<Json<BuildPaymentResponse>, ApiError> {
    let intent = PaymentIntent {
        source: request.source_public_key.trim().to_string(),
        destination: request.destination.trim().to_string(),
        asset: make_asset(request.asset_code.as_deref(), request.asset_issuer.as_deref())?,
        amount: request.amount,
        memo: request.memo_text.filter(|m| !m.is_empty()),
    };
    let envelope = state.builder.build_payment(&intent).await?;
    Ok(Json(BuildPaymentResponse {
        xdr: envelope.to_xdr_base64()?,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/payments/execute",
    tag = "Payments",
    security(("bearer_auth" = [])),
    request_body = ExecutePaymentRequest,
    responses(
        (status = 200, description = "Payment completed", body = ExecutionResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Source account not found", body = ExecutionResponse),
        (status = 422, description = "Payment rejected by the network", body = ExecutionResponse),
        (status = 503, description = "Network unavailable", body = ExecutionResponse)
    )
)]
pub async fn execute_payment(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<ExecutePaymentRequest>,
) -> Result<(StatusCode, Json<ExecutionResponse>), ApiError> {
    let destination = resolve_destination(&state, &user.user_id, &request.destination).await?;
    let asset = make_asset(request.asset_code.as_deref(), request.asset_issuer.as_deref())?;

    let outcome = state
        .executor
        .execute_payment(
            PaymentRequest {
                user_id: user.user_id,
                destination,
                asset,
                amount: request.amount,
                memo: request.memo_text,
            },
            &request.secret_key,
        )
        .await?;
    Ok(execution_response(outcome))
}

#[utoipa::path(
    post,
    path = "/v1/path-payments/build",
    tag = "Payments",
    request_body = BuildPathPaymentRequest,
    responses(
        (status = 200, description = "Unsigned envelope over the cheapest path", body = BuildPathPaymentResponse),
        (status = 400, description = "Invalid request"),
        (status = 422, description = "No conversion path between assets")
    )
)]
pub async fn build_path_payment(
    State(state): State<AppState>,
    Json(request): Json<BuildPathPaymentRequest>,
) -> Result<Json<BuildPathPaymentResponse>, ApiError> {
    let intent = PathPaymentIntent {
        source: request.source_public_key.trim().to_string(),
        destination: request.destination.trim().to_string(),
        source_asset: request.source_asset.to_asset()?,
        dest_asset: request.dest_asset.to_asset()?,
        dest_amount: request.dest_amount,
        resolved: None,
    };
    intent.validate()?;

    let cheapest = state
        .path_finder
        .find_cheapest_path(&intent.source_asset, &intent.dest_asset, &intent.dest_amount)
        .await?;
    let send_max = format_amount(cheapest.source_stroops);
    let path = cheapest.path.iter().map(|asset| asset.descriptor()).collect();

    let envelope = state
        .builder
        .build_path_payment(&intent.with_path(cheapest))
        .await?;

    Ok(Json(BuildPathPaymentResponse {
        xdr: envelope.to_xdr_base64()?,
        send_max,
        path,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/path-payments/execute",
    tag = "Payments",
    security(("bearer_auth" = [])),
    request_body = ExecutePathPaymentRequest,
    responses(
        (status = 200, description = "Path payment completed", body = ExecutionResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Source account not found", body = ExecutionResponse),
        (status = 422, description = "No path, or rejected by the network", body = ExecutionResponse),
        (status = 503, description = "Network unavailable", body = ExecutionResponse)
    )
)]
pub async fn execute_path_payment(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<ExecutePathPaymentRequest>,
) -> Result<(StatusCode, Json<ExecutionResponse>), ApiError> {
    let destination = resolve_destination(&state, &user.user_id, &request.destination).await?;

    let outcome = state
        .executor
        .execute_path_payment(
            PathPaymentRequest {
                user_id: user.user_id,
                destination,
                source_asset: request.source_asset.to_asset()?,
                dest_asset: request.dest_asset.to_asset()?,
                dest_amount: request.dest_amount,
            },
            &request.secret_key,
        )
        .await?;
    Ok(execution_response(outcome))
}
