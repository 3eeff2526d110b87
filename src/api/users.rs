// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User registration and login.
//!
//! Registration generates a Stellar keypair and returns its secret exactly
//! once; only the public key is stored.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::issue_session_token,
    error::ApiError,
    state::AppState,
    stellar::StellarKeypair,
    storage::UserRecord,
};

const SECRET_WARNING: &str =
    "Store this secret key securely. It is shown only once and cannot be recovered.";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user: UserRecord,
    /// Stellar secret seed of the new account. Never stored by the server.
    pub secret_key: String,
    pub warning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub session_token: String,
    pub user_id: String,
    pub public_key: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Register a new user with a freshly generated Stellar keypair.
#[utoipa::path(
    post,
    path = "/v1/users/register",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Neither email nor phone number given"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = non_blank(request.email);
    let phone_number = non_blank(request.phone_number);
    if email.is_none() && phone_number.is_none() {
        return Err(ApiError::bad_request(
            "Either email or phone_number is required",
        ));
    }

    let (keypair, secret_key) = StellarKeypair::generate()
        .map_err(|e| ApiError::internal(format!("Key generation failed: {e}")))?;

    let user = state
        .users
        .create(UserRecord::new(
            email,
            phone_number,
            keypair.public_key().to_string(),
        ))
        .await?;

    info!(user_id = %user.id, public_key = %user.stellar_public_key, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            secret_key,
            warning: SECRET_WARNING.to_string(),
        }),
    ))
}

/// Issue a session token for a registered email.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .users
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let session_token = issue_session_token(&state.auth_config, &user.id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    info!(user_id = %user.id, "Session issued");

    Ok(Json(LoginResponse {
        session_token,
        user_id: user.id,
        public_key: user.stellar_public_key,
    }))
}
