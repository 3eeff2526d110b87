// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contact book endpoints. Contacts are scoped to the authenticated user.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::Auth,
    error::ApiError,
    state::AppState,
    stellar::is_valid_public_key,
    storage::ContactRecord,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateContactRequest {
    pub contact_name: String,
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactListResponse {
    pub contacts: Vec<ContactRecord>,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ContactLookupQuery {
    /// Exact contact name
    pub name: String,
}

#[utoipa::path(
    post,
    path = "/v1/contacts",
    tag = "Contacts",
    security(("bearer_auth" = [])),
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Contact created", body = ContactRecord),
        (status = 400, description = "Blank name or malformed key"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Contact name already used")
    )
)]
pub async fn create_contact(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ContactRecord>), ApiError> {
    let name = request.contact_name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("contact_name must not be empty"));
    }
    let public_key = request.public_key.trim();
    if !is_valid_public_key(public_key) {
        return Err(ApiError::bad_request(format!(
            "Invalid Stellar public key: {public_key}"
        )));
    }

    let contact = state
        .contacts
        .create(ContactRecord::new(
            user.user_id,
            name.to_string(),
            public_key.to_string(),
        ))
        .await?;

    Ok((StatusCode::CREATED, Json(contact)))
}

/// Contacts of the caller, ordered by name.
#[utoipa::path(
    get,
    path = "/v1/contacts",
    tag = "Contacts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Contacts", body = ContactListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_contacts(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ContactListResponse>, ApiError> {
    let contacts = state.contacts.list_by_owner(&user.user_id).await?;
    let total = contacts.len();
    Ok(Json(ContactListResponse { contacts, total }))
}

#[utoipa::path(
    get,
    path = "/v1/contacts/lookup",
    tag = "Contacts",
    security(("bearer_auth" = [])),
    params(ContactLookupQuery),
    responses(
        (status = 200, description = "Contact", body = ContactRecord),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No contact with this name")
    )
)]
pub async fn lookup_contact(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(query): Query<ContactLookupQuery>,
) -> Result<Json<ContactRecord>, ApiError> {
    state
        .contacts
        .find_by_name(&user.user_id, query.name.trim())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Contact {} not found", query.name.trim())))
}
