// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    deposits::{DepositInitiated, DepositStatus},
    state::AppState,
    stellar::{AssetDescriptor, AssetRequest, BalanceLine},
    storage::{
        ContactRecord, OperationRecord, OperationStatus, OperationType, UserRecord,
    },
};

pub mod accounts;
pub mod contacts;
pub mod deposits;
pub mod health;
pub mod operations;
pub mod payments;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/users/register", post(users::register))
        .route("/auth/login", post(users::login))
        .route("/accounts/test-account", post(accounts::create_test_account))
        .route("/accounts/{public_key}/balances", get(accounts::get_balances))
        .route(
            "/contacts",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route("/contacts/lookup", get(contacts::lookup_contact))
        .route("/payments/build", post(payments::build_payment))
        .route("/payments/execute", post(payments::execute_payment))
        .route("/path-payments/build", post(payments::build_path_payment))
        .route("/path-payments/execute", post(payments::execute_path_payment))
        .route("/operations", get(operations::list_operations))
        .route("/operations/{operation_id}", get(operations::get_operation))
        .route("/deposits", post(deposits::create_deposit))
        .route(
            "/deposits/{operation_id}/status",
            get(deposits::deposit_status),
        );

    Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
}

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

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        users::register,
        users::login,
        accounts::create_test_account,
        accounts::get_balances,
        contacts::create_contact,
        contacts::list_contacts,
        contacts::lookup_contact,
        payments::build_payment,
        payments::execute_payment,
        payments::build_path_payment,
        payments::execute_path_payment,
        operations::list_operations,
        operations::get_operation,
        deposits::create_deposit,
        deposits::deposit_status
    ),
    components(
        schemas(
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks,
            users::RegisterRequest,
            users::RegisterResponse,
            users::LoginRequest,
            users::LoginResponse,
            UserRecord,
            accounts::TestAccountResponse,
            accounts::BalancesResponse,
            BalanceLine,
            AssetDescriptor,
            AssetRequest,
            contacts::CreateContactRequest,
            contacts::ContactListResponse,
            ContactRecord,
            payments::BuildPaymentRequest,
            payments::BuildPaymentResponse,
            payments::ExecutePaymentRequest,
            payments::BuildPathPaymentRequest,
            payments::BuildPathPaymentResponse,
            payments::ExecutePathPaymentRequest,
            payments::ExecutionResponse,
            operations::OperationListResponse,
            OperationRecord,
            OperationType,
            OperationStatus,
            deposits::CreateDepositRequest,
            DepositInitiated,
            DepositStatus
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Users", description = "Registration and session tokens"),
        (name = "Accounts", description = "Test accounts and balances"),
        (name = "Contacts", description = "Per-user contact book"),
        (name = "Payments", description = "Payments and path payments"),
        (name = "Operations", description = "Local operation ledger"),
        (name = "Deposits", description = "SEP-24 anchor deposits")
    )
)]
pub struct ApiDoc;
