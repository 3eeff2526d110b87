// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Horizon HTTP client.
//!
//! `LedgerClient` is the seam between the orchestration core and the network.
//! `HorizonClient` is the production implementation; tests substitute fakes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::asset::Asset;
use super::types::{
    AccountState, HorizonAsset, HorizonBalance, NetworkConfig, PathRecord, SubmissionFailure,
    SubmitResult,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum HorizonError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid response from Horizon: {0}")]
    InvalidResponse(String),

    /// The network evaluated the transaction and refused it.
    #[error("Transaction rejected: {0}")]
    Rejected(SubmissionFailure),

    #[error("Horizon returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Friendbot is not available on this network")]
    FriendbotUnavailable,
}

/// Network operations the orchestration core depends on.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Load sequence number and balances of an account.
    async fn load_account(&self, address: &str) -> Result<AccountState, HorizonError>;

    /// Submit a signed base64 XDR envelope.
    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<SubmitResult, HorizonError>;

    /// Strict-receive path query: every way to deliver exactly
    /// `dest_amount` of `dest` when paying with `source`.
    async fn find_strict_receive_paths(
        &self,
        source: &Asset,
        dest: &Asset,
        dest_amount: &str,
    ) -> Result<Vec<PathRecord>, HorizonError>;

    /// Fund a new account through friendbot (test network only).
    async fn fund_test_account(&self, address: &str) -> Result<(), HorizonError>;
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account_id: String,
    sequence: String,
    #[serde(default)]
    balances: Vec<HorizonBalance>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
    #[serde(default)]
    ledger: u32,
    #[serde(default)]
    result_xdr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PathsResponse {
    #[serde(rename = "_embedded")]
    embedded: PathsEmbedded,
}

#[derive(Debug, Deserialize)]
struct PathsEmbedded {
    #[serde(default)]
    records: Vec<PathResponseRecord>,
}

#[derive(Debug, Deserialize)]
struct PathResponseRecord {
    source_amount: String,
    #[serde(default)]
    path: Vec<HorizonAsset>,
}

#[derive(Debug, Clone)]
pub struct HorizonClient {
    base_url: String,
    friendbot_url: Option<String>,
    http: Client,
}

impl HorizonClient {
    pub fn new(network: &NetworkConfig) -> Result<Self, HorizonError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: network.horizon_url.trim_end_matches('/').to_string(),
            friendbot_url: network.friendbot_url.clone(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl LedgerClient for HorizonClient {
    async fn load_account(&self, address: &str) -> Result<AccountState, HorizonError> {
        let response = self
            .http
            .get(self.url(&format!("/accounts/{address}")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(HorizonError::AccountNotFound(address.to_string()));
        }
        let response = ensure_success(response).await?;

        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| HorizonError::InvalidResponse(format!("account body: {e}")))?;
        let sequence = account.sequence.parse::<i64>().map_err(|_| {
            HorizonError::InvalidResponse(format!("bad sequence `{}`", account.sequence))
        })?;

        Ok(AccountState {
            account_id: account.account_id,
            sequence,
            balances: account.balances,
        })
    }

    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<SubmitResult, HorizonError> {
        let response = self
            .http
            .post(self.url("/transactions"))
            .form(&[("tx", envelope_xdr)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: SubmitResponse = response
                .json()
                .await
                .map_err(|e| HorizonError::InvalidResponse(format!("submit body: {e}")))?;
            debug!(hash = %body.hash, ledger = body.ledger, "Transaction accepted");
            return Ok(SubmitResult {
                hash: body.hash,
                ledger: body.ledger,
                result_xdr: body.result_xdr,
            });
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            if let Some(failure) = parse_problem(&body) {
                return Err(HorizonError::Rejected(failure));
            }
        }
        Err(HorizonError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn find_strict_receive_paths(
        &self,
        source: &Asset,
        dest: &Asset,
        dest_amount: &str,
    ) -> Result<Vec<PathRecord>, HorizonError> {
        let mut query: Vec<(&str, String)> = vec![
            ("source_assets", source.to_string()),
            ("destination_asset_type", dest.horizon_type().to_string()),
            ("destination_amount", dest_amount.to_string()),
        ];
        if let Asset::Issued { code, issuer } = dest {
            query.push(("destination_asset_code", code.clone()));
            query.push(("destination_asset_issuer", issuer.clone()));
        }

        let response = self
            .http
            .get(self.url("/paths/strict-receive"))
            .query(&query)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body: PathsResponse = response
            .json()
            .await
            .map_err(|e| HorizonError::InvalidResponse(format!("paths body: {e}")))?;

        Ok(body
            .embedded
            .records
            .into_iter()
            .map(|r| PathRecord {
                source_amount: r.source_amount,
                path: r.path,
            })
            .collect())
    }

    async fn fund_test_account(&self, address: &str) -> Result<(), HorizonError> {
        let friendbot = self
            .friendbot_url
            .as_deref()
            .ok_or(HorizonError::FriendbotUnavailable)?;

        let response = self
            .http
            .get(friendbot)
            .query(&[("addr", address)])
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HorizonError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(HorizonError::Status { status, body })
}

/// Extract title, detail and result codes from a Horizon problem document.
fn parse_problem(body: &str) -> Option<SubmissionFailure> {
    let problem: Value = serde_json::from_str(body).ok()?;
    let title = problem.get("title")?.as_str()?.to_string();
    let detail = problem
        .get("detail")
        .and_then(Value::as_str)
        .map(str::to_string);

    let codes = problem.pointer("/extras/result_codes");
    let transaction_code = codes
        .and_then(|c| c.get("transaction"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let operation_codes = codes
        .and_then(|c| c.get("operations"))
        .and_then(Value::as_array)
        .map(|ops| {
            ops.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(SubmissionFailure {
        title,
        detail,
        transaction_code,
        operation_codes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stellar::asset::make_asset;
    use mockito::Matcher;

    const ACCOUNT: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";
    const ISSUER: &str = "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H";

    fn client_for(server: &mockito::Server) -> HorizonClient {
        let network = NetworkConfig {
            horizon_url: server.url(),
            friendbot_url: Some(format!("{}/friendbot", server.url())),
            ..NetworkConfig::testnet()
        };
        HorizonClient::new(&network).unwrap()
    }

    #[tokio::test]
    async fn load_account_parses_sequence_and_balances() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", format!("/accounts/{ACCOUNT}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{
                    "id": "{ACCOUNT}",
                    "account_id": "{ACCOUNT}",
                    "sequence": "4294967296",
                    "balances": [
                        {{"balance": "100.0000000", "asset_type": "native"}}
                    ]
                }}"#
            ))
            .create_async()
            .await;

        let account = client_for(&server).load_account(ACCOUNT).await.unwrap();
        assert_eq!(account.account_id, ACCOUNT);
        assert_eq!(account.sequence, 4_294_967_296);
        assert_eq!(account.balances.len(), 1);
        assert_eq!(account.balances[0].balance, "100.0000000");
    }

    #[tokio::test]
    async fn load_account_maps_404_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", format!("/accounts/{ACCOUNT}").as_str())
            .with_status(404)
            .create_async()
            .await;

        let err = client_for(&server).load_account(ACCOUNT).await.unwrap_err();
        assert!(matches!(err, HorizonError::AccountNotFound(a) if a == ACCOUNT));
    }

    #[tokio::test]
    async fn submit_transaction_returns_hash() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/transactions")
            .match_body(Matcher::UrlEncoded("tx".into(), "AAAA".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"hash": "abc123", "ledger": 42}"#)
            .create_async()
            .await;

        let result = client_for(&server).submit_transaction("AAAA").await.unwrap();
        assert_eq!(result.hash, "abc123");
        assert_eq!(result.ledger, 42);
    }

    #[tokio::test]
    async fn submit_transaction_surfaces_result_codes() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/transactions")
            .with_status(400)
            .with_header("content-type", "application/problem+json")
            .with_body(
                r#"{
                    "title": "Transaction Failed",
                    "detail": "The transaction failed when submitted to the stellar network.",
                    "extras": {
                        "result_codes": {
                            "transaction": "tx_failed",
                            "operations": ["op_underfunded"]
                        }
                    }
                }"#,
            )
            .create_async()
            .await;

        let err = client_for(&server)
            .submit_transaction("AAAA")
            .await
            .unwrap_err();
        match err {
            HorizonError::Rejected(failure) => {
                assert_eq!(failure.transaction_code.as_deref(), Some("tx_failed"));
                assert_eq!(failure.operation_codes, vec!["op_underfunded"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn submit_transaction_server_error_is_not_a_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/transactions")
            .with_status(504)
            .with_body("gateway timeout")
            .create_async()
            .await;

        let err = client_for(&server)
            .submit_transaction("AAAA")
            .await
            .unwrap_err();
        assert!(matches!(err, HorizonError::Status { status: 504, .. }));
    }

    #[tokio::test]
    async fn strict_receive_paths_sends_asset_query() {
        let mut server = mockito::Server::new_async().await;
        let dest = make_asset(Some("USDC"), Some(ISSUER)).unwrap();
        let _mock = server
            .mock("GET", "/paths/strict-receive")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("source_assets".into(), "native".into()),
                Matcher::UrlEncoded("destination_asset_type".into(), "credit_alphanum4".into()),
                Matcher::UrlEncoded("destination_asset_code".into(), "USDC".into()),
                Matcher::UrlEncoded("destination_asset_issuer".into(), ISSUER.into()),
                Matcher::UrlEncoded("destination_amount".into(), "5".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"_embedded": {"records": [
                    {"source_amount": "12.5000000", "path": []},
                    {"source_amount": "9.9000000", "path": [{"asset_type": "native"}]}
                ]}}"#,
            )
            .create_async()
            .await;

        let records = client_for(&server)
            .find_strict_receive_paths(&Asset::Native, &dest, "5")
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].source_amount, "9.9000000");
        assert_eq!(records[1].path[0].asset_type, "native");
    }

    #[tokio::test]
    async fn friendbot_unavailable_without_url() {
        let network = NetworkConfig::public();
        let client = HorizonClient::new(&network).unwrap();
        let err = client.fund_test_account(ACCOUNT).await.unwrap_err();
        assert!(matches!(err, HorizonError::FriendbotUnavailable));
    }

    #[tokio::test]
    async fn friendbot_funds_account() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/friendbot")
            .match_query(Matcher::UrlEncoded("addr".into(), ACCOUNT.into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        client_for(&server).fund_test_account(ACCOUNT).await.unwrap();
        mock.assert_async().await;
    }
}
