// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SEP-24 anchor integration for interactive deposits.
//!
//! The transfer server is discovered from the anchor's `stellar.toml`
//! (`TRANSFER_SERVER_SEP0024`) and cached after the first successful lookup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::info;
use url::Url;

pub const DEFAULT_ANCHOR_DOMAIN: &str = "testanchor.stellar.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveDeposit {
    /// URL the user opens to complete the deposit with the anchor
    pub url: String,
    /// Anchor-side transaction id
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AnchorError {
    #[error("Anchor stellar.toml has no TRANSFER_SERVER_SEP0024")]
    MissingTransferServer,

    #[error("Anchor request failed: {0}")]
    Request(String),

    #[error("Anchor response was invalid: {0}")]
    InvalidResponse(String),
}

/// Deposit operations offered by an anchor.
#[async_trait]
pub trait AnchorClient: Send + Sync {
    /// Home domain of the anchor, recorded in deposit context.
    fn domain(&self) -> &str;

    async fn initiate_deposit(
        &self,
        asset_code: &str,
        account: &str,
        amount: &str,
    ) -> Result<InteractiveDeposit, AnchorError>;

    /// Raw anchor status of a deposit (`completed`, `pending_user_transfer_start`, ...).
    async fn transaction_status(&self, anchor_tx_id: &str) -> Result<String, AnchorError>;
}

#[derive(Debug, Deserialize)]
struct StellarToml {
    #[serde(rename = "TRANSFER_SERVER_SEP0024")]
    transfer_server_sep0024: Option<String>,
}

#[derive(Debug)]
pub struct Sep24AnchorClient {
    domain: String,
    toml_url: String,
    transfer_server: OnceCell<String>,
    http: Client,
}

impl Sep24AnchorClient {
    pub fn new(domain: &str) -> Result<Self, AnchorError> {
        let toml_url = format!("https://{domain}/.well-known/stellar.toml");
        Self::from_toml_url(domain, &toml_url)
    }

    /// Client reading `stellar.toml` from an explicit URL.
    pub fn from_toml_url(domain: &str, toml_url: &str) -> Result<Self, AnchorError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AnchorError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            domain: domain.to_string(),
            toml_url: toml_url.to_string(),
            transfer_server: OnceCell::new(),
            http,
        })
    }

    async fn transfer_server(&self) -> Result<&str, AnchorError> {
        let server = self
            .transfer_server
            .get_or_try_init(|| async {
                let response = self
                    .http
                    .get(&self.toml_url)
                    .send()
                    .await
                    .map_err(|e| AnchorError::Request(format!("GET stellar.toml failed: {e}")))?;
                if !response.status().is_success() {
                    let status = response.status();
                    return Err(AnchorError::Request(format!(
                        "GET stellar.toml returned {status}"
                    )));
                }
                let body = response
                    .text()
                    .await
                    .map_err(|e| AnchorError::Request(format!("read stellar.toml failed: {e}")))?;

                let parsed: StellarToml = toml::from_str(&body)
                    .map_err(|e| AnchorError::InvalidResponse(format!("stellar.toml: {e}")))?;
                let raw = parsed
                    .transfer_server_sep0024
                    .ok_or(AnchorError::MissingTransferServer)?;
                let server = Url::parse(raw.trim()).map_err(|e| {
                    AnchorError::InvalidResponse(format!("TRANSFER_SERVER_SEP0024 {raw:?}: {e}"))
                })?;

                info!(domain = %self.domain, transfer_server = %server, "Discovered SEP-24 transfer server");
                Ok(server.as_str().trim_end_matches('/').to_string())
            })
            .await?;
        Ok(server.as_str())
    }
}

#[async_trait]
impl AnchorClient for Sep24AnchorClient {
    fn domain(&self) -> &str {
        &self.domain
    }

    async fn initiate_deposit(
        &self,
        asset_code: &str,
        account: &str,
        amount: &str,
    ) -> Result<InteractiveDeposit, AnchorError> {
        let server = self.transfer_server().await?;
        let path = "/transactions/deposit/interactive";

        let response = self
            .http
            .post(format!("{server}{path}"))
            .form(&[
                ("asset_code", asset_code),
                ("account", account),
                ("amount", amount),
            ])
            .send()
            .await
            .map_err(|e| AnchorError::Request(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnchorError::Request(format!(
                "POST {path} returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AnchorError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))?;

        let url = body.get("url").and_then(Value::as_str);
        let id = body.get("id").and_then(Value::as_str);
        match (url, id) {
            (Some(url), Some(id)) if !url.is_empty() && !id.is_empty() => {
                Ok(InteractiveDeposit {
                    url: url.to_string(),
                    id: id.to_string(),
                })
            }
            _ => Err(AnchorError::InvalidResponse(
                "deposit response is missing url or id".to_string(),
            )),
        }
    }

    async fn transaction_status(&self, anchor_tx_id: &str) -> Result<String, AnchorError> {
        let server = self.transfer_server().await?;
        let path = "/transaction";

        let response = self
            .http
            .get(format!("{server}{path}"))
            .query(&[("id", anchor_tx_id)])
            .send()
            .await
            .map_err(|e| AnchorError::Request(format!("GET {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnchorError::Request(format!(
                "GET {path} returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AnchorError::InvalidResponse(format!("GET {path} invalid JSON: {e}")))?;

        body.pointer("/transaction/status")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AnchorError::InvalidResponse("missing transaction status".to_string()))
    }
}

pub fn map_anchor_status(raw_status: &str) -> AnchorStatus {
    let status = raw_status.trim().to_ascii_lowercase();
    match status.as_str() {
        "completed" => AnchorStatus::Completed,
        "error" | "failed" => AnchorStatus::Failed,
        _ => AnchorStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const ACCOUNT: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";

    async fn anchor_with_toml(server: &mut mockito::Server) -> (Sep24AnchorClient, mockito::Mock) {
        let toml_mock = server
            .mock("GET", "/.well-known/stellar.toml")
            .with_status(200)
            .with_body(format!(
                "NETWORK_PASSPHRASE=\"Test SDF Network ; September 2015\"\nTRANSFER_SERVER_SEP0024=\"{}/sep24\"\n",
                server.url()
            ))
            .expect(1)
            .create_async()
            .await;
        let client = Sep24AnchorClient::from_toml_url(
            "testanchor.stellar.org",
            &format!("{}/.well-known/stellar.toml", server.url()),
        )
        .unwrap();
        (client, toml_mock)
    }

    #[test]
    fn anchor_status_mapping_is_stable() {
        assert_eq!(map_anchor_status("completed"), AnchorStatus::Completed);
        assert_eq!(map_anchor_status("ERROR"), AnchorStatus::Failed);
        assert_eq!(map_anchor_status("failed"), AnchorStatus::Failed);
        assert_eq!(
            map_anchor_status("pending_user_transfer_start"),
            AnchorStatus::Pending
        );
        assert_eq!(map_anchor_status("incomplete"), AnchorStatus::Pending);
    }

    #[tokio::test]
    async fn initiate_deposit_posts_form_and_caches_transfer_server() {
        let mut server = mockito::Server::new_async().await;
        let (client, toml_mock) = anchor_with_toml(&mut server).await;

        let deposit_mock = server
            .mock("POST", "/sep24/transactions/deposit/interactive")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("asset_code".into(), "SRT".into()),
                Matcher::UrlEncoded("account".into(), ACCOUNT.into()),
                Matcher::UrlEncoded("amount".into(), "25".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"type": "interactive_customer_info_needed", "url": "https://anchor/deposit/1", "id": "tx-1"}"#)
            .expect(2)
            .create_async()
            .await;

        for _ in 0..2 {
            let deposit = client.initiate_deposit("SRT", ACCOUNT, "25").await.unwrap();
            assert_eq!(deposit.url, "https://anchor/deposit/1");
            assert_eq!(deposit.id, "tx-1");
        }

        deposit_mock.assert_async().await;
        toml_mock.assert_async().await;
    }

    #[tokio::test]
    async fn transaction_status_reads_nested_status() {
        let mut server = mockito::Server::new_async().await;
        let (client, _toml) = anchor_with_toml(&mut server).await;

        let _status = server
            .mock("GET", "/sep24/transaction")
            .match_query(Matcher::UrlEncoded("id".into(), "tx-1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"transaction": {"id": "tx-1", "status": "completed"}}"#)
            .create_async()
            .await;

        assert_eq!(client.transaction_status("tx-1").await.unwrap(), "completed");
    }

    #[tokio::test]
    async fn missing_transfer_server_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _toml = server
            .mock("GET", "/.well-known/stellar.toml")
            .with_status(200)
            .with_body("NETWORK_PASSPHRASE=\"Test SDF Network ; September 2015\"\n")
            .create_async()
            .await;
        let client = Sep24AnchorClient::from_toml_url(
            "testanchor.stellar.org",
            &format!("{}/.well-known/stellar.toml", server.url()),
        )
        .unwrap();

        let err = client.initiate_deposit("SRT", ACCOUNT, "1").await.unwrap_err();
        assert!(matches!(err, AnchorError::MissingTransferServer));
    }

    #[tokio::test]
    async fn deposit_response_without_id_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        let (client, _toml) = anchor_with_toml(&mut server).await;
        let _deposit = server
            .mock("POST", "/sep24/transactions/deposit/interactive")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"url": "https://anchor/deposit/1"}"#)
            .create_async()
            .await;

        let err = client.initiate_deposit("SRT", ACCOUNT, "1").await.unwrap_err();
        assert!(matches!(err, AnchorError::InvalidResponse(_)));
    }
}
