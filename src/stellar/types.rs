// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stellar types and constants.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

/// Passphrase of the Stellar test network.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Passphrase of the Stellar public network.
pub const PUBLIC_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

pub const HORIZON_TESTNET_URL: &str = "https://horizon-testnet.stellar.org";
pub const HORIZON_PUBLIC_URL: &str = "https://horizon.stellar.org";
pub const FRIENDBOT_URL: &str = "https://friendbot.stellar.org";

/// Symbol used for the native asset in requests and responses.
pub const NATIVE_ASSET_CODE: &str = "XLM";

/// Validity window of every built transaction, in seconds.
pub const TX_TIMEOUT_SECS: u64 = 300;

/// Flat per-operation fee in stroops, high enough to clear surge pricing on testnet.
pub const DEFAULT_BASE_FEE: u32 = 10_000;

/// Maximum size of a text memo in bytes.
pub const MAX_MEMO_BYTES: usize = 28;

/// Stellar network selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StellarNetwork {
    Testnet,
    Public,
}

impl StellarNetwork {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "testnet" | "test" => Some(Self::Testnet),
            "public" | "mainnet" | "pubnet" => Some(Self::Public),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Testnet => "testnet",
            Self::Public => "public",
        }
    }
}

/// Network configuration injected into every ledger-facing component.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub network: StellarNetwork,
    pub passphrase: String,
    pub horizon_url: String,
    /// Friendbot endpoint (testnet only)
    pub friendbot_url: Option<String>,
    /// Flat fee per operation in stroops
    pub base_fee: u32,
}

impl NetworkConfig {
    pub fn testnet() -> Self {
        Self {
            network: StellarNetwork::Testnet,
            passphrase: TESTNET_PASSPHRASE.to_string(),
            horizon_url: HORIZON_TESTNET_URL.to_string(),
            friendbot_url: Some(FRIENDBOT_URL.to_string()),
            base_fee: DEFAULT_BASE_FEE,
        }
    }

    pub fn public() -> Self {
        Self {
            network: StellarNetwork::Public,
            passphrase: PUBLIC_PASSPHRASE.to_string(),
            horizon_url: HORIZON_PUBLIC_URL.to_string(),
            friendbot_url: None,
            base_fee: DEFAULT_BASE_FEE,
        }
    }

    pub fn for_network(network: StellarNetwork) -> Self {
        match network {
            StellarNetwork::Testnet => Self::testnet(),
            StellarNetwork::Public => Self::public(),
        }
    }

    /// Network id: SHA-256 of the passphrase.
    pub fn network_id(&self) -> [u8; 32] {
        Sha256::digest(self.passphrase.as_bytes()).into()
    }
}

/// Asset as reported by Horizon (`asset_type` plus optional code/issuer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonAsset {
    pub asset_type: String,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
}

/// One balance line of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonBalance {
    pub balance: String,
    pub asset_type: String,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
    #[serde(default)]
    pub liquidity_pool_id: Option<String>,
}

/// Account state loaded immediately before building a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub account_id: String,
    /// Current sequence number; the next transaction uses `sequence + 1`.
    pub sequence: i64,
    pub balances: Vec<HorizonBalance>,
}

/// One strict-receive path record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRecord {
    /// Source amount exactly as the network formatted it
    pub source_amount: String,
    /// Intermediate assets, in order
    pub path: Vec<HorizonAsset>,
}

/// Successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub hash: String,
    pub ledger: u32,
    pub result_xdr: Option<String>,
}

/// Structured rejection of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct SubmissionFailure {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Transaction-level result code (e.g. `tx_failed`, `tx_bad_seq`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_code: Option<String>,
    /// Per-operation result codes (e.g. `op_underfunded`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operation_codes: Vec<String>,
}

impl SubmissionFailure {
    /// Failure that never produced a network verdict (timeout, connection reset).
    pub fn transport(detail: impl Into<String>) -> Self {
        Self {
            title: "Transaction submission failed".to_string(),
            detail: Some(detail.into()),
            ..Self::default()
        }
    }

    /// Result codes joined as `tx_code: op_code, op_code`.
    pub fn result_codes(&self) -> Option<String> {
        let tx = self.transaction_code.as_deref()?;
        if self.operation_codes.is_empty() {
            Some(tx.to_string())
        } else {
            Some(format!("{tx}: {}", self.operation_codes.join(", ")))
        }
    }

    /// Single-line user-facing reason.
    pub fn reason(&self) -> String {
        match (self.result_codes(), self.detail.as_deref()) {
            (Some(codes), _) => format!("{} ({codes})", self.title),
            (None, Some(detail)) => format!("{}: {detail}", self.title),
            (None, None) => self.title.clone(),
        }
    }
}

impl std::fmt::Display for SubmissionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testnet_network_id_matches_known_value() {
        let id = NetworkConfig::testnet().network_id();
        let hex: String = id.iter().map(|b| format!("{b:02x}")).collect();
        assert_eq!(
            hex,
            "cee0302d59844d32bdca915c8203dd44b33fbb7edc19051ea37abedf28ecd472"
        );
    }

    #[test]
    fn network_parse_accepts_aliases() {
        assert_eq!(StellarNetwork::parse("TESTNET"), Some(StellarNetwork::Testnet));
        assert_eq!(StellarNetwork::parse("mainnet"), Some(StellarNetwork::Public));
        assert_eq!(StellarNetwork::parse("futurenet"), None);
    }

    #[test]
    fn failure_reason_prefers_result_codes() {
        let failure = SubmissionFailure {
            title: "Transaction Failed".to_string(),
            detail: Some("see extras".to_string()),
            transaction_code: Some("tx_failed".to_string()),
            operation_codes: vec!["op_underfunded".to_string()],
        };
        assert_eq!(failure.result_codes().as_deref(), Some("tx_failed: op_underfunded"));
        assert_eq!(failure.reason(), "Transaction Failed (tx_failed: op_underfunded)");

        let transport = SubmissionFailure::transport("timed out");
        assert_eq!(transport.reason(), "Transaction submission failed: timed out");
    }
}
