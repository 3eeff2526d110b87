// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account balance reads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::asset::{Asset, AssetDescriptor};
use super::client::{HorizonError, LedgerClient};
use super::error::CoreError;
use super::keys::decode_public_key;
use super::types::{HorizonAsset, HorizonBalance};

/// One balance line of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BalanceLine {
    /// Decimal amount as reported by the network
    pub amount: String,
    pub asset: AssetDescriptor,
}

#[derive(Clone)]
pub struct BalanceReader {
    ledger: Arc<dyn LedgerClient>,
}

impl BalanceReader {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    /// Current balances of `address`. Read-only; repeated calls without an
    /// intervening transaction return the same lines in the same order.
    pub async fn get_balances(&self, address: &str) -> Result<Vec<BalanceLine>, CoreError> {
        decode_public_key(address)?;

        let account = self
            .ledger
            .load_account(address)
            .await
            .map_err(|e| match e {
                HorizonError::AccountNotFound(a) => CoreError::AccountNotFound(a),
                other => CoreError::Network(other.to_string()),
            })?;

        Ok(account.balances.iter().map(balance_line).collect())
    }
}

fn balance_line(balance: &HorizonBalance) -> BalanceLine {
    let horizon = HorizonAsset {
        asset_type: balance.asset_type.clone(),
        asset_code: balance.asset_code.clone(),
        asset_issuer: balance.asset_issuer.clone(),
    };
    let asset = match Asset::from_horizon(&horizon) {
        Ok(asset) => asset.descriptor(),
        // Pool shares and unknown types are passed through as reported
        Err(_) => AssetDescriptor {
            asset_type: balance.asset_type.clone(),
            code: balance
                .asset_code
                .clone()
                .or_else(|| balance.liquidity_pool_id.clone()),
            issuer: balance.asset_issuer.clone(),
        },
    };
    BalanceLine {
        amount: balance.balance.clone(),
        asset,
    }
}
