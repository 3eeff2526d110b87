// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy of the payment orchestration core.

use super::amount::AmountError;
use super::keys::KeyError;
use crate::providers::anchor::AnchorError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed address, amount, memo or request. Raised before any network
    /// or store contact.
    #[error("{0}")]
    Validation(String),

    /// Asset code given without a valid issuer, or a malformed code.
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    /// Source account unknown to the network when building a transaction.
    #[error("Source account {0} could not be loaded (is it funded?)")]
    AccountLoad(String),

    /// Queried account unknown to the network.
    #[error("Account {0} not found on the network")]
    AccountNotFound(String),

    #[error("no conversion path between assets")]
    NoPath,

    /// Transport failure talking to the ledger network.
    #[error("Stellar network error: {0}")]
    Network(String),

    #[error("Anchor error: {0}")]
    Anchor(#[from] AnchorError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<AmountError> for CoreError {
    fn from(e: AmountError) -> Self {
        CoreError::Validation(e.to_string())
    }
}

impl From<KeyError> for CoreError {
    fn from(e: KeyError) -> Self {
        CoreError::Validation(e.to_string())
    }
}
