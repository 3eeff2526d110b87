// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Stellar Payment Orchestration
//!
//! Builds, signs and submits Stellar transactions and keeps the local
//! operation ledger consistent with the network result.
//!
//! ## Components
//!
//! - `asset` / `amount` - asset model and decimal amount handling
//! - `builder` - unsigned envelopes for payments and path payments
//! - `paths` - cheapest strict-receive path selection
//! - `executor` - build → sign → submit → record pipeline
//! - `balance` - account balance reads
//! - `client` - the `LedgerClient` port and its Horizon implementation

pub mod amount;
pub mod asset;
pub mod balance;
pub mod builder;
pub mod client;
pub mod error;
pub mod executor;
pub mod keys;
pub mod paths;
pub mod types;

pub use amount::{format_amount, normalize_amount, parse_amount, AmountError};
pub use asset::{make_asset, Asset, AssetDescriptor, AssetRequest};
pub use balance::{BalanceLine, BalanceReader};
pub use builder::{CheapestPath, Envelope, PathPaymentIntent, PaymentIntent, TransactionBuilder};
pub use client::{HorizonClient, HorizonError, LedgerClient};
pub use error::CoreError;
pub use executor::{ExecutionOutcome, PathPaymentRequest, PaymentRequest, TransactionExecutor};
pub use keys::{is_valid_public_key, KeyError, StellarKeypair};
pub use paths::PathFinder;
pub use types::{NetworkConfig, StellarNetwork, SubmissionFailure};
