// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Converse Server - Stellar Payment Orchestration Service
//!
//! Builds, signs and submits Stellar payments and path payments for
//! authenticated users and keeps a local operation ledger consistent with
//! the network result. Deposits are brokered through a SEP-24 anchor.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Session tokens (HS256 JWT)
//! - `stellar` - Transaction building, path finding, execution, balances
//! - `deposits` / `deposit_poller` - Anchor deposits and their reconciliation
//! - `providers` - External partners (SEP-24 anchor)
//! - `storage` - Embedded redb database and repositories

pub mod api;
pub mod auth;
pub mod config;
pub mod deposit_poller;
pub mod deposits;
pub mod error;
pub mod providers;
pub mod state;
pub mod stellar;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
