// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage on an embedded redb database. The database file lives
//! under `DATA_DIR` (see [`crate::config`]) and holds the operation ledger,
//! users and contacts.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   converse.redb     # operations, user_operations, users, user_emails,
//!                     # contacts, contact_names
//! ```
//!
//! Secret seeds are never written here.

pub mod database;
pub mod repository;

pub use database::{Database, StorageError, StorageResult};
pub use repository::{
    ContactRecord, ContactRepository, NewOperation, OperationContext, OperationRecord,
    OperationRepository, OperationStatus, OperationStore, OperationType, OperationUpdate,
    UserRecord, UserRepository,
};
