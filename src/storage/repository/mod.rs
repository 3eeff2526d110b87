// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the embedded database.
//!
//! Each repository provides CRUD operations for a specific entity type and
//! runs its redb transactions through [`super::Database::run`].

pub mod contacts;
pub mod operations;
pub mod users;

pub use contacts::{ContactRecord, ContactRepository};
pub use operations::{
    NewOperation, OperationContext, OperationRecord, OperationRepository, OperationStatus,
    OperationStore, OperationType, OperationUpdate,
};
pub use users::{UserRecord, UserRepository};
