// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `operations`: operation id → serialized OperationRecord
//! - `user_operations`: composite key (user_id|!created_at_micros|id) → operation id
//! - `users`: user id → serialized UserRecord
//! - `user_emails`: lowercase email → user id
//! - `contacts`: contact id → serialized ContactRecord
//! - `contact_names`: `owner_id|contact_name` → contact id
//!
//! redb is synchronous. Every repository call goes through [`Database::run`],
//! which moves the work onto the blocking thread pool so request handlers
//! never block the async executor.

use std::path::Path;
use std::sync::Arc;

use redb::{ReadableDatabase, TableDefinition};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: operation id → serialized OperationRecord (JSON bytes).
pub(super) const OPERATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("operations");

/// Index: composite key → operation id.
/// Key format: `user_id|!created_at_micros_be|operation_id` for descending-time range scans.
pub(super) const USER_OPERATIONS: TableDefinition<&[u8], &str> =
    TableDefinition::new("user_operations");

/// Primary table: user id → serialized UserRecord.
pub(super) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique index: lowercase email → user id.
pub(super) const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Primary table: contact id → serialized ContactRecord.
pub(super) const CONTACTS: TableDefinition<&str, &[u8]> = TableDefinition::new("contacts");

/// Unique index: `owner_id|contact_name` → contact id.
pub(super) const CONTACT_NAMES: TableDefinition<&str, &str> = TableDefinition::new("contact_names");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("storage task failed: {0}")]
    Task(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the embedded database. Cloning is cheap.
#[derive(Clone)]
pub struct Database {
    db: Arc<redb::Database>,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(OPERATIONS)?;
            let _ = write_txn.open_table(USER_OPERATIONS)?;
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
            let _ = write_txn.open_table(CONTACTS)?;
            let _ = write_txn.open_table(CONTACT_NAMES)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Run a closure against the database on the blocking thread pool.
    pub async fn run<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&redb::Database) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(db.as_ref()))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }

    /// Cheap readiness probe: opens a read transaction and the primary table.
    pub async fn ping(&self) -> StorageResult<()> {
        self.run(|db| {
            let read_txn = db.begin_read()?;
            let _ = read_txn.open_table(OPERATIONS)?;
            Ok(())
        })
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================
