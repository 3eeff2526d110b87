// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operation ledger: the local audit trail of user-initiated transfers.
//!
//! Every payment, path payment and anchor deposit gets an [`OperationRecord`]
//! created in `PENDING` before the network is touched. The record moves to
//! `COMPLETED` or `FAILED` exactly once and never reverts; [`OperationStore::update`]
//! enforces this inside a single write transaction.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::super::database::{Database, OPERATIONS, USER_OPERATIONS};
use super::super::{StorageError, StorageResult};

// =============================================================================
// Context Keys
// =============================================================================

/// Error text of a failed operation.
pub const CONTEXT_ERROR: &str = "error";
/// Network result codes of a rejected submission (`tx_code: op_code,...`).
pub const CONTEXT_RESULT_CODES: &str = "result_codes";
/// Source asset of a path payment (`native` or `CODE:ISSUER`).
pub const CONTEXT_SOURCE_ASSET: &str = "source_asset";
/// Resolved send-max of a path payment.
pub const CONTEXT_SEND_MAX: &str = "send_max";
/// Anchor home domain of a deposit.
pub const CONTEXT_ANCHOR_DOMAIN: &str = "anchor_domain";
/// Anchor-side transaction identifier. Read back by deposit reconciliation.
pub const CONTEXT_ANCHOR_TX_ID: &str = "anchor_tx_id";
/// When the deposit was initiated (RFC 3339).
pub const CONTEXT_INITIATED_AT: &str = "initiated_at";
/// Last status reported by the anchor.
pub const CONTEXT_ANCHOR_STATUS: &str = "anchor_status";

/// Opaque diagnostic payload attached to an operation.
pub type OperationContext = BTreeMap<String, String>;

// =============================================================================
// Types
// =============================================================================

/// Kind of user-initiated transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Payment,
    PathPayment,
    Deposit,
}

/// Lifecycle status of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    Completed,
    Failed,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        match self {
            OperationStatus::Pending => false,
            OperationStatus::Completed | OperationStatus::Failed => true,
        }
    }
}

/// Stored operation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OperationRecord {
    /// Operation identifier (UUID v4)
    pub id: String,
    /// Owning user
    pub user_id: String,
    pub operation_type: OperationType,
    pub status: OperationStatus,
    /// Normalized decimal amount (destination amount for path payments)
    pub amount: String,
    /// Asset code (`XLM` for the native asset)
    pub asset_code: String,
    /// Destination account
    pub destination: String,
    /// Free-form diagnostic context
    #[schema(value_type = Object)]
    pub context: OperationContext,
    /// Network transaction hash once submission succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stellar_transaction_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`OperationStore::create`]. Id, status and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewOperation {
    pub user_id: String,
    pub operation_type: OperationType,
    pub amount: String,
    pub asset_code: String,
    pub destination: String,
    pub context: OperationContext,
}

impl NewOperation {
    pub fn new(
        user_id: impl Into<String>,
        operation_type: OperationType,
        amount: impl Into<String>,
        asset_code: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            operation_type,
            amount: amount.into(),
            asset_code: asset_code.into(),
            destination: destination.into(),
            context: OperationContext::new(),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    fn into_record(self) -> OperationRecord {
        let now = Utc::now();
        OperationRecord {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id,
            operation_type: self.operation_type,
            status: OperationStatus::Pending,
            amount: self.amount,
            asset_code: self.asset_code,
            destination: self.destination,
            context: self.context,
            stellar_transaction_hash: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Terminal transition applied by [`OperationStore::update`].
///
/// Context entries are merged into the existing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationUpdate {
    pub status: OperationStatus,
    pub stellar_transaction_hash: Option<String>,
    pub context: OperationContext,
}

impl OperationUpdate {
    pub fn completed() -> Self {
        Self {
            status: OperationStatus::Completed,
            stellar_transaction_hash: None,
            context: OperationContext::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        let mut context = OperationContext::new();
        context.insert(CONTEXT_ERROR.to_string(), error.into());
        Self {
            status: OperationStatus::Failed,
            stellar_transaction_hash: None,
            context,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.stellar_transaction_hash = Some(hash.into());
        self
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

// =============================================================================
// Store Port
// =============================================================================

/// Durable bookkeeping for operation records.
#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Insert a new record in `PENDING` status.
    async fn create(&self, operation: NewOperation) -> StorageResult<OperationRecord>;

    /// Apply a terminal transition. Fails with `InvalidTransition` if the
    /// record is already terminal or the update is not terminal.
    async fn update(&self, id: &str, update: OperationUpdate) -> StorageResult<OperationRecord>;

    /// All records of a user, newest first.
    async fn find_by_user(&self, user_id: &str) -> StorageResult<Vec<OperationRecord>>;

    async fn find_by_id(&self, id: &str) -> StorageResult<Option<OperationRecord>>;

    /// Deposit records still awaiting anchor reconciliation, oldest first.
    async fn list_pending_deposits(&self) -> StorageResult<Vec<OperationRecord>>;
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the user_operations table.
///
/// Format: `user_id | inverted_micros_be_bytes | operation_id`
fn make_index_key(user_id: &str, created_at: DateTime<Utc>, operation_id: &str) -> Vec<u8> {
    let micros = created_at.timestamp_micros();
    let mut key = Vec::with_capacity(user_id.len() + 1 + 8 + 1 + operation_id.len());
    key.extend_from_slice(user_id.as_bytes());
    key.push(b'|');
    // Invert timestamp for descending order (newest first)
    key.extend_from_slice(&(!(micros as u64)).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(operation_id.as_bytes());
    key
}

fn make_prefix(user_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(user_id.len() + 1);
    prefix.extend_from_slice(user_id.as_bytes());
    prefix.push(b'|');
    prefix
}

fn make_prefix_end(user_id: &str) -> Vec<u8> {
    let mut end = make_prefix(user_id);
    end.extend_from_slice(&[0xFF; 20]);
    end
}

// =============================================================================
// redb Repository
// =============================================================================

/// [`OperationStore`] backed by the embedded database.
#[derive(Clone)]
pub struct OperationRepository {
    db: Database,
}

impl OperationRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OperationStore for OperationRepository {
    async fn create(&self, operation: NewOperation) -> StorageResult<OperationRecord> {
        let record = operation.into_record();
        self.db
            .run(move |db| {
                let json = serde_json::to_vec(&record)?;
                let index_key = make_index_key(&record.user_id, record.created_at, &record.id);

                let write_txn = db.begin_write()?;
                {
                    let mut ops = write_txn.open_table(OPERATIONS)?;
                    ops.insert(record.id.as_str(), json.as_slice())?;

                    let mut idx = write_txn.open_table(USER_OPERATIONS)?;
                    idx.insert(index_key.as_slice(), record.id.as_str())?;
                }
                write_txn.commit()?;
                Ok(record)
            })
            .await
    }

    async fn update(&self, id: &str, update: OperationUpdate) -> StorageResult<OperationRecord> {
        let id = id.to_string();
        self.db
            .run(move |db| {
                if !update.status.is_terminal() {
                    return Err(StorageError::InvalidTransition(format!(
                        "Operation {id} can only move to a terminal status"
                    )));
                }

                let write_txn = db.begin_write()?;
                let record = {
                    let mut table = write_txn.open_table(OPERATIONS)?;

                    // Read existing value and deserialize before mutating
                    let existing_bytes = {
                        let existing = table
                            .get(id.as_str())?
                            .ok_or_else(|| StorageError::NotFound(format!("Operation {id}")))?;
                        existing.value().to_vec()
                    };

                    let mut record: OperationRecord = serde_json::from_slice(&existing_bytes)?;
                    if record.status.is_terminal() {
                        return Err(StorageError::InvalidTransition(format!(
                            "Operation {id} is already {:?}",
                            record.status
                        )));
                    }

                    record.status = update.status;
                    if update.stellar_transaction_hash.is_some() {
                        record.stellar_transaction_hash = update.stellar_transaction_hash;
                    }
                    record.context.extend(update.context);
                    record.updated_at = Utc::now();

                    let json = serde_json::to_vec(&record)?;
                    table.insert(id.as_str(), json.as_slice())?;
                    record
                };
                write_txn.commit()?;
                Ok(record)
            })
            .await
    }

    async fn find_by_user(&self, user_id: &str) -> StorageResult<Vec<OperationRecord>> {
        let user_id = user_id.to_string();
        self.db
            .run(move |db| {
                let read_txn = db.begin_read()?;
                let idx = read_txn.open_table(USER_OPERATIONS)?;
                let ops = read_txn.open_table(OPERATIONS)?;

                let prefix = make_prefix(&user_id);
                let prefix_end = make_prefix_end(&user_id);

                let mut records = Vec::new();
                for entry in idx.range(prefix.as_slice()..prefix_end.as_slice())? {
                    let (_, op_id) = entry?;
                    if let Some(value) = ops.get(op_id.value())? {
                        records.push(serde_json::from_slice(value.value())?);
                    }
                }
                Ok(records)
            })
            .await
    }

    async fn find_by_id(&self, id: &str) -> StorageResult<Option<OperationRecord>> {
        let id = id.to_string();
        self.db
            .run(move |db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(OPERATIONS)?;
                match table.get(id.as_str())? {
                    Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
                    None => Ok(None),
                }
            })
            .await
    }

    async fn list_pending_deposits(&self) -> StorageResult<Vec<OperationRecord>> {
        self.db
            .run(|db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(OPERATIONS)?;

                let mut pending = Vec::new();
                for entry in table.iter()? {
                    let (_, value) = entry?;
                    let record: OperationRecord = serde_json::from_slice(value.value())?;
                    if record.operation_type == OperationType::Deposit
                        && record.status == OperationStatus::Pending
                    {
                        pending.push(record);
                    }
                }
                pending.sort_by_key(|r| r.created_at);
                Ok(pending)
            })
            .await
    }
}

// =============================================================================
// Tests
// =============================================================================
