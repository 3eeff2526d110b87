// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Anchor Deposits
//!
//! Interactive SEP-24 deposits tracked as `DEPOSIT` operation records.
//!
//! A deposit record is created PENDING once the anchor has accepted the
//! deposit, with the anchor transaction id stored under the
//! `anchor_tx_id` context key. Reconciliation reads that key, asks the anchor
//! for its status and persists only terminal transitions:
//!
//! | Anchor status | Record status |
//! |---------------|---------------|
//! | `completed` | COMPLETED |
//! | `error`, `failed` | FAILED |
//! | anything else | stays PENDING |

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::providers::anchor::{map_anchor_status, AnchorClient, AnchorStatus};
use crate::stellar::{amount::normalize_amount, keys::decode_public_key, CoreError};
use crate::storage::repository::operations::{
    CONTEXT_ANCHOR_DOMAIN, CONTEXT_ANCHOR_STATUS, CONTEXT_ANCHOR_TX_ID, CONTEXT_INITIATED_AT,
};
use crate::storage::{
    NewOperation, OperationRecord, OperationStatus, OperationStore, OperationType,
    OperationUpdate, StorageError,
};

/// A deposit accepted by the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DepositInitiated {
    pub operation_id: String,
    /// Interactive URL the user opens to complete the deposit
    pub deposit_url: String,
    pub anchor_tx_id: String,
}

/// Reconciled state of a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DepositStatus {
    pub operation_id: String,
    pub status: OperationStatus,
    /// Raw status last reported by the anchor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_status: Option<String>,
    pub message: String,
}

impl DepositStatus {
    fn from_record(record: &OperationRecord, anchor_status: Option<String>) -> Self {
        let message = match (record.status, anchor_status.as_deref()) {
            (OperationStatus::Completed, _) => "Deposit completed".to_string(),
            (OperationStatus::Failed, _) => "Deposit failed".to_string(),
            (OperationStatus::Pending, Some(raw)) => {
                format!("Anchor status is '{raw}'. Waiting for completion.")
            }
            (OperationStatus::Pending, None) => "Waiting for completion.".to_string(),
        };
        Self {
            operation_id: record.id.clone(),
            status: record.status,
            anchor_status,
            message,
        }
    }
}

#[derive(Clone)]
pub struct DepositService {
    anchor: Arc<dyn AnchorClient>,
    store: Arc<dyn OperationStore>,
}

impl DepositService {
    pub fn new(anchor: Arc<dyn AnchorClient>, store: Arc<dyn OperationStore>) -> Self {
        Self { anchor, store }
    }

    /// Start an interactive deposit of `amount` `asset_code` into `public_key`.
    pub async fn initiate(
        &self,
        user_id: &str,
        public_key: &str,
        asset_code: &str,
        amount: &str,
    ) -> Result<DepositInitiated, CoreError> {
        decode_public_key(public_key)?;
        let amount = normalize_amount(amount)?;
        let asset_code = asset_code.trim();
        if asset_code.is_empty()
            || asset_code.len() > 12
            || !asset_code.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(CoreError::InvalidAsset(format!(
                "asset code `{asset_code}` must be 1-12 alphanumeric characters"
            )));
        }

        let deposit = self
            .anchor
            .initiate_deposit(asset_code, public_key, &amount)
            .await?;

        let record = self
            .store
            .create(
                NewOperation::new(
                    user_id,
                    OperationType::Deposit,
                    amount,
                    asset_code,
                    public_key,
                )
                .with_context(CONTEXT_ANCHOR_DOMAIN, self.anchor.domain())
                .with_context(CONTEXT_ANCHOR_TX_ID, deposit.id.as_str())
                .with_context(CONTEXT_INITIATED_AT, Utc::now().to_rfc3339()),
            )
            .await
            .inspect_err(|e| {
                warn!(
                    anchor_tx_id = %deposit.id,
                    error = %e,
                    "Anchor accepted deposit but the operation record could not be stored"
                );
            })?;

        info!(
            operation_id = %record.id,
            user_id = %user_id,
            anchor_tx_id = %deposit.id,
            "Deposit initiated"
        );

        Ok(DepositInitiated {
            operation_id: record.id,
            deposit_url: deposit.url,
            anchor_tx_id: deposit.id,
        })
    }

    /// Status of one of `user_id`'s deposits, reconciled with the anchor
    /// unless the record is already terminal.
    pub async fn check_status(
        &self,
        user_id: &str,
        operation_id: &str,
    ) -> Result<DepositStatus, CoreError> {
        let record = self
            .store
            .find_by_id(operation_id)
            .await?
            .filter(|r| r.user_id == user_id)
            .ok_or_else(|| CoreError::NotFound("Operation".to_string()))?;

        if record.operation_type != OperationType::Deposit {
            return Err(CoreError::Validation(
                "Operation is not a deposit".to_string(),
            ));
        }

        if record.status.is_terminal() {
            let anchor_status = record.context.get(CONTEXT_ANCHOR_STATUS).cloned();
            return Ok(DepositStatus::from_record(&record, anchor_status));
        }

        self.reconcile(record).await
    }

    /// Query the anchor for a PENDING deposit and persist a terminal result.
    pub async fn reconcile(&self, record: OperationRecord) -> Result<DepositStatus, CoreError> {
        let anchor_tx_id = record
            .context
            .get(CONTEXT_ANCHOR_TX_ID)
            .cloned()
            .ok_or_else(|| {
                CoreError::Validation("Deposit has no anchor transaction id".to_string())
            })?;

        let raw_status = self.anchor.transaction_status(&anchor_tx_id).await?;

        let update = match map_anchor_status(&raw_status) {
            AnchorStatus::Pending => {
                return Ok(DepositStatus::from_record(&record, Some(raw_status)));
            }
            AnchorStatus::Completed => OperationUpdate::completed(),
            AnchorStatus::Failed => {
                OperationUpdate::failed(format!("Anchor reported status '{raw_status}'"))
            }
        }
        .with_context(CONTEXT_ANCHOR_STATUS, raw_status.as_str());

        match self.store.update(&record.id, update).await {
            Ok(updated) => {
                info!(
                    operation_id = %updated.id,
                    anchor_tx_id = %anchor_tx_id,
                    status = ?updated.status,
                    "Deposit reconciled"
                );
                Ok(DepositStatus::from_record(&updated, Some(raw_status)))
            }
            // Another reconciler got there first
            Err(StorageError::InvalidTransition(_)) => {
                let current = self
                    .store
                    .find_by_id(&record.id)
                    .await?
                    .ok_or_else(|| CoreError::NotFound("Operation".to_string()))?;
                Ok(DepositStatus::from_record(&current, Some(raw_status)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn pending(&self) -> Result<Vec<OperationRecord>, CoreError> {
        Ok(self.store.list_pending_deposits().await?)
    }
}
