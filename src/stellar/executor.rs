// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction execution pipeline.
//!
//! One call drives one operation record through
//! `BUILDING → SIGNING → SUBMITTING → {COMPLETED | FAILED}`:
//!
//! 1. derive the source address from the caller's secret
//! 2. validate the request (no store or network contact on failure)
//! 3. create the PENDING operation record, aborting if the store fails
//! 4. build (path payments resolve the cheapest path first)
//! 5. sign and submit
//! 6. record exactly one terminal transition
//!
//! Only failures before the record exists (validation, store create) are
//! returned as errors. Anything after that is an [`ExecutionOutcome`] carrying
//! the operation id: network rejections as `Rejected`, build, path and
//! signing failures as `Failed`. A failing terminal update is logged and
//! never replaces the result the caller receives. The secret is held only for
//! the duration of the call.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::amount::{format_amount, normalize_amount};
use super::asset::Asset;
use super::builder::{Envelope, PathPaymentIntent, PaymentIntent, TransactionBuilder};
use super::client::{HorizonError, LedgerClient};
use super::error::CoreError;
use super::keys::StellarKeypair;
use super::paths::PathFinder;
use super::types::SubmissionFailure;
use crate::storage::repository::operations::{
    CONTEXT_RESULT_CODES, CONTEXT_SEND_MAX, CONTEXT_SOURCE_ASSET,
};
use crate::storage::{NewOperation, OperationContext, OperationStore, OperationType, OperationUpdate};

/// Direct payment requested by a user.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub user_id: String,
    pub destination: String,
    pub asset: Asset,
    pub amount: String,
    pub memo: Option<String>,
}

/// Path payment requested by a user: deliver exactly `dest_amount` of
/// `dest_asset`, paying with `source_asset`.
#[derive(Debug, Clone)]
pub struct PathPaymentRequest {
    pub user_id: String,
    pub destination: String,
    pub source_asset: Asset,
    pub dest_asset: Asset,
    pub dest_amount: String,
}

/// Result of a pipeline run that created an operation record.
#[derive(Debug)]
pub enum ExecutionOutcome {
    Completed {
        operation_id: String,
        hash: String,
        ledger: u32,
    },
    Rejected {
        operation_id: String,
        failure: SubmissionFailure,
    },
    /// Failed before submission; the record is FAILED with this error.
    Failed {
        operation_id: String,
        error: CoreError,
    },
}

impl ExecutionOutcome {
    pub fn operation_id(&self) -> &str {
        match self {
            Self::Completed { operation_id, .. }
            | Self::Rejected { operation_id, .. }
            | Self::Failed { operation_id, .. } => operation_id,
        }
    }
}

#[derive(Clone)]
pub struct TransactionExecutor {
    builder: TransactionBuilder,
    paths: PathFinder,
    ledger: Arc<dyn LedgerClient>,
    store: Arc<dyn OperationStore>,
}

impl TransactionExecutor {
    pub fn new(
        builder: TransactionBuilder,
        paths: PathFinder,
        ledger: Arc<dyn LedgerClient>,
        store: Arc<dyn OperationStore>,
    ) -> Self {
        Self {
            builder,
            paths,
            ledger,
            store,
        }
    }

    pub async fn execute_payment(
        &self,
        request: PaymentRequest,
        secret: &str,
    ) -> Result<ExecutionOutcome, CoreError> {
        let keypair = StellarKeypair::from_secret(secret)?;
        let intent = PaymentIntent {
            source: keypair.public_key().to_string(),
            destination: request.destination,
            asset: request.asset,
            amount: request.amount,
            memo: request.memo.filter(|m| !m.is_empty()),
        };
        let stroops = intent.validate()?;

        let record = self
            .store
            .create(NewOperation::new(
                &request.user_id,
                OperationType::Payment,
                format_amount(stroops),
                intent.asset.code(),
                &intent.destination,
            ))
            .await?;
        let operation_id = record.id;

        info!(
            operation_id = %operation_id,
            user_id = %request.user_id,
            source = %intent.source,
            destination = %intent.destination,
            asset = %intent.asset,
            amount = %intent.amount,
            "Executing payment"
        );

        debug!(operation_id = %operation_id, stage = "building", "Payment pipeline");
        let envelope = match self.builder.build_payment(&intent).await {
            Ok(envelope) => envelope,
            Err(e) => return Ok(self.fail(operation_id, e, OperationContext::new()).await),
        };

        self.sign_and_submit(operation_id, envelope, &keypair, OperationContext::new())
            .await
    }

    /// Path payments record first, so a missing route still leaves a FAILED
    /// audit entry.
    pub async fn execute_path_payment(
        &self,
        request: PathPaymentRequest,
        secret: &str,
    ) -> Result<ExecutionOutcome, CoreError> {
        let keypair = StellarKeypair::from_secret(secret)?;
        let intent = PathPaymentIntent {
            source: keypair.public_key().to_string(),
            destination: request.destination,
            source_asset: request.source_asset,
            dest_asset: request.dest_asset,
            dest_amount: request.dest_amount,
            resolved: None,
        };
        intent.validate()?;
        let dest_amount = normalize_amount(&intent.dest_amount)?;

        let record = self
            .store
            .create(
                NewOperation::new(
                    &request.user_id,
                    OperationType::PathPayment,
                    dest_amount,
                    intent.dest_asset.code(),
                    &intent.destination,
                )
                .with_context(CONTEXT_SOURCE_ASSET, intent.source_asset.to_string()),
            )
            .await?;
        let operation_id = record.id;

        info!(
            operation_id = %operation_id,
            user_id = %request.user_id,
            source = %intent.source,
            destination = %intent.destination,
            source_asset = %intent.source_asset,
            dest_asset = %intent.dest_asset,
            dest_amount = %intent.dest_amount,
            "Executing path payment"
        );

        let cheapest = match self
            .paths
            .find_cheapest_path(&intent.source_asset, &intent.dest_asset, &intent.dest_amount)
            .await
        {
            Ok(path) => path,
            Err(e) => return Ok(self.fail(operation_id, e, OperationContext::new()).await),
        };

        let mut context = OperationContext::new();
        context.insert(
            CONTEXT_SEND_MAX.to_string(),
            format_amount(cheapest.source_stroops),
        );
        let intent = intent.with_path(cheapest);

        debug!(operation_id = %operation_id, stage = "building", "Path payment pipeline");
        let envelope = match self.builder.build_path_payment(&intent).await {
            Ok(envelope) => envelope,
            Err(e) => return Ok(self.fail(operation_id, e, context).await),
        };

        self.sign_and_submit(operation_id, envelope, &keypair, context)
            .await
    }

    async fn sign_and_submit(
        &self,
        operation_id: String,
        mut envelope: Envelope,
        keypair: &StellarKeypair,
        context: OperationContext,
    ) -> Result<ExecutionOutcome, CoreError> {
        debug!(operation_id = %operation_id, stage = "signing", "Transaction pipeline");
        let signed = envelope
            .sign(keypair)
            .and_then(|()| envelope.to_xdr_base64());
        let xdr = match signed {
            Ok(xdr) => xdr,
            Err(e) => return Ok(self.fail(operation_id, e, context).await),
        };

        debug!(operation_id = %operation_id, stage = "submitting", "Transaction pipeline");
        match self.ledger.submit_transaction(&xdr).await {
            Ok(result) => {
                let mut update = OperationUpdate::completed().with_hash(&result.hash);
                update.context.extend(context);
                if let Err(e) = self.store.update(&operation_id, update).await {
                    error!(
                        operation_id = %operation_id,
                        hash = %result.hash,
                        error = %e,
                        "Failed to record completed operation"
                    );
                }
                info!(
                    operation_id = %operation_id,
                    hash = %result.hash,
                    ledger = result.ledger,
                    "Transaction completed"
                );
                Ok(ExecutionOutcome::Completed {
                    operation_id,
                    hash: result.hash,
                    ledger: result.ledger,
                })
            }
            Err(e) => {
                let failure = match e {
                    HorizonError::Rejected(failure) => failure,
                    other => SubmissionFailure::transport(other.to_string()),
                };
                warn!(
                    operation_id = %operation_id,
                    reason = %failure.reason(),
                    "Transaction rejected"
                );

                let mut context = context;
                if let Some(codes) = failure.result_codes() {
                    context.insert(CONTEXT_RESULT_CODES.to_string(), codes);
                }
                self.mark_failed(&operation_id, &failure.reason(), context)
                    .await;

                Ok(ExecutionOutcome::Rejected {
                    operation_id,
                    failure,
                })
            }
        }
    }

    async fn fail(
        &self,
        operation_id: String,
        error: CoreError,
        context: OperationContext,
    ) -> ExecutionOutcome {
        warn!(operation_id = %operation_id, error = %error, "Operation failed before submission");
        self.mark_failed(&operation_id, &error.to_string(), context)
            .await;
        ExecutionOutcome::Failed {
            operation_id,
            error,
        }
    }

    /// Record a FAILED transition. A store failure here is logged only.
    async fn mark_failed(&self, operation_id: &str, reason: &str, context: OperationContext) {
        let mut update = OperationUpdate::failed(reason);
        update.context.extend(context);
        if let Err(e) = self.store.update(operation_id, update).await {
            error!(
                operation_id = %operation_id,
                reason = %reason,
                error = %e,
                "Failed to record failed operation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::operations::CONTEXT_ERROR;
    use crate::storage::{OperationRecord, OperationStatus};
    use crate::stellar::asset::make_asset;
    use crate::stellar::types::{HorizonAsset, NetworkConfig, PathRecord};
    use crate::testing::{temp_operations, FakeLedger, FlakyStore, SECRET_A, SECRET_A_ADDRESS};

    const DEST: &str = "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H";
    const ISSUER: &str = "GABAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEJXA";

    fn executor(ledger: FakeLedger, store: Arc<dyn OperationStore>) -> TransactionExecutor {
        let ledger: Arc<dyn LedgerClient> = Arc::new(ledger);
        TransactionExecutor::new(
            TransactionBuilder::new(ledger.clone(), NetworkConfig::testnet()),
            PathFinder::new(ledger.clone()),
            ledger,
            store,
        )
    }

    fn payment(amount: &str) -> PaymentRequest {
        PaymentRequest {
            user_id: "user-1".to_string(),
            destination: DEST.to_string(),
            asset: Asset::Native,
            amount: amount.to_string(),
            memo: None,
        }
    }

    fn path_payment() -> PathPaymentRequest {
        PathPaymentRequest {
            user_id: "user-1".to_string(),
            destination: DEST.to_string(),
            source_asset: Asset::Native,
            dest_asset: make_asset(Some("USDC"), Some(ISSUER)).unwrap(),
            dest_amount: "5".to_string(),
        }
    }

    async fn only_record(store: &dyn OperationStore) -> OperationRecord {
        let records = store.find_by_user("user-1").await.unwrap();
        assert_eq!(records.len(), 1, "exactly one record per execution");
        records.into_iter().next().unwrap()
    }

    #[tokio::test]
    async fn successful_payment_completes_record_with_hash() {
        let (repo, _dir) = temp_operations();
        let store: Arc<dyn OperationStore> = Arc::new(repo);
        let ledger = FakeLedger::funded(SECRET_A_ADDRESS, 10).accepting("abc123");
        let exec = executor(ledger, store.clone());

        let outcome = exec.execute_payment(payment("10"), SECRET_A).await.unwrap();
        let ExecutionOutcome::Completed { hash, .. } = &outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(hash, "abc123");

        let record = only_record(store.as_ref()).await;
        assert_eq!(record.id, outcome.operation_id());
        assert_eq!(record.status, OperationStatus::Completed);
        assert_eq!(record.stellar_transaction_hash.as_deref(), Some("abc123"));
        assert_eq!(record.amount, "10");
        assert_eq!(record.asset_code, "XLM");
        assert_eq!(record.destination, DEST);
    }

    #[tokio::test]
    async fn rejected_submission_fails_record_with_result_codes() {
        let (repo, _dir) = temp_operations();
        let store: Arc<dyn OperationStore> = Arc::new(repo);
        let ledger = FakeLedger::funded(SECRET_A_ADDRESS, 10).rejecting(SubmissionFailure {
            title: "Transaction Failed".to_string(),
            detail: None,
            transaction_code: Some("tx_failed".to_string()),
            operation_codes: vec!["op_underfunded".to_string()],
        });
        let exec = executor(ledger, store.clone());

        let outcome = exec.execute_payment(payment("10"), SECRET_A).await.unwrap();
        assert!(matches!(outcome, ExecutionOutcome::Rejected { .. }));

        let record = only_record(store.as_ref()).await;
        assert_eq!(record.status, OperationStatus::Failed);
        assert!(record.stellar_transaction_hash.is_none());
        assert_eq!(
            record.context.get(CONTEXT_RESULT_CODES).map(String::as_str),
            Some("tx_failed: op_underfunded")
        );
        assert!(record.context[CONTEXT_ERROR].contains("op_underfunded"));
    }

    #[tokio::test]
    async fn transport_failure_on_submit_is_a_rejection() {
        let (repo, _dir) = temp_operations();
        let store: Arc<dyn OperationStore> = Arc::new(repo);
        let ledger = FakeLedger::funded(SECRET_A_ADDRESS, 10).submit_unreachable();
        let exec = executor(ledger, store.clone());

        let outcome = exec.execute_payment(payment("1"), SECRET_A).await.unwrap();
        assert!(matches!(outcome, ExecutionOutcome::Rejected { .. }));
        assert_eq!(
            only_record(store.as_ref()).await.status,
            OperationStatus::Failed
        );
    }

    #[tokio::test]
    async fn build_failure_fails_record_and_surfaces_error() {
        let (repo, _dir) = temp_operations();
        let store: Arc<dyn OperationStore> = Arc::new(repo);
        let ledger = FakeLedger::default();
        let calls = ledger.calls();
        let exec = executor(ledger, store.clone());

        let outcome = exec.execute_payment(payment("10"), SECRET_A).await.unwrap();
        let ExecutionOutcome::Failed { error, .. } = &outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert!(matches!(error, CoreError::AccountLoad(_)));
        assert_eq!(calls.submissions(), 0);

        let record = only_record(store.as_ref()).await;
        assert_eq!(record.id, outcome.operation_id());
        assert_eq!(record.status, OperationStatus::Failed);
        assert!(record.context[CONTEXT_ERROR].contains("could not be loaded"));
    }

    #[tokio::test]
    async fn validation_failure_touches_nothing() {
        let (repo, _dir) = temp_operations();
        let store: Arc<dyn OperationStore> = Arc::new(repo);
        let ledger = FakeLedger::funded(SECRET_A_ADDRESS, 10);
        let calls = ledger.calls();
        let exec = executor(ledger, store.clone());

        let err = exec
            .execute_payment(payment("ten"), SECRET_A)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(store.find_by_user("user-1").await.unwrap().is_empty());
        assert_eq!(calls.load_account(), 0);

        let err = exec
            .execute_payment(payment("10"), "SBADSECRET")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn store_create_failure_aborts_before_network() {
        let (repo, _dir) = temp_operations();
        let store: Arc<dyn OperationStore> = Arc::new(FlakyStore::failing_create(repo));
        let ledger = FakeLedger::funded(SECRET_A_ADDRESS, 10);
        let calls = ledger.calls();
        let exec = executor(ledger, store);

        let err = exec
            .execute_payment(payment("10"), SECRET_A)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(calls.load_account(), 0);
        assert_eq!(calls.submissions(), 0);
    }

    #[tokio::test]
    async fn failed_update_does_not_mask_original_error() {
        let (repo, _dir) = temp_operations();
        let store: Arc<dyn OperationStore> = Arc::new(FlakyStore::failing_update(repo));
        let exec = executor(FakeLedger::default(), store);

        let outcome = exec.execute_payment(payment("10"), SECRET_A).await.unwrap();
        assert!(matches!(
            outcome,
            ExecutionOutcome::Failed {
                error: CoreError::AccountLoad(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn failed_completion_update_still_reports_success() {
        let (repo, _dir) = temp_operations();
        let store: Arc<dyn OperationStore> = Arc::new(FlakyStore::failing_update(repo));
        let ledger = FakeLedger::funded(SECRET_A_ADDRESS, 10).accepting("abc123");
        let exec = executor(ledger, store);

        let outcome = exec.execute_payment(payment("10"), SECRET_A).await.unwrap();
        assert!(matches!(outcome, ExecutionOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn path_payment_without_route_leaves_failed_record() {
        let (repo, _dir) = temp_operations();
        let store: Arc<dyn OperationStore> = Arc::new(repo);
        let ledger = FakeLedger::funded(SECRET_A_ADDRESS, 10);
        let calls = ledger.calls();
        let exec = executor(ledger, store.clone());

        let outcome = exec
            .execute_path_payment(path_payment(), SECRET_A)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ExecutionOutcome::Failed {
                error: CoreError::NoPath,
                ..
            }
        ));
        assert_eq!(calls.submissions(), 0);

        let record = only_record(store.as_ref()).await;
        assert_eq!(record.id, outcome.operation_id());
        assert_eq!(record.operation_type, OperationType::PathPayment);
        assert_eq!(record.status, OperationStatus::Failed);
        assert_eq!(
            record.context[CONTEXT_ERROR],
            "no conversion path between assets"
        );
        assert_eq!(record.context[CONTEXT_SOURCE_ASSET], "native");
    }

    #[tokio::test]
    async fn path_payment_uses_cheapest_route() {
        let (repo, _dir) = temp_operations();
        let store: Arc<dyn OperationStore> = Arc::new(repo);
        let ledger = FakeLedger::funded(SECRET_A_ADDRESS, 10)
            .with_paths(vec![
                PathRecord {
                    source_amount: "12.5000000".to_string(),
                    path: vec![],
                },
                PathRecord {
                    source_amount: "9.9000000".to_string(),
                    path: vec![HorizonAsset {
                        asset_type: "native".to_string(),
                        asset_code: None,
                        asset_issuer: None,
                    }],
                },
            ])
            .accepting("def456");
        let exec = executor(ledger, store.clone());

        let outcome = exec
            .execute_path_payment(path_payment(), SECRET_A)
            .await
            .unwrap();
        assert!(matches!(outcome, ExecutionOutcome::Completed { .. }));

        let record = only_record(store.as_ref()).await;
        assert_eq!(record.status, OperationStatus::Completed);
        assert_eq!(record.amount, "5");
        assert_eq!(record.asset_code, "USDC");
        assert_eq!(record.context[CONTEXT_SEND_MAX], "9.9");
        assert_eq!(record.stellar_transaction_hash.as_deref(), Some("def456"));
    }
}
