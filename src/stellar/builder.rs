// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction envelope construction.
//!
//! Every build reloads the source account so the envelope carries the
//! current `sequence + 1`. Envelopes have a fixed 300 second validity window
//! and a flat per-operation fee. Building never writes to the operation log.

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    BytesM, DecoratedSignature, Hash, Limits, Memo, Operation, OperationBody,
    PathPaymentStrictReceiveOp, PaymentOp, Preconditions, SequenceNumber, Signature,
    SignatureHint, StringM, TimeBounds, TimePoint, Transaction, TransactionEnvelope,
    TransactionExt, TransactionSignaturePayload, TransactionSignaturePayloadTaggedTransaction,
    TransactionV1Envelope, VecM, WriteXdr,
};
use tracing::debug;

use super::amount::parse_positive_amount;
use super::asset::Asset;
use super::client::{HorizonError, LedgerClient};
use super::error::CoreError;
use super::keys::{decode_public_key, muxed_account, StellarKeypair};
use super::types::{NetworkConfig, MAX_MEMO_BYTES, TX_TIMEOUT_SECS};

/// Maximum number of intermediate assets in a path payment.
pub const MAX_PATH_LEN: usize = 5;

/// Direct payment request, input to [`TransactionBuilder::build_payment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub source: String,
    pub destination: String,
    pub asset: Asset,
    /// Decimal string
    pub amount: String,
    pub memo: Option<String>,
}

impl PaymentIntent {
    /// Check addresses, amount and memo. Returns the amount in stroops.
    pub fn validate(&self) -> Result<i64, CoreError> {
        decode_public_key(&self.source)?;
        decode_public_key(&self.destination)?;
        if let Some(memo) = &self.memo {
            validate_memo(memo)?;
        }
        Ok(parse_positive_amount(&self.amount)?)
    }
}

/// Resolved cheapest route for a path payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheapestPath {
    /// Source amount as the network formatted it
    pub source_amount: String,
    pub source_stroops: i64,
    /// Intermediate assets, in order
    pub path: Vec<Asset>,
}

/// Path payment request. `resolved` is filled in by the path finder before
/// building; without it there is nothing to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPaymentIntent {
    pub source: String,
    pub destination: String,
    pub source_asset: Asset,
    pub dest_asset: Asset,
    pub dest_amount: String,
    pub resolved: Option<CheapestPath>,
}

impl PathPaymentIntent {
    pub fn with_path(mut self, path: CheapestPath) -> Self {
        self.resolved = Some(path);
        self
    }

    pub fn validate(&self) -> Result<i64, CoreError> {
        decode_public_key(&self.source)?;
        decode_public_key(&self.destination)?;
        Ok(parse_positive_amount(&self.dest_amount)?)
    }
}

fn validate_memo(memo: &str) -> Result<(), CoreError> {
    if memo.len() > MAX_MEMO_BYTES {
        return Err(CoreError::Validation(format!(
            "Memo must be at most {MAX_MEMO_BYTES} bytes (got {})",
            memo.len()
        )));
    }
    Ok(())
}

fn xdr_error(e: stellar_xdr::curr::Error) -> CoreError {
    CoreError::Validation(format!("transaction encoding failed: {e}"))
}

/// A transaction envelope bound to one network.
#[derive(Debug, Clone)]
pub struct Envelope {
    envelope: TransactionEnvelope,
    network_id: [u8; 32],
}

impl Envelope {
    fn transaction(&self) -> Option<&Transaction> {
        match &self.envelope {
            TransactionEnvelope::Tx(v1) => Some(&v1.tx),
            _ => None,
        }
    }

    pub fn inner(&self) -> &TransactionEnvelope {
        &self.envelope
    }

    pub fn operation_count(&self) -> usize {
        self.transaction().map_or(0, |tx| tx.operations.len())
    }

    pub fn signature_count(&self) -> usize {
        match &self.envelope {
            TransactionEnvelope::Tx(v1) => v1.signatures.len(),
            _ => 0,
        }
    }

    /// Transaction hash: SHA-256 of the network-scoped signature payload.
    pub fn hash(&self) -> Result<[u8; 32], CoreError> {
        let tx = self
            .transaction()
            .ok_or_else(|| CoreError::Validation("unsupported envelope type".to_string()))?;
        let payload = TransactionSignaturePayload {
            network_id: Hash(self.network_id),
            tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
        };
        let bytes = payload.to_xdr(Limits::none()).map_err(xdr_error)?;
        Ok(Sha256::digest(&bytes).into())
    }

    /// Append a decorated signature by `keypair`.
    pub fn sign(&mut self, keypair: &StellarKeypair) -> Result<(), CoreError> {
        let hash = self.hash()?;
        let signature = BytesM::try_from(keypair.sign(&hash)).map_err(xdr_error)?;
        let decorated = DecoratedSignature {
            hint: SignatureHint(keypair.signature_hint()),
            signature: Signature(signature),
        };

        let TransactionEnvelope::Tx(v1) = &mut self.envelope else {
            return Err(CoreError::Validation("unsupported envelope type".to_string()));
        };
        let mut signatures = v1.signatures.to_vec();
        signatures.push(decorated);
        v1.signatures = VecM::try_from(signatures).map_err(xdr_error)?;
        Ok(())
    }

    pub fn to_xdr_base64(&self) -> Result<String, CoreError> {
        self.envelope
            .to_xdr_base64(Limits::none())
            .map_err(xdr_error)
    }
}

/// Builds unsigned envelopes against the configured network.
#[derive(Clone)]
pub struct TransactionBuilder {
    ledger: Arc<dyn LedgerClient>,
    network: NetworkConfig,
}

impl TransactionBuilder {
    pub fn new(ledger: Arc<dyn LedgerClient>, network: NetworkConfig) -> Self {
        Self { ledger, network }
    }

    /// Build a one-operation payment envelope.
    pub async fn build_payment(&self, intent: &PaymentIntent) -> Result<Envelope, CoreError> {
        let amount = intent.validate()?;
        let operation = Operation {
            source_account: None,
            body: OperationBody::Payment(PaymentOp {
                destination: muxed_account(&intent.destination)?,
                asset: intent.asset.to_xdr()?,
                amount,
            }),
        };
        self.build(&intent.source, operation, intent.memo.as_deref())
            .await
    }

    /// Build a one-operation strict-receive path payment envelope.
    pub async fn build_path_payment(
        &self,
        intent: &PathPaymentIntent,
    ) -> Result<Envelope, CoreError> {
        let dest_amount = intent.validate()?;
        let resolved = intent.resolved.as_ref().ok_or(CoreError::NoPath)?;
        if resolved.path.len() > MAX_PATH_LEN {
            return Err(CoreError::Validation(format!(
                "conversion path has {} hops (max {MAX_PATH_LEN})",
                resolved.path.len()
            )));
        }

        let path = resolved
            .path
            .iter()
            .map(Asset::to_xdr)
            .collect::<Result<Vec<_>, _>>()?;

        let operation = Operation {
            source_account: None,
            body: OperationBody::PathPaymentStrictReceive(PathPaymentStrictReceiveOp {
                send_asset: intent.source_asset.to_xdr()?,
                send_max: resolved.source_stroops,
                destination: muxed_account(&intent.destination)?,
                dest_asset: intent.dest_asset.to_xdr()?,
                dest_amount,
                path: VecM::try_from(path).map_err(xdr_error)?,
            }),
        };
        self.build(&intent.source, operation, None).await
    }

    async fn build(
        &self,
        source: &str,
        operation: Operation,
        memo: Option<&str>,
    ) -> Result<Envelope, CoreError> {
        let account = self
            .ledger
            .load_account(source)
            .await
            .map_err(|e| match e {
                HorizonError::AccountNotFound(address) => CoreError::AccountLoad(address),
                other => CoreError::Network(other.to_string()),
            })?;

        let memo = match memo {
            Some(text) if !text.is_empty() => {
                validate_memo(text)?;
                Memo::Text(StringM::try_from(text.as_bytes().to_vec()).map_err(xdr_error)?)
            }
            _ => Memo::None,
        };

        let operations: VecM<Operation, 100> =
            VecM::try_from(vec![operation]).map_err(xdr_error)?;
        let fee = self
            .network
            .base_fee
            .saturating_mul(operations.len() as u32);
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();

        let tx = Transaction {
            source_account: muxed_account(source)?,
            fee,
            seq_num: SequenceNumber(account.sequence + 1),
            cond: Preconditions::Time(TimeBounds {
                min_time: TimePoint(0),
                max_time: TimePoint(now + TX_TIMEOUT_SECS),
            }),
            memo,
            operations,
            ext: TransactionExt::V0,
        };

        debug!(
            source = %source,
            sequence = account.sequence + 1,
            fee,
            "Built transaction envelope"
        );

        Ok(Envelope {
            envelope: TransactionEnvelope::Tx(TransactionV1Envelope {
                tx,
                signatures: VecM::default(),
            }),
            network_id: self.network.network_id(),
        })
    }
}
