// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory fakes for the ledger, anchor and operation store ports, and a
//! fully wired application state built on them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::auth::{issue_session_token, AuthConfig};
use crate::providers::anchor::{AnchorClient, AnchorError, InteractiveDeposit};
use crate::state::AppState;
use crate::stellar::client::{HorizonError, LedgerClient};
use crate::stellar::types::{AccountState, HorizonBalance, PathRecord, SubmitResult};
use crate::stellar::{Asset, NetworkConfig, SubmissionFailure};
use crate::storage::{
    Database, NewOperation, OperationRecord, OperationRepository, OperationStore, OperationUpdate,
    StorageError, StorageResult,
};

/// Seed `[7; 32]`.
pub const SECRET_A: &str = "SADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQP54X";
pub const SECRET_A_ADDRESS: &str = "GDVEU3DD4KOFECV66VIHWEZOYX4ZKR3WV27L464SIIPOU2IUI3JCZA57";

pub fn temp_operations() -> (OperationRepository, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("test.redb")).unwrap();
    (OperationRepository::new(db), dir)
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Debug, Clone)]
enum SubmitBehavior {
    Accept(String),
    Reject(SubmissionFailure),
    Unreachable,
}

#[derive(Debug)]
struct LedgerState {
    accounts: HashMap<String, AccountState>,
    paths: Vec<PathRecord>,
    submit: SubmitBehavior,
    unreachable: bool,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            paths: Vec::new(),
            submit: SubmitBehavior::Accept("abc123".to_string()),
            unreachable: false,
        }
    }
}

/// Call counters shared between a [`FakeLedger`] and its clones.
#[derive(Debug, Clone, Default)]
pub struct LedgerCalls {
    load_account: Arc<AtomicUsize>,
    submissions: Arc<AtomicUsize>,
    path_queries: Arc<AtomicUsize>,
}

impl LedgerCalls {
    pub fn load_account(&self) -> usize {
        self.load_account.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn path_queries(&self) -> usize {
        self.path_queries.load(Ordering::SeqCst)
    }
}

/// Scriptable [`LedgerClient`]. Submissions succeed with hash `abc123`
/// unless configured otherwise; unknown accounts are not found.
#[derive(Debug, Clone, Default)]
pub struct FakeLedger {
    state: Arc<Mutex<LedgerState>>,
    calls: LedgerCalls,
}

impl FakeLedger {
    pub fn funded(address: &str, sequence: i64) -> Self {
        let ledger = Self::default();
        ledger.insert_account(address, sequence);
        ledger
    }

    /// Every account lookup fails with a server error.
    pub fn unreachable() -> Self {
        let ledger = Self::default();
        ledger.state.lock().unwrap().unreachable = true;
        ledger
    }

    pub fn with_balances(self, address: &str, balances: Vec<HorizonBalance>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let account = state
                .accounts
                .entry(address.to_string())
                .or_insert_with(|| AccountState {
                    account_id: address.to_string(),
                    sequence: 1,
                    balances: Vec::new(),
                });
            account.balances = balances;
        }
        self
    }

    pub fn with_paths(self, paths: Vec<PathRecord>) -> Self {
        self.state.lock().unwrap().paths = paths;
        self
    }

    pub fn accepting(self, hash: &str) -> Self {
        self.state.lock().unwrap().submit = SubmitBehavior::Accept(hash.to_string());
        self
    }

    pub fn rejecting(self, failure: SubmissionFailure) -> Self {
        self.state.lock().unwrap().submit = SubmitBehavior::Reject(failure);
        self
    }

    pub fn submit_unreachable(self) -> Self {
        self.state.lock().unwrap().submit = SubmitBehavior::Unreachable;
        self
    }

    pub fn calls(&self) -> LedgerCalls {
        self.calls.clone()
    }

    fn insert_account(&self, address: &str, sequence: i64) {
        self.state.lock().unwrap().accounts.insert(
            address.to_string(),
            AccountState {
                account_id: address.to_string(),
                sequence,
                balances: vec![HorizonBalance {
                    balance: "10000.0000000".to_string(),
                    asset_type: "native".to_string(),
                    asset_code: None,
                    asset_issuer: None,
                    liquidity_pool_id: None,
                }],
            },
        );
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn load_account(&self, address: &str) -> Result<AccountState, HorizonError> {
        self.calls.load_account.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(HorizonError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        state
            .accounts
            .get(address)
            .cloned()
            .ok_or_else(|| HorizonError::AccountNotFound(address.to_string()))
    }

    async fn submit_transaction(&self, _envelope_xdr: &str) -> Result<SubmitResult, HorizonError> {
        self.calls.submissions.fetch_add(1, Ordering::SeqCst);
        let behavior = self.state.lock().unwrap().submit.clone();
        match behavior {
            SubmitBehavior::Accept(hash) => Ok(SubmitResult {
                hash,
                ledger: 1234,
                result_xdr: None,
            }),
            SubmitBehavior::Reject(failure) => Err(HorizonError::Rejected(failure)),
            SubmitBehavior::Unreachable => Err(HorizonError::Status {
                status: 504,
                body: "gateway timeout".to_string(),
            }),
        }
    }

    async fn find_strict_receive_paths(
        &self,
        _source: &Asset,
        _dest: &Asset,
        _dest_amount: &str,
    ) -> Result<Vec<PathRecord>, HorizonError> {
        self.calls.path_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().paths.clone())
    }

    async fn fund_test_account(&self, address: &str) -> Result<(), HorizonError> {
        self.insert_account(address, 1);
        Ok(())
    }
}

// =============================================================================
// Operation store
// =============================================================================

/// Wraps a real repository and fails either creates or updates.
pub struct FlakyStore {
    inner: OperationRepository,
    fail_create: bool,
    fail_update: bool,
}

impl FlakyStore {
    pub fn failing_create(inner: OperationRepository) -> Self {
        Self {
            inner,
            fail_create: true,
            fail_update: false,
        }
    }

    pub fn failing_update(inner: OperationRepository) -> Self {
        Self {
            inner,
            fail_create: false,
            fail_update: true,
        }
    }
}

#[async_trait]
impl OperationStore for FlakyStore {
    async fn create(&self, operation: NewOperation) -> StorageResult<OperationRecord> {
        if self.fail_create {
            return Err(StorageError::Task("disk full".to_string()));
        }
        self.inner.create(operation).await
    }

    async fn update(&self, id: &str, update: OperationUpdate) -> StorageResult<OperationRecord> {
        if self.fail_update {
            return Err(StorageError::Task("disk full".to_string()));
        }
        self.inner.update(id, update).await
    }

    async fn find_by_user(&self, user_id: &str) -> StorageResult<Vec<OperationRecord>> {
        self.inner.find_by_user(user_id).await
    }

    async fn find_by_id(&self, id: &str) -> StorageResult<Option<OperationRecord>> {
        self.inner.find_by_id(id).await
    }

    async fn list_pending_deposits(&self) -> StorageResult<Vec<OperationRecord>> {
        self.inner.list_pending_deposits().await
    }
}

// =============================================================================
// Anchor
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct AnchorCalls {
    initiated: Arc<AtomicUsize>,
    status_checks: Arc<AtomicUsize>,
}

impl AnchorCalls {
    pub fn initiated(&self) -> usize {
        self.initiated.load(Ordering::SeqCst)
    }

    pub fn status_checks(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }
}

/// Anchor that hands out one transaction id and reports a fixed status.
#[derive(Debug, Clone)]
pub struct FakeAnchor {
    tx_id: String,
    status: String,
    calls: AnchorCalls,
}

impl FakeAnchor {
    pub fn new(tx_id: &str, status: &str) -> Self {
        Self {
            tx_id: tx_id.to_string(),
            status: status.to_string(),
            calls: AnchorCalls::default(),
        }
    }

    pub fn calls(&self) -> AnchorCalls {
        self.calls.clone()
    }
}

#[async_trait]
impl AnchorClient for FakeAnchor {
    fn domain(&self) -> &str {
        "testanchor.stellar.org"
    }

    async fn initiate_deposit(
        &self,
        _asset_code: &str,
        _account: &str,
        _amount: &str,
    ) -> Result<InteractiveDeposit, AnchorError> {
        self.calls.initiated.fetch_add(1, Ordering::SeqCst);
        Ok(InteractiveDeposit {
            url: format!("https://testanchor.stellar.org/deposit?id={}", self.tx_id),
            id: self.tx_id.clone(),
        })
    }

    async fn transaction_status(&self, _anchor_tx_id: &str) -> Result<String, AnchorError> {
        self.calls.status_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.status.clone())
    }
}

// =============================================================================
// Application state
// =============================================================================

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Full application state over a temporary database, the given ledger and
/// an anchor that reports every deposit as completed.
pub fn test_state(ledger: FakeLedger) -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("test.redb")).unwrap();
    let state = AppState::new(
        db,
        Arc::new(ledger),
        Arc::new(FakeAnchor::new("anchor-tx-1", "completed")),
        NetworkConfig::testnet(),
        AuthConfig::from_secret(TEST_JWT_SECRET),
    );
    (state, dir)
}

/// Session token for `user_id` signed with the state's secret.
pub fn bearer(state: &AppState, user_id: &str) -> String {
    issue_session_token(&state.auth_config, user_id).unwrap()
}
