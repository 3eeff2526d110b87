// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::AuthConfig;
use crate::deposits::DepositService;
use crate::providers::anchor::AnchorClient;
use crate::stellar::{
    BalanceReader, LedgerClient, NetworkConfig, PathFinder, TransactionBuilder,
    TransactionExecutor,
};
use crate::storage::{
    ContactRepository, Database, OperationRepository, OperationStore, UserRepository,
};

/// Shared handler state. Every service is wired against the same ledger
/// client and operation store.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub operations: Arc<dyn OperationStore>,
    pub users: UserRepository,
    pub contacts: ContactRepository,
    pub ledger: Arc<dyn LedgerClient>,
    pub network: NetworkConfig,
    pub builder: TransactionBuilder,
    pub path_finder: PathFinder,
    pub balances: BalanceReader,
    pub executor: TransactionExecutor,
    pub deposits: DepositService,
    pub auth_config: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(
        db: Database,
        ledger: Arc<dyn LedgerClient>,
        anchor: Arc<dyn AnchorClient>,
        network: NetworkConfig,
        auth_config: AuthConfig,
    ) -> Self {
        let operations: Arc<dyn OperationStore> = Arc::new(OperationRepository::new(db.clone()));
        let builder = TransactionBuilder::new(ledger.clone(), network.clone());
        let path_finder = PathFinder::new(ledger.clone());
        let executor = TransactionExecutor::new(
            builder.clone(),
            path_finder.clone(),
            ledger.clone(),
            operations.clone(),
        );

        Self {
            users: UserRepository::new(db.clone()),
            contacts: ContactRepository::new(db.clone()),
            balances: BalanceReader::new(ledger.clone()),
            deposits: DepositService::new(anchor, operations.clone()),
            db,
            operations,
            ledger,
            network,
            builder,
            path_finder,
            executor,
            auth_config: Arc::new(auth_config),
        }
    }
}
