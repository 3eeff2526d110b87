// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Deposit Poller
//!
//! Background task that periodically reconciles pending deposits with the
//! anchor, so deposit records reach a terminal state even when no user is
//! polling the status endpoint.
//!
//! ## Strategy
//!
//! Every `poll_interval` (default 30 s) the poller:
//! 1. Lists all PENDING `DEPOSIT` operation records, oldest first.
//! 2. Reconciles each one through [`DepositService::reconcile`], the same
//!    path the status endpoint uses.
//!
//! Failures are logged per record and never stop the sweep.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::deposits::DepositService;

pub struct DepositPoller {
    deposits: DepositService,
    poll_interval: Duration,
}

impl DepositPoller {
    pub fn new(deposits: DepositService, poll_interval: Duration) -> Self {
        Self {
            deposits,
            poll_interval,
        }
    }

    /// Run the poller loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(poller.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Deposit poller starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Deposit poller shutting down");
                return;
            }

            self.poll_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Deposit poller shutting down");
                    return;
                }
            }
        }
    }

    /// One sweep. Returns the number of records that reached a terminal state.
    pub async fn poll_step(&self) -> usize {
        let pending = match self.deposits.pending().await {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e, "Deposit poller: failed to list pending deposits");
                return 0;
            }
        };

        if pending.is_empty() {
            return 0;
        }

        debug!(count = pending.len(), "Deposit poller: reconciling deposits");

        let mut settled = 0;
        for record in pending {
            let operation_id = record.id.clone();
            match self.deposits.reconcile(record).await {
                Ok(status) if status.status.is_terminal() => {
                    settled += 1;
                    info!(
                        operation_id = %operation_id,
                        status = ?status.status,
                        anchor_status = ?status.anchor_status,
                        "Deposit poller: deposit settled"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        operation_id = %operation_id,
                        error = %e,
                        "Deposit poller: failed to reconcile deposit"
                    );
                }
            }
        }
        settled
    }
}
