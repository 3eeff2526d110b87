// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cheapest strict-receive path selection.

use std::sync::Arc;

use tracing::{debug, warn};

use super::amount::{parse_amount, parse_positive_amount};
use super::asset::Asset;
use super::builder::CheapestPath;
use super::client::LedgerClient;
use super::error::CoreError;
use super::types::PathRecord;

#[derive(Clone)]
pub struct PathFinder {
    ledger: Arc<dyn LedgerClient>,
}

impl PathFinder {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    /// Query every strict-receive path delivering `dest_amount` of `dest`
    /// and return the one needing the least `source`.
    pub async fn find_cheapest_path(
        &self,
        source: &Asset,
        dest: &Asset,
        dest_amount: &str,
    ) -> Result<CheapestPath, CoreError> {
        parse_positive_amount(dest_amount)?;

        let records = self
            .ledger
            .find_strict_receive_paths(source, dest, dest_amount)
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?;

        debug!(
            source = %source,
            dest = %dest,
            dest_amount,
            candidates = records.len(),
            "Resolved strict-receive paths"
        );

        select_cheapest(&records)
    }
}

/// Linear minimum over parsed source amounts. The first record wins ties.
/// Records whose amount or path cannot be parsed are skipped.
pub fn select_cheapest(records: &[PathRecord]) -> Result<CheapestPath, CoreError> {
    let mut best: Option<(i64, &PathRecord)> = None;

    for record in records {
        let stroops = match parse_amount(&record.source_amount) {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    source_amount = %record.source_amount,
                    error = %e,
                    "Skipping path record with unparseable amount"
                );
                continue;
            }
        };
        if best.is_none_or(|(current, _)| stroops < current) {
            best = Some((stroops, record));
        }
    }

    let (source_stroops, record) = best.ok_or(CoreError::NoPath)?;
    let path = record
        .path
        .iter()
        .map(Asset::from_horizon)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            warn!(error = %e, "Cheapest path contains an unsupported asset");
            CoreError::NoPath
        })?;

    Ok(CheapestPath {
        source_amount: record.source_amount.clone(),
        source_stroops,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stellar::asset::make_asset;
    use crate::stellar::types::HorizonAsset;
    use crate::testing::FakeLedger;

    const ISSUER: &str = "GABAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEJXA";

    fn record(amount: &str, path: Vec<HorizonAsset>) -> PathRecord {
        PathRecord {
            source_amount: amount.to_string(),
            path,
        }
    }

    fn native() -> HorizonAsset {
        HorizonAsset {
            asset_type: "native".to_string(),
            asset_code: None,
            asset_issuer: None,
        }
    }

    #[test]
    fn picks_numerically_smallest_amount() {
        let records = vec![
            record("12.5", vec![]),
            record("9.9", vec![native()]),
            record("15.0", vec![]),
        ];
        let cheapest = select_cheapest(&records).unwrap();
        assert_eq!(cheapest.source_amount, "9.9");
        assert_eq!(cheapest.source_stroops, 99_000_000);
        assert_eq!(cheapest.path, vec![Asset::Native]);
    }

    #[test]
    fn compares_parsed_values_not_strings() {
        // "10.0000000" sorts before "9.5" as a string
        let records = vec![record("10.0000000", vec![]), record("9.5", vec![])];
        assert_eq!(select_cheapest(&records).unwrap().source_amount, "9.5");
    }

    #[test]
    fn ties_keep_first_seen_record() {
        let eurt = HorizonAsset {
            asset_type: "credit_alphanum4".to_string(),
            asset_code: Some("EURT".to_string()),
            asset_issuer: Some(ISSUER.to_string()),
        };
        let records = vec![
            record("9.9000000", vec![eurt]),
            record("9.9", vec![native()]),
        ];
        let cheapest = select_cheapest(&records).unwrap();
        assert_eq!(
            cheapest.path,
            vec![make_asset(Some("EURT"), Some(ISSUER)).unwrap()]
        );
    }

    #[test]
    fn empty_or_unparseable_results_are_no_path() {
        assert!(matches!(select_cheapest(&[]), Err(CoreError::NoPath)));
        let records = vec![record("abc", vec![])];
        assert!(matches!(select_cheapest(&records), Err(CoreError::NoPath)));
    }

    #[tokio::test]
    async fn no_records_from_network_is_no_path() {
        let finder = PathFinder::new(Arc::new(FakeLedger::default()));
        let dest = make_asset(Some("USDC"), Some(ISSUER)).unwrap();
        let err = finder
            .find_cheapest_path(&Asset::Native, &dest, "5")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NoPath));
        assert_eq!(err.to_string(), "no conversion path between assets");
    }

    #[tokio::test]
    async fn invalid_amount_is_rejected_before_query() {
        let ledger = FakeLedger::default();
        let calls = ledger.calls();
        let finder = PathFinder::new(Arc::new(ledger));
        let err = finder
            .find_cheapest_path(&Asset::Native, &Asset::Native, "-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(calls.path_queries(), 0);
    }
}
