//! Batch synchronization: fetch every record, classify, write the column back.
//!
//! Records are classified concurrently but results are kept in row order,
//! so `tiers[i]` always belongs to sheet row `i + 2` of the fetched
//! snapshot. A record whose classification fails is written as `Unset` and
//! reported; the run continues.

use futures::StreamExt;
use futures::stream;
use serde::{Deserialize, Serialize};
use smartmeds_config::AppConfig;
use smartmeds_core::classifier::RiskClassifier;
use smartmeds_core::error::StoreError;
use smartmeds_core::record::{MedicationRecord, RiskTier, Snapshot};
use smartmeds_core::store::{RecordStore, WriteSummary};
use tracing::{info, warn};

/// A record that could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    /// Sheet row number.
    pub row: usize,
    pub reason: String,
}

/// Outcome of one synchronization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Name of the strategy that produced the tiers.
    pub classifier: String,
    /// One tier per record, in row order.
    pub tiers: Vec<RiskTier>,
    pub failures: Vec<RowFailure>,
    pub write: WriteSummary,
}

impl SyncReport {
    pub fn count(&self, tier: RiskTier) -> usize {
        self.tiers.iter().filter(|t| **t == tier).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BatchSynchronizer {
    concurrency: usize,
}

impl Default for BatchSynchronizer {
    fn default() -> Self {
        Self::new(4)
    }
}

impl BatchSynchronizer {
    /// `concurrency` is clamped to at least one in-flight classification.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.sync.concurrency)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Classify every record, preserving order.
    pub async fn classify_all(
        &self,
        records: &[MedicationRecord],
        classifier: &dyn RiskClassifier,
    ) -> (Vec<RiskTier>, Vec<RowFailure>) {
        let results: Vec<_> = stream::iter(records)
            .map(|record| async move { (record.row, classifier.classify(&record.medications).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut tiers = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (row, result) in results {
            match result {
                Ok(tier) => tiers.push(tier),
                Err(e) => {
                    warn!(row, error = %e, "Classification failed, leaving row unset");
                    failures.push(RowFailure {
                        row,
                        reason: e.to_string(),
                    });
                    tiers.push(RiskTier::Unset);
                }
            }
        }
        (tiers, failures)
    }

    /// Run fetch → classify → write once.
    ///
    /// Returns the fetched snapshot with the new tiers applied. A fetch or
    /// write failure aborts the run; nothing is applied in that case.
    pub async fn sync_all(
        &self,
        store: &dyn RecordStore,
        classifier: &dyn RiskClassifier,
    ) -> Result<(Snapshot, SyncReport), StoreError> {
        let mut snapshot = store.fetch_all().await?;
        info!(
            store = %store.name(),
            classifier = %classifier.name(),
            records = snapshot.len(),
            "Synchronizing risk tiers"
        );

        let (tiers, failures) = self.classify_all(&snapshot.records, classifier).await;

        let schema = store.schema();
        let values: Vec<String> = tiers
            .iter()
            .map(|tier| schema.labels.label(*tier).to_string())
            .collect();
        let write = store
            .write_column(&snapshot.layout, &schema.risk_column, &values)
            .await?;
        snapshot.apply_tiers(&tiers)?;

        info!(
            range = %write.range,
            cells = write.cells_written,
            failures = failures.len(),
            "Risk column written"
        );

        let report = SyncReport {
            classifier: classifier.name().to_string(),
            tiers,
            failures,
            write,
        };
        Ok((snapshot, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ModelBasedClassifier, RuleBasedClassifier};
    use crate::test_helpers::ScriptedProvider;
    use smartmeds_core::error::ProviderError;
    use smartmeds_core::record::{TableSchema, TierLabels};
    use smartmeds_store::InMemoryStore;
    use std::sync::Arc;

    fn store(meds: &[&str]) -> InMemoryStore {
        InMemoryStore::with_medications(TableSchema::default(), meds.iter().copied())
    }

    #[tokio::test]
    async fn mixed_rows_get_tiers_in_order() {
        let store = store(&["Warfarin, Aspirin", "", "Metformin"]);
        let sync = BatchSynchronizer::new(2);

        let (snapshot, report) = sync
            .sync_all(&store, &RuleBasedClassifier::with_default_lists())
            .await
            .unwrap();

        assert_eq!(report.tiers, vec![RiskTier::High, RiskTier::Unset, RiskTier::Medium]);
        assert_eq!(snapshot.tiers(), report.tiers);
        assert_eq!(store.column("藥師風險判讀").await, vec!["紅", "", "黃"]);
        assert_eq!(report.classifier, "rule");
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn written_column_matches_row_count() {
        let store = InMemoryStore::sample(TableSchema::default());
        let n = store.fetch_all().await.unwrap().len();

        let (_, report) = BatchSynchronizer::default()
            .sync_all(&store, &RuleBasedClassifier::with_default_lists())
            .await
            .unwrap();

        assert_eq!(report.tiers.len(), n);
        assert_eq!(report.write.cells_written, n);
        assert_eq!(store.column("藥師風險判讀").await.len(), n);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn rerun_is_idempotent() {
        let store = store(&["Digoxin", "Amlodipine", "Furosemide"]);
        let sync = BatchSynchronizer::new(3);
        let classifier = RuleBasedClassifier::with_default_lists();

        sync.sync_all(&store, &classifier).await.unwrap();
        let first = store.column("藥師風險判讀").await;
        sync.sync_all(&store, &classifier).await.unwrap();
        let second = store.column("藥師風險判讀").await;

        assert_eq!(first, vec!["紅", "綠", "黃"]);
        assert_eq!(first, second);
        assert_eq!(store.header().await.len(), 2);
    }

    #[tokio::test]
    async fn order_is_preserved_under_concurrency() {
        let meds: Vec<String> = (0..40)
            .map(|i| if i % 3 == 0 { "Warfarin".to_string() } else { format!("Drug{i}") })
            .collect();
        let store = InMemoryStore::with_medications(TableSchema::default(), meds.iter().map(String::as_str));

        let (_, report) = BatchSynchronizer::new(8)
            .sync_all(&store, &RuleBasedClassifier::with_default_lists())
            .await
            .unwrap();

        for (i, tier) in report.tiers.iter().enumerate() {
            let expected = if i % 3 == 0 { RiskTier::High } else { RiskTier::Low };
            assert_eq!(*tier, expected, "row {}", i + 2);
        }
    }

    #[tokio::test]
    async fn model_failure_marks_only_that_row() {
        let provider = Arc::new(
            ScriptedProvider::always("綠")
                .when("warfarin", "紅")
                .when_failing("digoxin", ProviderError::Timeout("120s".into())),
        );
        let classifier = ModelBasedClassifier::new(provider.clone(), "m", TierLabels::default());
        let store = store(&["Warfarin", "Digoxin", "Amlodipine"]);

        let (_, report) = BatchSynchronizer::new(2).sync_all(&store, &classifier).await.unwrap();

        assert_eq!(report.tiers, vec![RiskTier::High, RiskTier::Unset, RiskTier::Low]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].row, 3);
        assert!(report.failures[0].reason.contains("timed out"));
        assert_eq!(store.column("藥師風險判讀").await, vec!["紅", "", "綠"]);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn fetch_failure_is_fatal() {
        let store = store(&["Warfarin"]);
        store.fail_fetches(true);
        let err = BatchSynchronizer::default()
            .sync_all(&store, &RuleBasedClassifier::with_default_lists())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn write_failure_is_fatal() {
        let store = store(&["Warfarin"]);
        store.fail_writes(true);
        let err = BatchSynchronizer::default()
            .sync_all(&store, &RuleBasedClassifier::with_default_lists())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::WriteFailed { .. }));
    }

    #[tokio::test]
    async fn empty_table_writes_nothing_but_succeeds() {
        let store = store(&[]);
        let (snapshot, report) = BatchSynchronizer::default()
            .sync_all(&store, &RuleBasedClassifier::with_default_lists())
            .await
            .unwrap();
        assert!(snapshot.is_empty());
        assert!(report.tiers.is_empty());
        assert_eq!(report.write.cells_written, 0);
    }

    #[test]
    fn report_counts_tiers() {
        let report = SyncReport {
            classifier: "rule".into(),
            tiers: vec![RiskTier::High, RiskTier::High, RiskTier::Low, RiskTier::Unset],
            failures: vec![],
            write: WriteSummary {
                range: "'Sheet1'!B2:B5".into(),
                cells_written: 4,
                header_written: false,
            },
        };
        assert_eq!(report.count(RiskTier::High), 2);
        assert_eq!(report.count(RiskTier::Medium), 0);
        assert_eq!(report.count(RiskTier::Unset), 1);
    }
}
