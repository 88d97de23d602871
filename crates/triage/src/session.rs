//! Session: one store handle plus the snapshot a front end is looking at.
//!
//! The snapshot is replaced only by a successful fetch or a successful sync.
//! A failed write-back leaves it exactly as it was.

use std::sync::Arc;

use smartmeds_core::classifier::RiskClassifier;
use smartmeds_core::error::StoreError;
use smartmeds_core::record::{MedicationRecord, Snapshot, TableSchema};
use smartmeds_core::store::RecordStore;
use tracing::debug;

use crate::search::SearchQuery;
use crate::sync::{BatchSynchronizer, SyncReport};

pub struct Session {
    store: Arc<dyn RecordStore>,
    snapshot: Snapshot,
    synchronizer: BatchSynchronizer,
}

impl Session {
    /// Open a session and take the first snapshot.
    pub async fn open(store: Arc<dyn RecordStore>) -> Result<Self, StoreError> {
        let snapshot = store.fetch_all().await?;
        debug!(store = %store.name(), records = snapshot.len(), "Session opened");
        Ok(Self {
            store,
            snapshot,
            synchronizer: BatchSynchronizer::default(),
        })
    }

    pub fn with_synchronizer(mut self, synchronizer: BatchSynchronizer) -> Self {
        self.synchronizer = synchronizer;
        self
    }

    /// Re-read every record from the store.
    pub async fn refresh(&mut self) -> Result<&Snapshot, StoreError> {
        self.snapshot = self.store.fetch_all().await?;
        Ok(&self.snapshot)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn schema(&self) -> &TableSchema {
        self.store.schema()
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Fetch, classify every record and write the risk column back.
    ///
    /// On success the session holds the fresh snapshot with the new tiers.
    pub async fn sync(&mut self, classifier: &dyn RiskClassifier) -> Result<SyncReport, StoreError> {
        let (snapshot, report) = self.synchronizer.sync_all(self.store.as_ref(), classifier).await?;
        self.snapshot = snapshot;
        Ok(report)
    }

    /// Records of the current snapshot matching a comma-separated query.
    pub fn search(&self, query: &str) -> Vec<&MedicationRecord> {
        SearchQuery::parse(query).filter(&self.snapshot.records)
    }
}
