//! RecordStore trait: the abstraction over the external tabular store.
//!
//! The store is the source of truth. The core only needs two operations:
//! read every row as a record, and write one column back for every row of
//! the snapshot those records came from.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::record::{Snapshot, TableLayout, TableSchema};

/// What a column write touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    /// A1 range submitted to the store (e.g. `Sheet1!C2:C4`)
    pub range: String,

    /// Data cells written (excludes the header cell)
    pub cells_written: usize,

    /// Whether the column was new and its header cell was written too
    pub header_written: bool,
}

/// The core RecordStore trait.
///
/// Implementations: Google Sheets, in-memory (for testing and demos).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The backend name (e.g., "sheets", "memory").
    fn name(&self) -> &str;

    /// Column names and tier labels this store reads and writes with.
    fn schema(&self) -> &TableSchema;

    /// Read every data row, in sheet order.
    async fn fetch_all(&self) -> Result<Snapshot, StoreError>;

    /// Write `values[i]` into sheet row `i + 2` of `column`.
    ///
    /// `layout` must come from the snapshot the values were computed from;
    /// a length mismatch fails with [`StoreError::Alignment`] before any
    /// external call.
    async fn write_column(
        &self,
        layout: &TableLayout,
        column: &str,
        values: &[String],
    ) -> Result<WriteSummary, StoreError>;
}

/// Reject a column whose length differs from the snapshot's row count.
pub fn check_alignment(layout: &TableLayout, values: &[String]) -> Result<(), StoreError> {
    if values.len() != layout.row_count {
        return Err(StoreError::Alignment {
            expected: layout.row_count,
            actual: values.len(),
        });
    }
    Ok(())
}
