//! In-memory record store: for testing and demos.
//!
//! Holds a raw table (header + rows of cells) and behaves like a sheet:
//! writes address rows by position and a missing column is appended.
//! Fetches and writes can be made to fail to exercise error paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use smartmeds_core::error::StoreError;
use smartmeds_core::record::{FIRST_DATA_ROW, Snapshot, TableLayout, TableSchema};
use smartmeds_core::store::{RecordStore, WriteSummary, check_alignment};
use tokio::sync::RwLock;
use tracing::debug;

use crate::a1;

#[derive(Debug, Clone, Default)]
struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// A sheet-shaped table kept in process memory.
pub struct InMemoryStore {
    schema: TableSchema,
    table: Arc<RwLock<Table>>,
    fail_fetch: AtomicBool,
    fail_write: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(schema: TableSchema, header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            schema,
            table: Arc::new(RwLock::new(Table { header, rows })),
            fail_fetch: AtomicBool::new(false),
            fail_write: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// A table with only the medication column (no risk column yet).
    pub fn with_medications<'a>(schema: TableSchema, meds: impl IntoIterator<Item = &'a str>) -> Self {
        let header = vec![schema.medication_column.clone()];
        let rows = meds.into_iter().map(|m| vec![m.to_string()]).collect();
        Self::new(schema, header, rows)
    }

    /// Sample ward data for `--demo` runs.
    pub fn sample(schema: TableSchema) -> Self {
        let header = vec![
            "床號".to_string(),
            "姓名".to_string(),
            "年齡".to_string(),
            schema.medication_column.clone(),
            schema.risk_column.clone(),
        ];
        let rows = [
            ["A01", "王O明", "82", "Warfarin, Aspirin, Omeprazole"],
            ["A02", "李O華", "76", ""],
            ["A03", "陳O美", "88", "Metformin, Amlodipine"],
            ["A05", "林O雄", "91", "Digoxin, Furosemide"],
            ["B02", "張O珍", "69", "Atorvastatin"],
            ["B07", "黃O德", "79", "ｉｎｓｕｌｉｎ，Metformin"],
        ]
        .into_iter()
        .map(|cells| {
            let mut row: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
            row.push(String::new());
            row
        })
        .collect();
        Self::new(schema, header, rows)
    }

    /// Make subsequent fetches fail with `StoreError::Unavailable`.
    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail with `StoreError::WriteFailed`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_write.store(fail, Ordering::SeqCst);
    }

    /// Number of successful column writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current header row.
    pub async fn header(&self) -> Vec<String> {
        self.table.read().await.header.clone()
    }

    /// Every data cell of a column, padded to the row count.
    pub async fn column(&self, column: &str) -> Vec<String> {
        let table = self.table.read().await;
        let idx = table.header.iter().position(|h| h == column);
        table
            .rows
            .iter()
            .map(|row| idx.and_then(|i| row.get(i)).cloned().unwrap_or_default())
            .collect()
    }

    /// Edit one cell as an outside user would. `row` is the sheet row number.
    pub async fn set_cell(&self, row: usize, column: &str, value: &str) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        let col = table
            .header
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| StoreError::Malformed(format!("no column '{column}'")))?;
        let cells = row
            .checked_sub(FIRST_DATA_ROW)
            .and_then(|i| table.rows.get_mut(i))
            .ok_or_else(|| StoreError::Malformed(format!("no data row {row}")))?;
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.to_string();
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    async fn fetch_all(&self) -> Result<Snapshot, StoreError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        let table = self.table.read().await.clone();
        Snapshot::from_rows(table.header, table.rows, &self.schema)
    }

    async fn write_column(
        &self,
        layout: &TableLayout,
        column: &str,
        values: &[String],
    ) -> Result<WriteSummary, StoreError> {
        check_alignment(layout, values)?;

        let (idx, exists) = layout.column_slot(column);
        let first_row = if exists { FIRST_DATA_ROW } else { FIRST_DATA_ROW - 1 };
        let last_row = (FIRST_DATA_ROW + values.len()).saturating_sub(1).max(first_row);
        let range = a1::column_range("memory", idx + 1, first_row, last_row);

        if self.fail_write.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed {
                range,
                reason: "in-memory store rejected the write".into(),
            });
        }

        let mut table = self.table.write().await;
        if !exists {
            if table.header.len() <= idx {
                table.header.resize(idx + 1, String::new());
            }
            table.header[idx] = column.to_string();
        }
        for (i, value) in values.iter().enumerate() {
            if table.rows.len() <= i {
                table.rows.push(Vec::new());
            }
            let row = &mut table.rows[i];
            if row.len() <= idx {
                row.resize(idx + 1, String::new());
            }
            row[idx] = value.clone();
        }

        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(range = %range, cells = values.len(), "In-memory column written");

        Ok(WriteSummary {
            range,
            cells_written: values.len(),
            header_written: !exists,
        })
    }
}
