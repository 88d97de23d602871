//! Google Sheets record store: REST v4 `values` endpoints.
//!
//! Reads the whole worksheet in one `GET`, and writes a column back in one
//! `PUT` with `valueInputOption=RAW`, so cells receive literal strings and
//! are never evaluated as formulas.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use smartmeds_core::error::StoreError;
use smartmeds_core::record::{FIRST_DATA_ROW, Snapshot, TableLayout, TableSchema};
use smartmeds_core::store::{RecordStore, WriteSummary, check_alignment};
use tracing::{debug, info, warn};

use crate::a1;

/// A worksheet inside a Google spreadsheet.
pub struct SheetsStore {
    spreadsheet_id: String,
    worksheet: String,
    access_token: String,
    api_url: String,
    timeout: Duration,
    schema: TableSchema,
    client: reqwest::Client,
}

impl SheetsStore {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
        access_token: impl Into<String>,
        schema: TableSchema,
    ) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
            access_token: access_token.into(),
            api_url: "https://sheets.googleapis.com/v4".into(),
            timeout: Duration::from_secs(30),
            schema,
            client: reqwest::Client::new(),
        }
    }

    /// Point at a different API root (proxies, emulators).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{api}/spreadsheets/{id}/values/{range}` with the range percent-encoded.
    fn values_url(&self, range: &str) -> Result<reqwest::Url, StoreError> {
        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid Sheets API url '{}': {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable(format!("Sheets API url '{}' cannot take a path", self.api_url)))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    fn unavailable(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Unavailable(format!("Sheets API timed out after {}s", self.timeout.as_secs()))
        } else {
            StoreError::Unavailable(format!("Sheets API unreachable: {e}"))
        }
    }

    /// Plan a column write: the A1 range and the cell rows to submit.
    fn plan_write(&self, layout: &TableLayout, column: &str, values: &[String]) -> Option<WritePlan> {
        let (idx, exists) = layout.column_slot(column);
        let col = idx + 1;

        let mut rows: Vec<Vec<String>> = Vec::with_capacity(values.len() + 1);
        if !exists {
            rows.push(vec![column.to_string()]);
        }
        rows.extend(values.iter().map(|v| vec![v.clone()]));
        if rows.is_empty() {
            return None;
        }

        let first_row = if exists { FIRST_DATA_ROW } else { FIRST_DATA_ROW - 1 };
        let last_row = first_row + rows.len() - 1;

        Some(WritePlan {
            range: a1::column_range(&self.worksheet, col, first_row, last_row),
            rows,
            header_written: !exists,
        })
    }
}

struct WritePlan {
    range: String,
    rows: Vec<Vec<String>>,
    header_written: bool,
}

/// Render any JSON cell as the text the sheet shows.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RecordStore for SheetsStore {
    fn name(&self) -> &str {
        "sheets"
    }

    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    async fn fetch_all(&self) -> Result<Snapshot, StoreError> {
        let url = self.values_url(&a1::quote_sheet(&self.worksheet))?;
        debug!(spreadsheet = %self.spreadsheet_id, worksheet = %self.worksheet, "Fetching worksheet");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(StoreError::Unavailable(
                "Sheets API rejected the access token".into(),
            ));
        }
        if status == 404 {
            return Err(StoreError::Unavailable(format!(
                "spreadsheet '{}' or worksheet '{}' not found",
                self.spreadsheet_id, self.worksheet
            )));
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Sheets API returned error on read");
            return Err(StoreError::Unavailable(format!("Sheets API returned {status}: {body}")));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(format!("unreadable Sheets response: {e}")))?;

        let mut rows = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect::<Vec<_>>());
        let header = rows.next().unwrap_or_default();
        let rows: Vec<Vec<String>> = rows.collect();

        let snapshot = Snapshot::from_rows(header, rows, &self.schema)?;
        info!(rows = snapshot.len(), worksheet = %self.worksheet, "Fetched worksheet");
        Ok(snapshot)
    }

    async fn write_column(
        &self,
        layout: &TableLayout,
        column: &str,
        values: &[String],
    ) -> Result<WriteSummary, StoreError> {
        check_alignment(layout, values)?;

        let Some(plan) = self.plan_write(layout, column, values) else {
            return Ok(WriteSummary {
                range: String::new(),
                cells_written: 0,
                header_written: false,
            });
        };

        let mut url = self.values_url(&plan.range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = serde_json::json!({
            "range": plan.range,
            "majorDimension": "ROWS",
            "values": plan.rows,
        });

        debug!(range = %plan.range, cells = values.len(), "Writing column");

        let response = self
            .client
            .put(url)
            .timeout(self.timeout)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(StoreError::Unavailable(
                "Sheets API rejected the access token".into(),
            ));
        }
        if !response.status().is_success() {
            let reason = response.text().await.unwrap_or_default();
            warn!(status, range = %plan.range, body = %reason, "Sheets API rejected write");
            return Err(StoreError::WriteFailed {
                range: plan.range,
                reason: format!("status {status}: {reason}"),
            });
        }

        let update: UpdateValuesResponse = response.json().await.unwrap_or_default();
        if let Some(updated) = update.updated_cells {
            debug!(updated, range = ?update.updated_range, "Sheets acknowledged write");
        }

        Ok(WriteSummary {
            range: plan.range,
            cells_written: values.len(),
            header_written: plan.header_written,
        })
    }
}

// --- Sheets API types (internal) ---

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_range: Option<String>,
    #[serde(default)]
    updated_cells: Option<u64>,
}
