//! Medication record domain types.
//!
//! A record is one data row of the external table. Two columns are typed
//! (the medication list and the risk tier); every other column is carried
//! through untouched in an open map. Records are identified by position:
//! data row `i` of a snapshot lives on sheet row `i + 2`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// First sheet row holding data (row 1 is the header).
pub const FIRST_DATA_ROW: usize = 2;

/// The outcome of classifying one medication list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    High,
    Medium,
    Low,
    /// No medication listed, or classification could not be completed.
    #[default]
    Unset,
}

impl RiskTier {
    /// Tiers a classifier can assign, in evaluation priority order.
    pub const ASSIGNABLE: [RiskTier; 3] = [RiskTier::High, RiskTier::Medium, RiskTier::Low];

    pub fn is_set(self) -> bool {
        self != RiskTier::Unset
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::High => "HIGH",
            RiskTier::Medium => "MEDIUM",
            RiskTier::Low => "LOW",
            RiskTier::Unset => "UNSET",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(RiskTier::High),
            "medium" => Ok(RiskTier::Medium),
            "low" => Ok(RiskTier::Low),
            "unset" | "" => Ok(RiskTier::Unset),
            other => Err(format!("unknown risk tier '{other}' (expected high, medium, low or unset)")),
        }
    }
}

/// The text written to the sheet for each tier.
///
/// The same labels are the markers the model is asked to answer with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLabels {
    #[serde(default = "default_high_label")]
    pub high: String,
    #[serde(default = "default_medium_label")]
    pub medium: String,
    #[serde(default = "default_low_label")]
    pub low: String,
}

fn default_high_label() -> String {
    "紅".into()
}
fn default_medium_label() -> String {
    "黃".into()
}
fn default_low_label() -> String {
    "綠".into()
}

impl Default for TierLabels {
    fn default() -> Self {
        Self {
            high: default_high_label(),
            medium: default_medium_label(),
            low: default_low_label(),
        }
    }
}

impl TierLabels {
    /// Sheet text for a tier. `Unset` is written as an empty cell.
    pub fn label(&self, tier: RiskTier) -> &str {
        match tier {
            RiskTier::High => &self.high,
            RiskTier::Medium => &self.medium,
            RiskTier::Low => &self.low,
            RiskTier::Unset => "",
        }
    }

    /// Read a cell back into a tier. Accepts the labels or the tier names;
    /// anything else is `Unset`.
    pub fn parse(&self, cell: &str) -> RiskTier {
        let cell = cell.trim();
        if cell.is_empty() {
            return RiskTier::Unset;
        }
        for tier in RiskTier::ASSIGNABLE {
            if cell == self.label(tier) {
                return tier;
            }
        }
        cell.parse().unwrap_or(RiskTier::Unset)
    }
}

/// Fold full-width ASCII and the ideographic space to their half-width forms.
fn fold_width(c: char) -> char {
    match c {
        '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        _ => c,
    }
}

/// Case- and width-insensitive form of free text: width-folded, lowercased,
/// trimmed, inner whitespace collapsed to single spaces.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text.chars().map(fold_width).collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split comma-separated text (half- or full-width commas) into normalized
/// terms, dropping empty ones.
pub fn split_terms(text: &str) -> Vec<String> {
    text.chars()
        .map(fold_width)
        .collect::<String>()
        .split(',')
        .map(normalize_text)
        .filter(|t| !t.is_empty())
        .collect()
}

/// A normalized drug name used for membership tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DrugName(String);

impl DrugName {
    /// Normalize a raw token. Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let key = normalize_text(raw);
        if key.is_empty() { None } else { Some(Self(key)) }
    }

    /// Parse a comma-separated medication list.
    pub fn parse_list(text: &str) -> Vec<DrugName> {
        split_terms(text).into_iter().map(DrugName).collect()
    }

    /// The folded key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title form for display: "warfarin sodium" → "Warfarin Sodium".
    pub fn display(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut boundary = true;
        for c in self.0.chars() {
            if boundary && c.is_alphabetic() {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            boundary = !c.is_alphabetic();
        }
        out
    }
}

impl fmt::Display for DrugName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// A named set of drugs that maps to one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskList {
    pub name: String,
    pub tier: RiskTier,
    drugs: BTreeSet<DrugName>,
}

impl RiskList {
    pub fn new<'a>(name: impl Into<String>, tier: RiskTier, drugs: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            name: name.into(),
            tier,
            drugs: drugs.into_iter().filter_map(DrugName::new).collect(),
        }
    }

    pub fn contains(&self, drug: &DrugName) -> bool {
        self.drugs.contains(drug)
    }

    /// The first drug in `meds` that belongs to this list.
    pub fn first_match<'a>(&self, meds: &'a [DrugName]) -> Option<&'a DrugName> {
        meds.iter().find(|m| self.contains(m))
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }
}

/// Which columns of the table carry the typed fields, and how tiers are spelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub medication_column: String,
    pub risk_column: String,
    #[serde(default)]
    pub labels: TierLabels,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            medication_column: "目前用藥".into(),
            risk_column: "藥師風險判讀".into(),
            labels: TierLabels::default(),
        }
    }
}

/// One data row of the external table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    /// Sheet row number (1-based; the first data row is 2).
    pub row: usize,

    /// Free-text, comma-separated current medications.
    pub medications: String,

    /// Current classification.
    pub risk_tier: RiskTier,

    /// Every other column, keyed by header.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl MedicationRecord {
    pub fn new(row: usize, medications: impl Into<String>) -> Self {
        Self {
            row,
            medications: medications.into(),
            risk_tier: RiskTier::Unset,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn has_medications(&self) -> bool {
        !DrugName::parse_list(&self.medications).is_empty()
    }

    /// Cell value for any column, typed ones included.
    pub fn cell<'a>(&'a self, column: &str, schema: &'a TableSchema) -> &'a str {
        if column == schema.medication_column {
            &self.medications
        } else if column == schema.risk_column {
            schema.labels.label(self.risk_tier)
        } else {
            self.fields.get(column).map(String::as_str).unwrap_or("")
        }
    }
}

/// Shape of the table a snapshot was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    /// Header cells as read upstream.
    pub header: Vec<String>,

    /// Number of data rows.
    pub row_count: usize,
}

impl TableLayout {
    /// 0-based index of a column in the upstream header.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == column)
    }

    /// Where a column lives, or where it would be appended if absent.
    pub fn column_slot(&self, column: &str) -> (usize, bool) {
        match self.column_index(column) {
            Some(idx) => (idx, true),
            None => (self.header.len(), false),
        }
    }
}

/// An in-memory copy of every record, taken at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub layout: TableLayout,
    pub records: Vec<MedicationRecord>,
}

impl Snapshot {
    /// Build a snapshot from raw table cells. Short rows are padded; a
    /// missing risk column yields `Unset` for every record.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<String>>, schema: &TableSchema) -> Result<Self, StoreError> {
        let layout = TableLayout {
            header,
            row_count: rows.len(),
        };
        let med_idx = layout.column_index(&schema.medication_column).ok_or_else(|| {
            StoreError::Malformed(format!("header has no '{}' column", schema.medication_column))
        })?;
        let risk_idx = layout.column_index(&schema.risk_column);

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, cells)| {
                let cell = |idx: usize| cells.get(idx).map(|c| c.trim()).unwrap_or("");
                let mut record = MedicationRecord::new(i + FIRST_DATA_ROW, cell(med_idx));
                record.risk_tier = risk_idx.map(|idx| schema.labels.parse(cell(idx))).unwrap_or_default();
                for (idx, key) in layout.header.iter().enumerate() {
                    if idx == med_idx || Some(idx) == risk_idx || key.trim().is_empty() {
                        continue;
                    }
                    record.fields.insert(key.trim().to_string(), cell(idx).to_string());
                }
                record
            })
            .collect();

        Ok(Self { layout, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tiers(&self) -> Vec<RiskTier> {
        self.records.iter().map(|r| r.risk_tier).collect()
    }

    /// Overwrite every record's tier, in row order.
    pub fn apply_tiers(&mut self, tiers: &[RiskTier]) -> Result<(), StoreError> {
        if tiers.len() != self.records.len() {
            return Err(StoreError::Alignment {
                expected: self.records.len(),
                actual: tiers.len(),
            });
        }
        for (record, tier) in self.records.iter_mut().zip(tiers) {
            record.risk_tier = *tier;
        }
        Ok(())
    }

    /// Column order for display: upstream header, plus the risk column if absent.
    pub fn columns(&self, schema: &TableSchema) -> Vec<String> {
        let mut columns: Vec<String> = self
            .layout
            .header
            .iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        if self.layout.column_index(&schema.risk_column).is_none() {
            columns.push(schema.risk_column.clone());
        }
        columns
    }
}
