//! Medication search over a snapshot.
//!
//! A query is a comma-separated list of terms. A record matches when its
//! medication text contains any term, compared case- and width-insensitively.
//! An empty query matches everything.

use smartmeds_core::record::{MedicationRecord, normalize_text, split_terms};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<String>,
}

impl SearchQuery {
    pub fn parse(query: &str) -> Self {
        Self {
            terms: split_terms(query),
        }
    }

    /// Normalized terms, in query order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, record: &MedicationRecord) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let haystack = normalize_text(&record.medications);
        self.terms.iter().any(|term| haystack.contains(term.as_str()))
    }

    /// Matching records, in their original order.
    pub fn filter<'a>(&self, records: &'a [MedicationRecord]) -> Vec<&'a MedicationRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Filter `records` by a raw comma-separated query.
pub fn search<'a>(records: &'a [MedicationRecord], query: &str) -> Vec<&'a MedicationRecord> {
    SearchQuery::parse(query).filter(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<MedicationRecord> {
        vec![
            MedicationRecord::new(2, "Warfarin, Aspirin"),
            MedicationRecord::new(3, ""),
            MedicationRecord::new(4, "Metformin"),
            MedicationRecord::new(5, "ＩＮＳＵＬＩＮ glargine"),
        ]
    }

    fn rows(found: Vec<&MedicationRecord>) -> Vec<usize> {
        found.iter().map(|r| r.row).collect()
    }

    #[test]
    fn empty_query_returns_everything() {
        let records = records();
        assert_eq!(search(&records, "").len(), 4);
        assert_eq!(search(&records, " , ，").len(), 4);
        assert!(SearchQuery::parse("  ").is_empty());
    }

    #[test]
    fn match_is_case_insensitive() {
        let records = records();
        assert_eq!(rows(search(&records, "WARFARIN")), vec![2]);
        assert_eq!(rows(search(&records, "metformin")), vec![4]);
    }

    #[test]
    fn match_is_width_insensitive_both_ways() {
        let records = records();
        assert_eq!(rows(search(&records, "insulin")), vec![5]);
        assert_eq!(rows(search(&records, "ａｓｐｉｒｉｎ")), vec![2]);
    }

    #[test]
    fn any_term_matches_in_record_order() {
        let records = records();
        assert_eq!(rows(search(&records, "metformin, warfarin")), vec![2, 4]);
        assert_eq!(rows(search(&records, "metformin，digoxin")), vec![4]);
    }

    #[test]
    fn terms_match_substrings() {
        let records = records();
        assert_eq!(rows(search(&records, "farin")), vec![2]);
        assert!(search(&records, "digoxin").is_empty());
    }
}
