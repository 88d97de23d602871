//! Rule-based classification: a prioritized drug-list lookup.
//!
//! Lists are evaluated highest tier first and the first list containing any
//! of the patient's drugs decides the tier. A list with no match anywhere
//! falls through to `Low`.

use async_trait::async_trait;
use smartmeds_core::classifier::RiskClassifier;
use smartmeds_core::error::ClassifyError;
use smartmeds_core::record::{DrugName, RiskList, RiskTier};

pub struct RuleBasedClassifier {
    lists: Vec<RiskList>,
}

impl RuleBasedClassifier {
    /// Lists are reordered by tier (high before medium); lists of the same
    /// tier keep their given order.
    pub fn new(mut lists: Vec<RiskList>) -> Self {
        lists.sort_by_key(|list| {
            RiskTier::ASSIGNABLE
                .iter()
                .position(|t| *t == list.tier)
                .unwrap_or(RiskTier::ASSIGNABLE.len())
        });
        Self { lists }
    }

    /// The stock lists: anticoagulant, cardiac glycoside, benzodiazepine and
    /// insulin are high risk; aspirin, metformin and loop diuretics medium.
    pub fn with_default_lists() -> Self {
        Self::new(vec![
            RiskList::new("high", RiskTier::High, ["Warfarin", "Digoxin", "Diazepam", "Insulin"]),
            RiskList::new("medium", RiskTier::Medium, ["Aspirin", "Metformin", "Furosemide"]),
        ])
    }

    pub fn lists(&self) -> &[RiskList] {
        &self.lists
    }

    /// The deciding list and drug, if any list matched.
    pub fn explain<'a>(&self, meds: &'a [DrugName]) -> Option<(&RiskList, &'a DrugName)> {
        self.lists
            .iter()
            .find_map(|list| list.first_match(meds).map(|drug| (list, drug)))
    }

    pub fn evaluate(&self, meds: &[DrugName]) -> RiskTier {
        self.explain(meds)
            .map(|(list, _)| list.tier)
            .unwrap_or(RiskTier::Low)
    }
}

#[async_trait]
impl RiskClassifier for RuleBasedClassifier {
    fn name(&self) -> &str {
        "rule"
    }

    async fn assess(&self, meds: &[DrugName]) -> Result<RiskTier, ClassifyError> {
        let tier = self.evaluate(meds);
        if let Some((list, drug)) = self.explain(meds) {
            tracing::trace!(list = %list.name, drug = %drug, tier = %tier, "Risk list matched");
        }
        Ok(tier)
    }
}
