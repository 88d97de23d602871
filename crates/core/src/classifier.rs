//! RiskClassifier trait: turns a medication list into a risk tier.
//!
//! Two strategies implement it (a rule table and a model call). The batch
//! synchronizer only sees this trait, so the strategy is picked once at
//! startup.

use async_trait::async_trait;

use crate::error::ClassifyError;
use crate::record::{DrugName, RiskTier};

#[async_trait]
pub trait RiskClassifier: Send + Sync {
    /// Strategy name for logs (e.g., "rule", "model").
    fn name(&self) -> &str;

    /// Classify a non-empty list of normalized drugs.
    async fn assess(&self, meds: &[DrugName]) -> Result<RiskTier, ClassifyError>;

    /// Classify free text. Blank input yields `Unset` without calling `assess`.
    async fn classify(&self, meds: &str) -> Result<RiskTier, ClassifyError> {
        let drugs = DrugName::parse_list(meds);
        if drugs.is_empty() {
            return Ok(RiskTier::Unset);
        }
        self.assess(&drugs).await
    }
}
