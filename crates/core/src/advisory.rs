//! Advisory request: the input of a single-case advice lookup.

use serde::{Deserialize, Serialize};

use crate::error::AdviceError;
use crate::record::DrugName;

/// Oldest accepted patient age.
pub const MAX_AGE: u32 = 120;

/// A validated (drugs, age, conditions) triple. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub drugs: Vec<DrugName>,
    pub age: u32,
    pub conditions: Vec<String>,
}

impl AdvisoryRequest {
    /// Validate already-split inputs.
    pub fn new(drugs: Vec<DrugName>, age: u32, conditions: Vec<String>) -> Result<Self, AdviceError> {
        let conditions = conditions
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        let request = Self { drugs, age, conditions };
        request.validate()?;
        Ok(request)
    }

    /// Non-empty drug list and an age in `1..=MAX_AGE`.
    pub fn validate(&self) -> Result<(), AdviceError> {
        if self.drugs.is_empty() {
            return Err(AdviceError::InvalidInput("at least one drug is required".into()));
        }
        if self.age == 0 || self.age > MAX_AGE {
            return Err(AdviceError::InvalidInput(format!(
                "age must be between 1 and {MAX_AGE}, got {}",
                self.age
            )));
        }
        Ok(())
    }

    /// Build a request from raw form text: comma-separated drugs and
    /// conditions, and a numeric age.
    pub fn parse(drugs: &str, age: &str, conditions: &str) -> Result<Self, AdviceError> {
        let drugs = DrugName::parse_list(drugs);
        let age: u32 = age
            .trim()
            .parse()
            .map_err(|_| AdviceError::InvalidInput(format!("age must be a whole number, got '{}'", age.trim())))?;
        let conditions = conditions
            .split([',', '，'])
            .map(str::to_string)
            .collect();
        Self::new(drugs, age, conditions)
    }

    /// Drugs in title form, comma-joined, for prompts and display.
    pub fn drug_list(&self) -> String {
        self.drugs.iter().map(DrugName::display).collect::<Vec<_>>().join(", ")
    }

    /// Conditions comma-joined, or `無` when none were given.
    pub fn condition_list(&self) -> String {
        if self.conditions.is_empty() {
            "無".into()
        } else {
            self.conditions.join(", ")
        }
    }
}
