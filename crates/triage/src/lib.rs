//! Risk triage for SmartMeds.
//!
//! - [`classifier`]: the rule-based and model-based `RiskClassifier` strategies
//! - [`sync`]: fetch → classify → write-back against a `RecordStore`
//! - [`search`]: comma-separated medication search over a snapshot
//! - [`advice`]: single-case medication-safety advice from the model
//! - [`session`]: the explicitly owned snapshot a front end works against

pub mod advice;
pub mod classifier;
pub mod search;
pub mod session;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use advice::AdviceGenerator;
pub use classifier::{ModelBasedClassifier, RuleBasedClassifier, build_classifier};
pub use search::{SearchQuery, search};
pub use session::Session;
pub use sync::{BatchSynchronizer, RowFailure, SyncReport};
