//! # SmartMeds Core
//!
//! Domain types, traits, and error definitions for the SmartMeds
//! medication-risk triage tool. This crate has no I/O of its own; it
//! defines the model that the store, provider and triage crates implement
//! against.
//!
//! The two external collaborators (the spreadsheet and the text-generation
//! service) are traits here, as is the classification strategy, so each
//! can be swapped via configuration or replaced by a stub in tests.

pub mod error;
pub mod message;
pub mod provider;
pub mod record;
pub mod advisory;
pub mod store;
pub mod classifier;

// Re-export key types at crate root for ergonomics
pub use error::{AdviceError, ClassifyError, Error, ProviderError, Result, StoreError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use record::{
    DrugName, MedicationRecord, RiskList, RiskTier, Snapshot, TableLayout, TableSchema, TierLabels,
};
pub use advisory::AdvisoryRequest;
pub use store::{RecordStore, WriteSummary};
pub use classifier::RiskClassifier;
