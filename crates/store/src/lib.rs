//! Record store implementations for SmartMeds.
//!
//! All stores implement the `smartmeds_core::RecordStore` trait.

pub mod a1;
pub mod in_memory;
pub mod sheets;

pub use in_memory::InMemoryStore;
pub use sheets::SheetsStore;

use std::sync::Arc;
use std::time::Duration;

use smartmeds_config::AppConfig;
use smartmeds_core::error::StoreError;
use smartmeds_core::store::RecordStore;

/// Build the configured record store.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
    let schema = config.schema();
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::sample(schema))),
        "sheets" => {
            let spreadsheet_id = config.store.spreadsheet_id.as_deref().ok_or_else(|| {
                StoreError::Unavailable(
                    "store.spreadsheet_id is not set (or export SMARTMEDS_SPREADSHEET_ID)".into(),
                )
            })?;
            let token = config.store.access_token.as_deref().ok_or_else(|| {
                StoreError::Unavailable(
                    "store.access_token is not set (or export SMARTMEDS_SHEETS_TOKEN)".into(),
                )
            })?;
            let store = SheetsStore::new(spreadsheet_id, &config.store.worksheet, token, schema)
                .with_api_url(&config.store.api_url)
                .with_timeout(Duration::from_secs(config.store.timeout_secs));
            Ok(Arc::new(store))
        }
        other => Err(StoreError::Unavailable(format!("unknown store backend '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_builds() {
        let mut config = AppConfig::default();
        config.store.backend = "memory".into();
        let store = build_from_config(&config).unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn sheets_backend_requires_spreadsheet_id() {
        let err = build_from_config(&AppConfig::default()).err().unwrap();
        assert!(err.to_string().contains("spreadsheet_id"));
    }

    #[test]
    fn sheets_backend_requires_token() {
        let mut config = AppConfig::default();
        config.store.spreadsheet_id = Some("abc".into());
        let err = build_from_config(&config).err().unwrap();
        assert!(err.to_string().contains("access_token"));
    }

    #[test]
    fn sheets_backend_builds_with_credentials() {
        let mut config = AppConfig::default();
        config.store.spreadsheet_id = Some("abc".into());
        config.store.access_token = Some("ya29.token".into());
        let store = build_from_config(&config).unwrap();
        assert_eq!(store.name(), "sheets");
        assert_eq!(store.schema().risk_column, "藥師風險判讀");
    }
}
