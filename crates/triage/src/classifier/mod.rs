//! Classification strategies.
//!
//! The strategy is picked once, from configuration, and handed to the
//! synchronizer as a `dyn RiskClassifier`.

pub mod model_based;
pub mod rule_based;

pub use model_based::ModelBasedClassifier;
pub use rule_based::RuleBasedClassifier;

use std::sync::Arc;

use smartmeds_config::{AppConfig, ClassifierKind};
use smartmeds_core::classifier::RiskClassifier;
use smartmeds_core::error::Error;
use smartmeds_core::provider::Provider;

/// Build the configured classifier.
///
/// The model-based strategy needs a provider; the rule-based one ignores it.
pub fn build_classifier(
    config: &AppConfig,
    provider: Option<Arc<dyn Provider>>,
) -> smartmeds_core::Result<Arc<dyn RiskClassifier>> {
    match config.classifier.kind {
        ClassifierKind::Rule => Ok(Arc::new(RuleBasedClassifier::new(config.risk_lists()))),
        ClassifierKind::Model => {
            let provider = provider.ok_or_else(|| Error::Config {
                message: "model-based classification needs a provider; set api_key or SMARTMEDS_API_KEY"
                    .into(),
            })?;
            let classifier = ModelBasedClassifier::new(provider, config.classifier_model(), config.labels.clone())
                .with_unrecognized_tier(config.classifier.unrecognized_tier);
            Ok(Arc::new(classifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedProvider;
    use smartmeds_core::record::RiskTier;

    #[tokio::test]
    async fn rule_kind_uses_configured_lists() {
        let mut config = AppConfig::default();
        config.risk_lists.high = vec!["Amiodarone".into()];
        let classifier = build_classifier(&config, None).unwrap();
        assert_eq!(classifier.name(), "rule");
        assert_eq!(classifier.classify("amiodarone").await.unwrap(), RiskTier::High);
        assert_eq!(classifier.classify("Warfarin").await.unwrap(), RiskTier::Low);
    }

    #[tokio::test]
    async fn model_kind_uses_provider_and_config() {
        let mut config = AppConfig::default();
        config.classifier.kind = ClassifierKind::Model;
        config.classifier.model = Some("classifier-model".into());
        let provider = Arc::new(ScriptedProvider::always("黃"));

        let classifier = build_classifier(&config, Some(provider.clone())).unwrap();
        assert_eq!(classifier.name(), "model");
        assert_eq!(classifier.classify("Aspirin").await.unwrap(), RiskTier::Medium);
        let request = provider.last_request().unwrap();
        assert_eq!(request.model, "classifier-model");
        assert_eq!(request.temperature, 0.0);
    }

    #[test]
    fn model_kind_without_provider_is_config_error() {
        let mut config = AppConfig::default();
        config.classifier.kind = ClassifierKind::Model;
        let err = build_classifier(&config, None).err().unwrap();
        assert!(matches!(err, Error::Config { .. }));
    }
}
