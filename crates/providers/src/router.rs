//! Provider router: selects the text-generation provider based on config.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use smartmeds_config::AppConfig;
use smartmeds_core::provider::Provider;
use tracing::warn;

use crate::openai_compat::{DEFAULT_TIMEOUT, OpenAiCompatProvider};

/// Routes requests to the configured provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build the router: every `[providers.<name>]` entry plus the default
/// provider, which is registered even when it has no entry of its own.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    let mut names: Vec<&str> = config.providers.keys().map(String::as_str).collect();
    if !config.providers.contains_key(&config.default_provider) {
        names.push(&config.default_provider);
    }

    for name in names {
        match build_provider(name, config) {
            Some(provider) => router.register(name, Arc::new(provider)),
            None => warn!(provider = name, "Unknown provider has no api_url, skipping"),
        }
    }

    router
}

/// One OpenAI-compatible client; per-provider settings win over globals.
fn build_provider(name: &str, config: &AppConfig) -> Option<OpenAiCompatProvider> {
    let entry = config.providers.get(name);
    let base_url = entry
        .and_then(|p| p.api_url.clone())
        .or_else(|| well_known_base_url(name).map(str::to_string))?;
    let api_key = entry
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();
    let timeout = entry
        .and_then(|p| p.timeout_secs)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT);

    Some(OpenAiCompatProvider::new(name, base_url, api_key).with_timeout(timeout))
}

/// Base URL of a well-known OpenAI-compatible endpoint.
fn well_known_base_url(name: &str) -> Option<&'static str> {
    let url = match name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartmeds_config::ProviderConfig;

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("openai");
        router.register("openai", Arc::new(OpenAiCompatProvider::openai("sk-test")));

        assert!(router.get("openai").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
    }

    #[test]
    fn default_provider_is_always_registered() {
        let config = AppConfig::default();
        let router = build_from_config(&config);
        let provider = router.default().unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn configured_providers_are_registered() {
        let mut config = AppConfig {
            default_provider: "ollama".into(),
            ..AppConfig::default()
        };
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_key: None,
                api_url: Some("http://gpu-box:11434/v1".into()),
                default_model: None,
                timeout_secs: Some(300),
            },
        );
        let router = build_from_config(&config);
        assert_eq!(router.list(), vec!["ollama"]);
        assert_eq!(router.default().unwrap().name(), "ollama");
    }

    #[test]
    fn unknown_provider_without_url_is_skipped() {
        let config = AppConfig {
            default_provider: "acme".into(),
            ..AppConfig::default()
        };
        let router = build_from_config(&config);
        assert!(router.default().is_none());
        assert!(router.list().is_empty());
    }

    #[test]
    fn unknown_provider_with_url_is_registered() {
        let mut config = AppConfig {
            default_provider: "acme".into(),
            ..AppConfig::default()
        };
        config.providers.insert(
            "acme".into(),
            ProviderConfig {
                api_key: Some("k".into()),
                api_url: Some("https://llm.acme.test/v1".into()),
                default_model: None,
                timeout_secs: None,
            },
        );
        assert_eq!(build_from_config(&config).default().unwrap().name(), "acme");
    }

    #[test]
    fn well_known_base_urls() {
        assert_eq!(well_known_base_url("openai"), Some("https://api.openai.com/v1"));
        assert!(well_known_base_url("groq").unwrap().contains("groq.com"));
        assert_eq!(well_known_base_url("acme"), None);
    }
}
