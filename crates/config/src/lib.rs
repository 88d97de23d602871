//! Configuration loading, validation, and management for SmartMeds.
//!
//! Loads configuration from `~/.smartmeds/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use smartmeds_core::{RiskList, RiskTier, TableSchema, TierLabels};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The root configuration structure.
///
/// Maps directly to `~/.smartmeds/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the text-generation service (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default text-generation provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Record store (spreadsheet) configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Which columns hold the medication list and the risk tier
    #[serde(default)]
    pub columns: ColumnsConfig,

    /// Text written to the sheet for each tier
    #[serde(default)]
    pub labels: TierLabels,

    /// Drug lists used by the rule-based classifier
    #[serde(default)]
    pub risk_lists: RiskListsConfig,

    /// Classification strategy
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Advice generation settings
    #[serde(default)]
    pub advice: AdviceConfig,

    /// Batch synchronization settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_tokens() -> u32 {
    1024
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("store", &self.store)
            .field("columns", &self.columns)
            .field("labels", &self.labels)
            .field("risk_lists", &self.risk_lists)
            .field("classifier", &self.classifier)
            .field("advice", &self.advice)
            .field("sync", &self.sync)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("worksheet", &self.worksheet)
            .field("access_token", &redact(&self.access_token))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sheets" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,

    #[serde(default = "default_worksheet")]
    pub worksheet: String,

    /// OAuth bearer token for the Sheets API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default = "default_sheets_url")]
    pub api_url: String,

    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_store_backend() -> String {
    "sheets".into()
}
fn default_worksheet() -> String {
    "Sheet1".into()
}
fn default_sheets_url() -> String {
    "https://sheets.googleapis.com/v4".into()
}
fn default_store_timeout() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            spreadsheet_id: None,
            worksheet: default_worksheet(),
            access_token: None,
            api_url: default_sheets_url(),
            timeout_secs: default_store_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default = "default_medication_column")]
    pub medication: String,

    #[serde(default = "default_risk_column")]
    pub risk: String,
}

fn default_medication_column() -> String {
    "目前用藥".into()
}
fn default_risk_column() -> String {
    "藥師風險判讀".into()
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            medication: default_medication_column(),
            risk: default_risk_column(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskListsConfig {
    #[serde(default = "default_high_risk")]
    pub high: Vec<String>,

    #[serde(default = "default_medium_risk")]
    pub medium: Vec<String>,
}

fn default_high_risk() -> Vec<String> {
    vec!["Warfarin".into(), "Digoxin".into(), "Diazepam".into(), "Insulin".into()]
}
fn default_medium_risk() -> Vec<String> {
    vec!["Aspirin".into(), "Metformin".into(), "Furosemide".into()]
}

impl Default for RiskListsConfig {
    fn default() -> Self {
        Self {
            high: default_high_risk(),
            medium: default_medium_risk(),
        }
    }
}

/// Which classification strategy the synchronizer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Static drug-list lookup
    #[default]
    Rule,
    /// Text-generation model call
    Model,
}

impl FromStr for ClassifierKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rule" | "rules" | "rule_based" => Ok(ClassifierKind::Rule),
            "model" | "llm" | "model_based" => Ok(ClassifierKind::Model),
            other => Err(ConfigError::ValidationError(format!(
                "unknown classifier '{other}' (expected 'rule' or 'model')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub kind: ClassifierKind,

    /// Model override for classification (defaults to `default_model`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Tier assigned when the model's answer contains no known marker
    #[serde(default = "default_unrecognized_tier")]
    pub unrecognized_tier: RiskTier,
}

fn default_unrecognized_tier() -> RiskTier {
    RiskTier::Low
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::default(),
            model: None,
            unrecognized_tier: default_unrecognized_tier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdviceConfig {
    /// Model override for advice (defaults to `default_model`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_advice_temperature")]
    pub temperature: f32,
}

fn default_advice_temperature() -> f32 {
    0.7
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_advice_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Records classified concurrently during a sync
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    4
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.smartmeds/config.toml).
    ///
    /// Environment variables override the file:
    /// - `SMARTMEDS_API_KEY` (highest priority), `OPENAI_API_KEY`, `OPENROUTER_API_KEY`
    /// - `SMARTMEDS_PROVIDER`, `SMARTMEDS_MODEL`, `SMARTMEDS_CLASSIFIER`
    /// - `SMARTMEDS_SPREADSHEET_ID`, `SMARTMEDS_SHEETS_TOKEN`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(key) = lookup("SMARTMEDS_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = lookup("OPENAI_API_KEY").or_else(|| lookup("OPENROUTER_API_KEY"));
        }

        if let Some(provider) = lookup("SMARTMEDS_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("SMARTMEDS_MODEL") {
            self.default_model = model;
        }

        if let Some(kind) = lookup("SMARTMEDS_CLASSIFIER") {
            self.classifier.kind = kind.parse()?;
        }

        if let Some(id) = lookup("SMARTMEDS_SPREADSHEET_ID") {
            self.store.spreadsheet_id = Some(id);
        }

        if let Some(token) = lookup("SMARTMEDS_SHEETS_TOKEN") {
            self.store.access_token = Some(token);
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".smartmeds")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.advice.temperature) {
            return Err(ConfigError::ValidationError(
                "advice.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.sync.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "sync.concurrency must be at least 1".into(),
            ));
        }

        if !matches!(self.store.backend.as_str(), "sheets" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "store.backend must be 'sheets' or 'memory', got '{}'",
                self.store.backend
            )));
        }

        let medication = self.columns.medication.trim();
        let risk = self.columns.risk.trim();
        if medication.is_empty() || risk.is_empty() {
            return Err(ConfigError::ValidationError("column names must not be empty".into()));
        }
        if medication == risk {
            return Err(ConfigError::ValidationError(
                "columns.medication and columns.risk must differ".into(),
            ));
        }

        self.validate_labels()
    }

    /// Labels double as the markers searched for in model answers, checked
    /// high first. A label contained in a lower-priority label would shadow it.
    fn validate_labels(&self) -> Result<(), ConfigError> {
        let ordered = [
            ("high", self.labels.high.as_str()),
            ("medium", self.labels.medium.as_str()),
            ("low", self.labels.low.as_str()),
        ];

        for (name, label) in &ordered {
            if label.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("labels.{name} must not be empty")));
            }
            if label.trim() != *label {
                return Err(ConfigError::ValidationError(format!(
                    "labels.{name} ('{label}') must not have leading or trailing whitespace"
                )));
            }
        }

        for (i, (name, label)) in ordered.iter().enumerate() {
            for (lower_name, lower_label) in &ordered[i + 1..] {
                if lower_label.contains(label) {
                    return Err(ConfigError::ValidationError(format!(
                        "labels.{name} ('{label}') must not appear inside labels.{lower_name} ('{lower_label}')"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Column names and tier labels for the record store.
    pub fn schema(&self) -> TableSchema {
        TableSchema {
            medication_column: self.columns.medication.trim().to_string(),
            risk_column: self.columns.risk.trim().to_string(),
            labels: self.labels.clone(),
        }
    }

    /// Rule-based risk lists, highest priority first.
    pub fn risk_lists(&self) -> Vec<RiskList> {
        vec![
            RiskList::new("high", RiskTier::High, self.risk_lists.high.iter().map(String::as_str)),
            RiskList::new("medium", RiskTier::Medium, self.risk_lists.medium.iter().map(String::as_str)),
        ]
    }

    /// Model of the default provider: its own `default_model`, else the global one.
    fn provider_model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.as_deref())
            .unwrap_or(&self.default_model)
    }

    /// Model used for classification.
    pub fn classifier_model(&self) -> &str {
        self.classifier.model.as_deref().unwrap_or_else(|| self.provider_model())
    }

    /// Model used for advice.
    pub fn advice_model(&self) -> &str {
        self.advice.model.as_deref().unwrap_or_else(|| self.provider_model())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_max_tokens: default_max_tokens(),
            store: StoreConfig::default(),
            columns: ColumnsConfig::default(),
            labels: TierLabels::default(),
            risk_lists: RiskListsConfig::default(),
            classifier: ClassifierConfig::default(),
            advice: AdviceConfig::default(),
            sync: SyncConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.classifier.kind, ClassifierKind::Rule);
        assert_eq!(config.classifier.unrecognized_tier, RiskTier::Low);
        assert_eq!(config.columns.medication, "目前用藥");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.risk_lists.high, config.risk_lists.high);
        assert_eq!(parsed.labels, config.labels);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.advice.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let mut config = AppConfig::default();
        config.sync.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn shadowing_labels_rejected() {
        let mut config = AppConfig::default();
        config.labels.high = "LOW".into();
        config.labels.low = "LOW RISK".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("labels.high"));
    }

    #[test]
    fn padded_label_rejected() {
        let mut config = AppConfig::default();
        config.labels.high = "紅 ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("labels.high"));
        assert!(err.to_string().contains("whitespace"));
    }

    #[test]
    fn same_column_for_both_fields_rejected() {
        let mut config = AppConfig::default();
        config.columns.risk = config.columns.medication.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "gpt-4o"

[classifier]
kind = "model"
unrecognized_tier = "medium"

[risk_lists]
high = ["Warfarin"]

[labels]
high = "HIGH"
medium = "MEDIUM"
low = "LOW"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.classifier.kind, ClassifierKind::Model);
        assert_eq!(config.classifier.unrecognized_tier, RiskTier::Medium);
        assert_eq!(config.risk_lists.high, vec!["Warfarin"]);
        // unspecified list keeps its default
        assert_eq!(config.risk_lists.medium.len(), 3);
        assert_eq!(config.schema().labels.high, "HIGH");
    }

    #[test]
    fn model_resolution_order() {
        let mut config = AppConfig::default();
        assert_eq!(config.classifier_model(), "gpt-4o-mini");

        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: None,
                api_url: None,
                default_model: Some("gpt-4o".into()),
                timeout_secs: None,
            },
        );
        assert_eq!(config.classifier_model(), "gpt-4o");
        assert_eq!(config.advice_model(), "gpt-4o");

        config.classifier.model = Some("gpt-4.1-nano".into());
        assert_eq!(config.classifier_model(), "gpt-4.1-nano");
        assert_eq!(config.advice_model(), "gpt-4o");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "classifier = [").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_take_priority() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config
            .apply_env(env(&[
                ("SMARTMEDS_API_KEY", "from-env"),
                ("SMARTMEDS_CLASSIFIER", "model"),
                ("SMARTMEDS_SHEETS_TOKEN", "ya29.token"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.classifier.kind, ClassifierKind::Model);
        assert_eq!(config.store.access_token.as_deref(), Some("ya29.token"));
    }

    #[test]
    fn vendor_key_only_fills_missing_key() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));

        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(env(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn unknown_classifier_env_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("SMARTMEDS_CLASSIFIER", "oracle")])).is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        config.store.access_token = Some("ya29.secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("ya29.secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn risk_lists_are_ordered_high_first() {
        let lists = AppConfig::default().risk_lists();
        assert_eq!(lists[0].tier, RiskTier::High);
        assert_eq!(lists[1].tier, RiskTier::Medium);
        assert_eq!(lists[0].len(), 4);
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("Warfarin"));
    }
}
