//! Single-case medication-safety advice.
//!
//! Input is validated before any external call. The model's answer is
//! returned verbatim.

use std::sync::Arc;

use smartmeds_config::AppConfig;
use smartmeds_core::advisory::AdvisoryRequest;
use smartmeds_core::error::AdviceError;
use smartmeds_core::message::Message;
use smartmeds_core::provider::{Provider, ProviderRequest};
use tracing::{debug, info};

pub struct AdviceGenerator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl AdviceGenerator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Generator with the advice model, temperature and token cap from config.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, config.advice_model())
            .with_temperature(config.advice.temperature)
            .with_max_tokens(config.default_max_tokens)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn build_prompt(&self, request: &AdvisoryRequest) -> Vec<Message> {
        let system = "你是一位熟悉老年醫學的臨床藥師，提供簡明、實用的用藥安全建議。";
        let user = format!(
            "請針對以下長者個案提供用藥安全建議：\n\
             年齡：{age} 歲\n\
             共病：{conditions}\n\
             目前用藥：{drugs}\n\n\
             請說明：\n\
             1. 需特別留意的藥品與原因\n\
             2. 可能的交互作用或重複用藥\n\
             3. 建議監測項目與照護注意事項",
            age = request.age,
            conditions = request.condition_list(),
            drugs = request.drug_list(),
        );
        vec![Message::system(system), Message::user(user)]
    }

    pub async fn generate(&self, request: &AdvisoryRequest) -> Result<String, AdviceError> {
        request.validate()?;
        let mut provider_request = ProviderRequest::new(&self.model, self.build_prompt(request))
            .with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            provider_request = provider_request.with_max_tokens(max_tokens);
        }

        debug!(
            provider = %self.provider.name(),
            model = %self.model,
            drugs = request.drugs.len(),
            "Requesting medication advice"
        );

        let response = self
            .provider
            .complete(provider_request)
            .await
            .map_err(AdviceError::Generation)?;

        if let Some(usage) = &response.usage {
            info!(tokens = usage.total_tokens, model = %response.model, "Advice generated");
        }
        Ok(response.text().to_string())
    }

    /// Validate raw form input, then generate.
    pub async fn generate_from_parts(&self, drugs: &str, age: &str, conditions: &str) -> Result<String, AdviceError> {
        let request = AdvisoryRequest::parse(drugs, age, conditions)?;
        self.generate(&request).await
    }
}
