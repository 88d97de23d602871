//! Model-based classification: asks the text-generation service for a tier.
//!
//! The prompt constrains the model to answer with exactly one tier marker.
//! The answer is read leniently: the high marker anywhere in the text means
//! `High`, else the medium marker means `Medium`, else the low marker means
//! `Low`. Only an answer with no marker at all gets the configured fallback.

use std::sync::Arc;

use async_trait::async_trait;
use smartmeds_core::classifier::RiskClassifier;
use smartmeds_core::error::ClassifyError;
use smartmeds_core::message::Message;
use smartmeds_core::provider::{Provider, ProviderRequest};
use smartmeds_core::record::{DrugName, RiskTier, TierLabels};
use tracing::{debug, warn};

/// Completion cap for a one-marker answer.
const MAX_ANSWER_TOKENS: u32 = 16;

pub struct ModelBasedClassifier {
    provider: Arc<dyn Provider>,
    model: String,
    labels: TierLabels,
    unrecognized_tier: RiskTier,
}

impl ModelBasedClassifier {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, labels: TierLabels) -> Self {
        Self {
            provider,
            model: model.into(),
            labels,
            unrecognized_tier: RiskTier::Low,
        }
    }

    /// Tier used when the answer contains none of the markers.
    pub fn with_unrecognized_tier(mut self, tier: RiskTier) -> Self {
        self.unrecognized_tier = tier;
        self
    }

    pub fn build_prompt(&self, meds: &[DrugName]) -> Vec<Message> {
        let drugs = meds.iter().map(DrugName::display).collect::<Vec<_>>().join(", ");
        let system = "你是一位臨床藥師，負責長者多重用藥的風險分層。";
        let user = format!(
            "請依據下列用藥清單判斷風險等級。\n\
             只能回覆以下三個標記之一，不得包含任何其他文字：\n\
             {high}：高風險\n\
             {medium}：中風險\n\
             {low}：低風險\n\n\
             目前用藥：{drugs}",
            high = self.labels.high,
            medium = self.labels.medium,
            low = self.labels.low,
        );
        vec![Message::system(system), Message::user(user)]
    }

    /// Read a tier out of free model text. `None` when no marker is present.
    pub fn find_marker(&self, text: &str) -> Option<RiskTier> {
        RiskTier::ASSIGNABLE
            .into_iter()
            .find(|tier| text.contains(self.labels.label(*tier)))
    }

    /// Lenient interpretation: high, then medium, then low. The fallback
    /// tier applies only when no marker is present.
    pub fn interpret(&self, text: &str) -> RiskTier {
        match self.find_marker(text) {
            Some(tier) => tier,
            None => self.unrecognized_tier,
        }
    }
}

#[async_trait]
impl RiskClassifier for ModelBasedClassifier {
    fn name(&self) -> &str {
        "model"
    }

    async fn assess(&self, meds: &[DrugName]) -> Result<RiskTier, ClassifyError> {
        let request = ProviderRequest::new(&self.model, self.build_prompt(meds))
            .with_temperature(0.0)
            .with_max_tokens(MAX_ANSWER_TOKENS);

        let response = self.provider.complete(request).await?;
        let text = response.text();

        if self.find_marker(text).is_none() {
            warn!(
                provider = %self.provider.name(),
                answer = %text,
                fallback = %self.unrecognized_tier,
                "Model answer has no tier marker, using fallback tier"
            );
        }

        let tier = self.interpret(text);
        debug!(model = %response.model, tier = %tier, "Model classified medication list");
        Ok(tier)
    }
}
