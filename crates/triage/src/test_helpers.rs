//! Shared test helpers for triage tests.

use smartmeds_core::error::ProviderError;
use smartmeds_core::message::Message;
use smartmeds_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A mock provider that answers by matching the last prompt message.
///
/// Rules are checked in order; the first whose needle appears in the prompt
/// (case-insensitively) supplies the reply. Unmatched prompts get the
/// fallback. Matching on content keeps replies stable when records are
/// classified concurrently.
pub struct ScriptedProvider {
    rules: Vec<(String, Result<String, ProviderError>)>,
    fallback: Result<String, ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    /// Reply with `text` to every prompt.
    pub fn always(text: &str) -> Self {
        Self {
            rules: Vec::new(),
            fallback: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with `err`.
    pub fn failing(err: ProviderError) -> Self {
        Self {
            rules: Vec::new(),
            fallback: Err(err),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `text` when the prompt mentions `needle`.
    pub fn when(mut self, needle: &str, text: &str) -> Self {
        self.rules.push((needle.to_lowercase(), Ok(text.to_string())));
        self
    }

    /// Fail with `err` when the prompt mentions `needle`.
    pub fn when_failing(mut self, needle: &str, err: ProviderError) -> Self {
        self.rules.push((needle.to_lowercase(), Err(err)));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.to_lowercase())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request);

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.fallback.clone());

        reply.map(|text| make_text_response(&text))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
