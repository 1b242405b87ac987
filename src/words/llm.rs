use super::*;
use crate::llm::{GenerateRequest, LlmConfig, LlmManager};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You generate a single, concrete secret word that fits the host's \
    category (or a related, sensible sub-category), and a short vague hint that isn't a giveaway. \
    Optionally, generate a plausible 'fakeWord' that sounds similar or is thematically close \
    (used to help an impostor blend in). Keep it family-friendly.";

const FORMAT_INSTRUCTIONS: &str = "Return strict JSON: {\"word\": string, \"hint\": string, \
    \"fakeWord\": string|null}. If fakeWord isn't requested, set it to null. \
    The 'word' must be a single term. Keep the hint short.";

/// Word source backed by the configured LLM providers
pub struct LlmWordSource {
    manager: LlmManager,
    timeout: Duration,
    max_tokens: u32,
}

impl LlmWordSource {
    pub fn new(manager: LlmManager, config: &LlmConfig) -> Self {
        Self {
            manager,
            timeout: config.default_timeout,
            max_tokens: config.default_max_tokens,
        }
    }

    fn prompt(request: &WordRequest) -> String {
        format!(
            "Category: {}\nOptions: allowMultipleImpostors={}, giveImpostorFakeWord={}\n\n{}",
            request.category,
            request.allow_multiple_impostors,
            request.give_impostor_fake_word,
            FORMAT_INSTRUCTIONS
        )
    }
}

#[async_trait]
impl WordSource for LlmWordSource {
    async fn generate(&self, request: &WordRequest) -> Result<GeneratedContent, WordSourceError> {
        let llm_request = GenerateRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            prompt: Self::prompt(request),
            max_tokens: Some(self.max_tokens),
            timeout: self.timeout,
            json_output: true,
        };

        let response = self.manager.generate(llm_request).await?;
        tracing::info!(
            provider = %response.metadata.provider,
            latency_ms = response.metadata.latency_ms,
            category = %request.category,
            "Generated round content"
        );

        Ok(content_from_model_output(&response.text, request))
    }

    fn name(&self) -> &str {
        "llm"
    }
}
