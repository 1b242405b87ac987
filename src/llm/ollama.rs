use super::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Ollama provider implementation
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the given base URL and model
    pub fn new(base_url: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        let start = Instant::now();

        let ollama_request = OllamaGenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            system: &request.system_prompt,
            stream: false,
            format: request.json_output.then_some("json"),
            options: request.max_tokens.map(|num_predict| OllamaOptions {
                num_predict: Some(num_predict),
            }),
        };

        let url = format!("{}/api/generate", self.base_url);

        // Execute with timeout
        let response = tokio::time::timeout(
            request.timeout,
            self.client.post(&url).json(&ollama_request).send(),
        )
        .await
        .map_err(|_| LlmError::Timeout(request.timeout))?
        .map_err(|e| LlmError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::ApiError(format!(
                "Ollama API returned status: {}",
                response.status()
            )));
        }

        let ollama_response: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let latency_ms = start.elapsed().as_millis() as u64;

        Ok(GenerateResponse {
            text: ollama_response.response.trim().to_string(),
            metadata: ResponseMetadata {
                provider: "ollama".to_string(),
                model: self.model.clone(),
                tokens_used: ollama_response.eval_count,
                latency_ms,
            },
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
