use super::*;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use std::time::Instant;

fn api_error(e: impl std::fmt::Display) -> LlmError {
    LlmError::ApiError(e.to_string())
}

/// OpenAI provider implementation
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with the given API key and model
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self { client, model }
    }

    /// Chat request with the system prompt first, optionally in JSON mode
    fn chat_request(&self, request: &GenerateRequest) -> LlmResult<CreateChatCompletionRequest> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.as_str())
            .build()
            .map_err(api_error)?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt.as_str())
            .build()
            .map_err(api_error)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages([system.into(), user.into()]);
        if request.json_output {
            builder.response_format(ResponseFormat::JsonObject);
        }
        if let Some(max_tokens) = request.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }

        builder.build().map_err(api_error)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        let start = Instant::now();
        let chat_request = self.chat_request(&request)?;

        let response =
            tokio::time::timeout(request.timeout, self.client.chat().create(chat_request))
                .await
                .map_err(|_| LlmError::Timeout(request.timeout))?
                .map_err(api_error)?;

        let Some(text) = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
        else {
            return Err(LlmError::ParseError("Empty completion".to_string()));
        };

        Ok(GenerateResponse {
            text: text.trim().to_string(),
            metadata: ResponseMetadata {
                provider: self.name().to_string(),
                model: self.model.clone(),
                tokens_used: response.usage.map(|u| u.total_tokens),
                latency_ms: start.elapsed().as_millis() as u64,
            },
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json_output: bool, max_tokens: Option<u32>) -> GenerateRequest {
        GenerateRequest {
            system_prompt: "system".to_string(),
            prompt: "user".to_string(),
            max_tokens,
            timeout: Duration::from_secs(5),
            json_output,
        }
    }

    #[test]
    fn test_chat_request_json_mode() {
        let provider = OpenAiProvider::new("sk-test".to_string(), "gpt-4o-mini".to_string());

        let chat = provider.chat_request(&request(true, Some(200))).unwrap();
        assert_eq!(chat.model, "gpt-4o-mini");
        assert_eq!(chat.messages.len(), 2);
        assert!(matches!(chat.response_format, Some(ResponseFormat::JsonObject)));
        assert_eq!(chat.max_completion_tokens, Some(200));

        let chat = provider.chat_request(&request(false, None)).unwrap();
        assert!(chat.response_format.is_none());
        assert!(chat.max_completion_tokens.is_none());
    }

    #[tokio::test]
    #[ignore] // Only run with actual API key
    async fn test_openai_generate_json() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let provider = OpenAiProvider::new(api_key, "gpt-4o-mini".to_string());

        let request = GenerateRequest {
            system_prompt: "Reply with a JSON object.".to_string(),
            prompt: r#"Return {"word": "<any fruit>"}"#.to_string(),
            max_tokens: Some(50),
            timeout: Duration::from_secs(30),
            json_output: true,
        };

        let response = provider.generate(request).await.unwrap();

        assert!(response.text.starts_with('{'));
        assert_eq!(response.metadata.provider, "openai");
        println!("Generated text: {}", response.text);
    }
}
