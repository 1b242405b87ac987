use super::*;
use std::time::Duration;

/// Word source that calls another server's `POST /api/generate`
pub struct HttpWordSource {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpWordSource {
    /// `base_url` is the server root, e.g. `http://localhost:3001`
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl WordSource for HttpWordSource {
    async fn generate(&self, request: &WordRequest) -> Result<GeneratedContent, WordSourceError> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(WordSourceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let content: GeneratedContent = response.json().await?;
        Ok(content)
    }

    fn name(&self) -> &str {
        "http"
    }
}
