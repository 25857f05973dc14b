use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::StudioConfig,
    error::{Result, StudioError},
    models::{ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse},
};

/// One raw `generateContent` round trip, without retry.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate_content(
        &self,
        model_id: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

pub struct HttpGenerationBackend {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpGenerationBackend {
    pub fn new(config: &StudioConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| StudioError::ConfigError("Gemini API key is required".into()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| StudioError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url().to_string(),
        })
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model_id)
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    async fn generate_content(
        &self,
        model_id: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(self.endpoint(model_id))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                StudioError::service(
                    e.status().map(|s| s.as_u16()),
                    format!("Gemini request failed: {}", e),
                )
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StudioError::ResponseError(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .ok()
                .filter(|message| !message.is_empty())
                .unwrap_or(body);
            log::error!("Gemini returned {}: {}", status, message);
            return Err(StudioError::service(Some(status.as_u16()), message));
        }

        serde_json::from_str(&body).map_err(|e| {
            StudioError::ResponseError(format!("Unexpected generateContent payload: {}", e))
        })
    }
}
