use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{Result, StudioError},
    gemini::{
        backend::GenerationBackend,
        source::{normalize_source, SourceFetcher},
    },
    logger,
    models::{
        to_data_uri, Content, EmptyResultPolicy, GeminiGenerationConfig, GenerateContentRequest,
        GenerationResult, ImageConfig, ImageExtraction, ImageGenerationRequest, ImageInput,
        InlineData, Part,
        OUTPUT_MIME_TYPE, SOURCE_MIME_TYPE,
    },
    prompt::PromptComposer,
    retry::{retry_with_policy, RetryPolicy},
};

#[derive(Clone)]
pub struct ImageClient {
    backend: Arc<dyn GenerationBackend>,
    fetcher: Arc<dyn SourceFetcher>,
    retry: RetryPolicy,
    default_model: String,
}

impl ImageClient {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        fetcher: Arc<dyn SourceFetcher>,
        retry: RetryPolicy,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            fetcher,
            retry,
            default_model: default_model.into(),
        }
    }

    /// Variant path: a response without an image is an error.
    pub async fn generate_variant(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<GenerationResult> {
        self.generate(request, &PromptComposer::new(), EmptyResultPolicy::Fail)
            .await
    }

    /// Marketing path: a response without an image hands back the source.
    pub async fn generate_marketing_image(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<GenerationResult> {
        self.generate(
            request,
            &PromptComposer::marketing(),
            EmptyResultPolicy::ReturnSource,
        )
        .await
    }

    pub async fn generate(
        &self,
        request: ImageGenerationRequest,
        composer: &PromptComposer,
        on_empty: EmptyResultPolicy,
    ) -> Result<GenerationResult> {
        let model_id = request
            .model_id
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let source = normalize_source(&request.source, self.fetcher.as_ref()).await?;
        let instruction = composer.compose(&request.config, &request.context);
        let payload = build_payload(&request, instruction, source.clone());

        log::info!("Generating image with model: {}", model_id);
        log::debug!("Generation flags: {:?}", request.config);

        let timer = logger::timer("image generation");
        let response = retry_with_policy(&self.retry, || {
            self.backend.generate_content(&model_id, &payload)
        })
        .await;
        timer.finish(&response);
        let response = response?;

        let (data_uri, is_source_fallback) = match response.extract_image() {
            ImageExtraction::Found { data, .. } => (to_data_uri(OUTPUT_MIME_TYPE, &data), false),
            ImageExtraction::NotFound => {
                if let Some(reason) = response
                    .prompt_feedback
                    .as_ref()
                    .and_then(|feedback| feedback.block_reason.as_deref())
                {
                    log::warn!("Prompt was blocked: {}", reason);
                }
                if let Some(text) = response.text() {
                    log::warn!("Model answered with text instead of an image: {}", text);
                }
                match on_empty {
                    EmptyResultPolicy::Fail => return Err(StudioError::EmptyResult),
                    EmptyResultPolicy::ReturnSource => {
                        log::warn!("No image generated, returning the source image");
                        let mime_type = match &request.source {
                            ImageInput::DataUri { mime_type, .. } => mime_type.as_str(),
                            _ => SOURCE_MIME_TYPE,
                        };
                        (to_data_uri(mime_type, &source), true)
                    }
                }
            }
        };

        Ok(GenerationResult {
            id: Uuid::new_v4().to_string(),
            data_uri,
            model: model_id,
            label: request.label,
            is_source_fallback,
            created_at: Utc::now(),
        })
    }
}

fn build_payload(
    request: &ImageGenerationRequest,
    instruction: String,
    source: String,
) -> GenerateContentRequest {
    let image_config = if request.aspect_ratio.is_some() || request.resolution.is_some() {
        Some(ImageConfig {
            aspect_ratio: request.aspect_ratio.map(|ratio| ratio.as_str().to_string()),
            image_size: request.resolution.map(|tier| tier.as_str().to_string()),
        })
    } else {
        None
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part::Text { text: instruction },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: SOURCE_MIME_TYPE.to_string(),
                        data: source,
                    },
                },
            ],
        }],
        generation_config: Some(GeminiGenerationConfig {
            response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
            image_config,
        }),
    }
}
