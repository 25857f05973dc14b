pub mod backend;
pub mod image_client;
pub mod source;

use crate::{
    config::StudioConfig,
    error::Result,
    models::ImageGenerationRequest,
    variants::{self, VariantComparison},
};
use std::sync::Arc;

pub use backend::{GenerationBackend, HttpGenerationBackend};
pub use image_client::ImageClient;
pub use source::{normalize_source, HttpSourceFetcher, SourceFetcher};

#[derive(Clone)]
pub struct StudioClient {
    image_client: ImageClient,
}

impl StudioClient {
    pub fn new(config: StudioConfig) -> Result<Self> {
        let backend = HttpGenerationBackend::new(&config)?;
        Ok(Self::with_backend(
            &config,
            Arc::new(backend),
            Arc::new(HttpSourceFetcher::default()),
        ))
    }

    /// Builds a client around custom transport, e.g. a proxy or a test double.
    pub fn with_backend(
        config: &StudioConfig,
        backend: Arc<dyn GenerationBackend>,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> Self {
        Self {
            image_client: ImageClient::new(backend, fetcher, config.retry.clone(), config.model()),
        }
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    /// Generates two variants side by side. See [`variants::generate_ab`].
    pub async fn compare(
        &self,
        requests: [ImageGenerationRequest; 2],
    ) -> VariantComparison {
        variants::generate_ab(&self.image_client, requests).await
    }
}
