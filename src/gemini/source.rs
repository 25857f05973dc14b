use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;

use crate::{
    error::{Result, StudioError},
    models::ImageInput,
};

/// Loads remote source images.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Clone, Default)]
pub struct HttpSourceFetcher {
    client: Client,
}

impl HttpSourceFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_error = |reason: String| StudioError::SourceFetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_error(format!("server answered {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        if bytes.is_empty() {
            return Err(fetch_error("empty body".into()));
        }
        Ok(bytes.to_vec())
    }
}

/// Turns any accepted input encoding into a bare base64 payload.
pub async fn normalize_source(input: &ImageInput, fetcher: &dyn SourceFetcher) -> Result<String> {
    match input {
        ImageInput::Url(url) => {
            log::debug!("Fetching source image from {}", url);
            let bytes = fetcher.fetch(url).await?;
            Ok(STANDARD.encode(bytes))
        }
        ImageInput::DataUri { payload, .. } | ImageInput::Base64(payload) => {
            if payload.is_empty() {
                return Err(StudioError::InvalidImage("Source image is empty".into()));
            }
            Ok(payload.clone())
        }
    }
}
