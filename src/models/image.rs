use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};
use crate::models::GenerationConfig;

pub const OUTPUT_MIME_TYPE: &str = "image/png";
pub const SOURCE_MIME_TYPE: &str = "image/jpeg";

/// Source image as handed over by the capture layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    Url(String),
    DataUri { mime_type: String, payload: String },
    Base64(String),
}

impl ImageInput {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if has_scheme(raw, "http://") || has_scheme(raw, "https://") {
            return ImageInput::Url(raw.to_string());
        }
        if let Some((mime_type, payload)) = split_data_uri(raw) {
            return ImageInput::DataUri {
                mime_type: mime_type.to_string(),
                payload: payload.to_string(),
            };
        }
        ImageInput::Base64(raw.to_string())
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        ImageInput::Base64(STANDARD.encode(bytes))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ImageInput::Url(_))
    }

    /// Payload for inputs that need no network access; `None` for URLs.
    pub fn local_payload(&self) -> Option<&str> {
        match self {
            ImageInput::Url(_) => None,
            ImageInput::DataUri { payload, .. } => Some(payload),
            ImageInput::Base64(payload) => Some(payload),
        }
    }
}

impl From<&str> for ImageInput {
    fn from(raw: &str) -> Self {
        ImageInput::parse(raw)
    }
}

impl From<String> for ImageInput {
    fn from(raw: String) -> Self {
        ImageInput::parse(&raw)
    }
}

fn has_scheme(raw: &str, scheme: &str) -> bool {
    raw.get(..scheme.len())
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case(scheme))
}

/// Splits `data:<mime>;base64,<payload>` into its mime type and payload.
pub fn split_data_uri(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64").unwrap_or(header);
    Some((mime_type, payload))
}

pub fn to_data_uri(mime_type: &str, payload: &str) -> String {
    format!("data:{};base64,{}", mime_type, payload)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "9:16")]
    Story,
    #[serde(rename = "16:9")]
    Widescreen,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Story => "9:16",
            AspectRatio::Widescreen => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionTier {
    #[serde(rename = "1K")]
    Standard,
    #[serde(rename = "2K")]
    High,
    #[serde(rename = "4K")]
    Ultra,
}

impl ResolutionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::Standard => "1K",
            ResolutionTier::High => "2K",
            ResolutionTier::Ultra => "4K",
        }
    }
}

/// How a call site treats a successful response that carries no image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyResultPolicy {
    #[default]
    Fail,
    ReturnSource,
}

#[derive(Debug, Clone)]
pub struct ImageGenerationRequest {
    pub source: ImageInput,
    pub config: GenerationConfig,
    pub context: String,
    pub aspect_ratio: Option<AspectRatio>,
    pub resolution: Option<ResolutionTier>,
    pub model_id: Option<String>,
    pub label: Option<String>,
}

impl ImageGenerationRequest {
    pub fn new(source: impl Into<ImageInput>, config: GenerationConfig) -> Self {
        Self {
            source: source.into(),
            config,
            context: String::new(),
            aspect_ratio: None,
            resolution: None,
            model_id: None,
            label: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(aspect_ratio);
        self
    }

    pub fn with_resolution(mut self, resolution: ResolutionTier) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub id: String,
    pub data_uri: String,
    pub model: String,
    pub label: Option<String>,
    /// True when the source image was handed back because no image came out.
    pub is_source_fallback: bool,
    pub created_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn payload(&self) -> &str {
        split_data_uri(&self.data_uri)
            .map(|(_, payload)| payload)
            .unwrap_or(&self.data_uri)
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.payload())
            .map_err(|e| StudioError::InvalidImage(format!("Result is not valid base64: {}", e)))
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.decode_bytes()?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| {
            StudioError::RequestError(format!(
                "Failed to write {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url() {
        assert_eq!(
            ImageInput::parse("https://cdn.example.com/shoe.jpg"),
            ImageInput::Url("https://cdn.example.com/shoe.jpg".into())
        );
        assert!(ImageInput::parse("http://localhost/a.png").is_remote());
    }

    #[test]
    fn test_parse_url_scheme_ignores_case() {
        assert_eq!(
            ImageInput::parse("HTTPS://CDN.example.com/a.jpg"),
            ImageInput::Url("HTTPS://CDN.example.com/a.jpg".into())
        );
        assert!(ImageInput::parse("Http://localhost/a.png").is_remote());
        assert!(!ImageInput::parse("http").is_remote());
    }

    #[test]
    fn test_parse_data_uri() {
        let input = ImageInput::parse("data:image/jpeg;base64,ABC123");
        assert_eq!(
            input,
            ImageInput::DataUri {
                mime_type: "image/jpeg".into(),
                payload: "ABC123".into()
            }
        );
        assert_eq!(input.local_payload(), Some("ABC123"));
    }

    #[test]
    fn test_parse_raw_base64() {
        let input = ImageInput::parse("iVBORw0KGgo=");
        assert_eq!(input, ImageInput::Base64("iVBORw0KGgo=".into()));
        assert_eq!(input.local_payload(), Some("iVBORw0KGgo="));
    }

    #[test]
    fn test_data_uri_round_trip() {
        let payload = STANDARD.encode(b"\xff\xd8\xff\xe0 jpeg bytes");
        let uri = to_data_uri(SOURCE_MIME_TYPE, &payload);
        let parsed = ImageInput::parse(&uri);
        assert_eq!(parsed.local_payload(), Some(payload.as_str()));
    }

    #[test]
    fn test_result_decode_and_save() {
        let result = GenerationResult {
            id: "r1".into(),
            data_uri: to_data_uri(OUTPUT_MIME_TYPE, &STANDARD.encode(b"png!")),
            model: "m".into(),
            label: None,
            is_source_fallback: false,
            created_at: Utc::now(),
        };
        assert_eq!(result.decode_bytes().unwrap(), b"png!");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        result.save_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png!");
    }

    #[test]
    fn test_aspect_ratio_serializes_as_ratio() {
        assert_eq!(
            serde_json::to_string(&AspectRatio::Widescreen).unwrap(),
            "\"16:9\""
        );
        assert_eq!(serde_json::to_string(&ResolutionTier::High).unwrap(), "\"2K\"");
    }
}
