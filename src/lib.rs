//! Studiogen: image generation plumbing for an AI photo studio.
//!
//! ```no_run
//! use studiogen::{GenerationConfig, ImageGenerationRequest, StudioClient, StudioConfig};
//!
//! # async fn run() -> studiogen::Result<()> {
//! let client = StudioClient::new(StudioConfig::from_env())?;
//! let config = GenerationConfig {
//!     preserve_product_label: true,
//!     preserve_face: true,
//!     ..GenerationConfig::default()
//! };
//! let request = ImageGenerationRequest::new("data:image/jpeg;base64,/9j/4AAQ...", config)
//!     .with_context("beach sunset");
//! let image = client.image().generate_variant(request).await?;
//! image.save_to("variant.png")?;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod prompt;
pub mod retry;
pub mod session;
pub mod variants;

pub use config::StudioConfig;
pub use error::{Result, StudioError};
pub use gemini::{GenerationBackend, ImageClient, SourceFetcher, StudioClient};
pub use models::*;
pub use prompt::{compose_instruction, PromptComposer};
pub use retry::{retry_with_policy, Backoff, RetryPolicy};
pub use session::{RealtimeChannel, SessionEvent, SessionState, VoiceCommand, VoiceSession};
pub use variants::{generate_ab, VariantComparison, VariantSlot};
