//! Text/vision generation seam.

mod gemini;
mod scripted;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

pub use gemini::{select_model, GeminiClient};
pub use scripted::ScriptedGenerator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<ImageAttachment>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: ImageAttachment) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
        }
    }
}

/// A single-attempt call to a generation backend. Implementations must not
/// retry; the caller owns timeouts.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String>;

    /// Human-readable backend/model name for logs.
    fn model_name(&self) -> &str;
}

/// Refuses every request. Stands in when no backend is configured.
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl GenerationService for Unavailable {
    async fn generate(&self, _request: GenerationRequest) -> Result<String> {
        Err(anyhow!("{}", self.reason))
    }

    fn model_name(&self) -> &str {
        "unavailable"
    }
}
