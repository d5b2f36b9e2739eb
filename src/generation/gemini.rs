//! Gemini `generateContent` adapter.
//!
//! API key: `GOOGLE_API_KEY` (or `GEMINI_API_KEY`). When no model is
//! configured, the client lists the models available to the key and picks
//! the fastest capable one (a `flash` model, else any `gemini` model).

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::settings::GenerationSettings;

use super::{GenerationRequest, GenerationService};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Inline { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

fn build_request(request: GenerationRequest) -> GenerateContentRequest {
    let mut parts = vec![Part::Text {
        text: request.prompt,
    }];
    if let Some(image) = request.image {
        parts.push(Part::Inline {
            inline_data: InlineData {
                mime_type: image.mime_type,
                data: STANDARD.encode(&image.data),
            },
        });
    }

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        bail!("Gemini returned no text (blocked or empty candidate)");
    }
    Ok(text)
}

/// Picks the preferred model out of those that support `generateContent`.
pub fn select_model(candidates: &[String]) -> Option<&str> {
    candidates
        .iter()
        .find(|name| name.contains("flash"))
        .or_else(|| candidates.iter().find(|name| name.contains("gemini")))
        .map(String::as_str)
}

fn qualified_model(name: &str) -> String {
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{name}")
    }
}

pub struct GeminiClient {
    api_key: String,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String, api_base: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for Gemini")?;
        Ok(Self {
            api_key: api_key.trim().to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: qualified_model(model),
            client,
        })
    }

    /// Builds a client from settings, discovering a model when none is set.
    pub async fn connect(api_key: String, settings: &GenerationSettings) -> Result<Self> {
        let mut client = Self::new(api_key, &settings.api_base, "", settings.timeout())?;
        let model = match settings.model.as_deref() {
            Some(model) => model.to_string(),
            None => {
                let available = client.list_models().await?;
                select_model(&available)
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("no Gemini model supporting generateContent is available"))?
            }
        };
        client.model = qualified_model(&model);
        log_info!("Using generation model {}", client.model);
        Ok(client)
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.api_base);
        let res = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .context("Gemini model listing request failed")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            bail!("Gemini API error {status}: {body}");
        }

        let parsed: ListModelsResponse = res
            .json()
            .await
            .context("Gemini model listing could not be parsed")?;

        Ok(parsed
            .models
            .into_iter()
            .filter(|model| {
                model
                    .supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|model| model.name)
            .collect())
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.api_base, self.model);
        let has_image = request.image.is_some();
        log_debug!(
            "generateContent model={} prompt_chars={} image={}",
            self.model,
            request.prompt.chars().count(),
            has_image
        );

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(request))
            .send()
            .await
            .context("Gemini request failed")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            bail!("Gemini API error {status}: {body}");
        }

        let parsed: GenerateContentResponse = res
            .json()
            .await
            .context("Gemini response could not be parsed")?;
        extract_text(parsed)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
