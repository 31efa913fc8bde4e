use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::services::ImagePart;
use crate::config::GeminiConfig;

/// A multimodal model that turns a prompt plus one image into free text.
#[async_trait]
pub trait NutritionModel: Send + Sync {
    async fn generate(&self, prompt: &str, image: &ImagePart) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

fn build_request(prompt: &str, image: &ImagePart) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text {
                    text: prompt.to_string(),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type.clone(),
                        data: general_purpose::STANDARD.encode(&image.data),
                    },
                },
            ],
        }],
    }
}

/// Text of the first candidate; later candidates are alternatives, not parts.
fn first_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
}

#[async_trait]
impl NutritionModel for GeminiClient {
    async fn generate(&self, prompt: &str, image: &ImagePart) -> anyhow::Result<String> {
        let request = build_request(prompt, image);

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            // reqwest errors embed the url, which carries the api key
            .map_err(|e| e.without_url())
            .context("send generateContent request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, model = %self.model, "gemini returned an error");
            anyhow::bail!("model returned {}: {}", status, body);
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| e.without_url())
            .context("decode generateContent response")?;

        first_text(parsed).context("no text in model response")
    }
}
