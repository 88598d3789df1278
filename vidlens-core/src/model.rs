use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

use crate::config::ModelSection;
use crate::encode::EncodedPayload;

/// Bumped whenever the requested JSON shape changes.
pub const ANALYSIS_PROMPT_VERSION: u32 = 2;

pub const ANALYSIS_PROMPT: &str = r#"Analyze this video and respond with ONLY a JSON object, no prose, using exactly this shape:
{
  "summary": "A short summary of the video",
  "setting": "Where the video takes place",
  "mood": "The overall mood",
  "emotions": ["Each emotion expressed in the video"],
  "people": "Who appears in the video and what they do",
  "topic": "The main topic",
  "viralSuggestions": ["Short social media posts that could make this video go viral"],
  "titleSuggestions": ["Catchy titles for the video"],
  "keyMoments": [
    {"timestamp": "m:ss", "description": "What happens at this moment"}
  ]
}
List keyMoments in chronological order. Omit a field if it does not apply."#;

#[derive(Debug, Error)]
pub enum ModelRequestError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("provider returned no text")]
    EmptyResponse,
    #[error("model request timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait AnalysisModel: Send + Sync {
    /// Sends the payload with `prompt` and returns the model's raw text.
    async fn generate(
        &self,
        payload: &EncodedPayload,
        prompt: &str,
    ) -> Result<String, ModelRequestError>;
}

pub struct GeminiModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiModel {
    pub fn new(config: &ModelSection, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            timeout: config.timeout(),
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    async fn request(
        &self,
        payload: &EncodedPayload,
        prompt: &str,
    ) -> Result<String, ModelRequestError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: payload.mime_type,
                            data: &payload.data,
                        },
                    },
                    Part::Text { text: prompt },
                ],
            }],
        };
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelRequestError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        let parsed = response.json::<GenerateContentResponse>().await?;
        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(ModelRequestError::EmptyResponse);
        }
        debug!(target: "model", model = %self.model, chars = text.len(), "model responded");
        Ok(text)
    }
}

#[async_trait]
impl AnalysisModel for GeminiModel {
    async fn generate(
        &self,
        payload: &EncodedPayload,
        prompt: &str,
    ) -> Result<String, ModelRequestError> {
        match timeout(self.timeout, self.request(payload, prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ModelRequestError::Timeout(self.timeout)),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
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
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
