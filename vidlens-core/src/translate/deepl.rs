use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::config::TranslationSection;

use super::error::TranslationError;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates one string into `target_code`.
    async fn translate(&self, text: &str, target_code: &str) -> Result<String, TranslationError>;
}

pub struct DeeplTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
    max_attempts: usize,
    retry_delay: Duration,
}

#[derive(Debug, Serialize)]
struct DeeplRequest<'a> {
    text: [&'a str; 1],
    target_lang: String,
}

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    #[serde(default)]
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    text: String,
}

impl DeeplTranslator {
    pub fn new(config: &TranslationSection, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: api_key.into(),
            timeout: config.timeout(),
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    async fn request(&self, text: &str, target_code: &str) -> Result<String, TranslationError> {
        let body = DeeplRequest {
            text: [text],
            target_lang: target_code.to_uppercase(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TranslationError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: DeeplResponse = serde_json::from_str(&body)
            .map_err(|err| TranslationError::MalformedResponse(err.to_string()))?;
        parsed
            .translations
            .into_iter()
            .next()
            .map(|translation| translation.text)
            .ok_or_else(|| TranslationError::MalformedResponse("no translations returned".into()))
    }

    async fn attempt(&self, text: &str, target_code: &str) -> Result<String, TranslationError> {
        match timeout(self.timeout, self.request(text, target_code)).await {
            Ok(result) => result,
            Err(_) => Err(TranslationError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl Translator for DeeplTranslator {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String, TranslationError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(text, target_code).await {
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    warn!(target: "translate", attempt, wait = ?self.retry_delay, error = %err, "retrying translation");
                    if !self.retry_delay.is_zero() {
                        sleep(self.retry_delay).await;
                    }
                }
                result => return result,
            }
        }
    }
}
