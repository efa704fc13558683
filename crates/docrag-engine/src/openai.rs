//! OpenAI-compatible chat-completion client over the blocking reqwest
//! API. Any server speaking the `/chat/completions` protocol works by
//! pointing `base_url` at it.

use anyhow::{anyhow, Result};
use docrag_core::error::Error;
use docrag_core::traits::GenerationProvider;
use docrag_core::types::ChatMessage;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct OpenAiChat {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiChat {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, api_key: api_key.into(), base_url: base_url.into() })
    }

    /// Build a client from `OPENAI_API_KEY` (required) and
    /// `OPENAI_BASE_URL` (optional).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "OPENAI_API_KEY is not set; export it or put it in the environment".to_string(),
            )
            .into());
        }
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, base_url)
    }
}

impl GenerationProvider for OpenAiChat {
    fn complete(&self, model: &str, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(anyhow!("chat completion failed with {status}: {detail}"));
        }

        let payload: Value = response.json()?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("chat completion response has no message content"))?;
        Ok(content.to_string())
    }
}
