//! Gemini adapter.
//!
//! Implements the core `TextGenerator` port over the generateContent
//! endpoint. The backend is treated as a black-box text transform; prompt
//! construction and reply parsing live in `finbot-core`.

use async_trait::async_trait;
use serde_json::{json, Value};

use finbot_core::{errors::Error, ports::TextGenerator, Result};

#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    api_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("reqwest client build");
        Self {
            api_key: api_key.into(),
            api_url: api_url.into(),
            http,
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::External(format!("gemini request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "gemini call failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("gemini json error: {e}")))?;

        let text = v
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(Error::External("gemini returned empty text".to_string()));
        }

        Ok(text)
    }
}
