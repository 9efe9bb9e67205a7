//! The upstream AI call. The API key lives here, read from the environment
//! at startup, and never travels to clients.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Serialize)]
pub struct UpstreamMessage {
    pub role: String,
    pub content: String,
}

pub struct UpstreamClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl UpstreamClient {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("AI_API_KEY")
            .context("AI_API_KEY must be set; the proxy exists to keep it server-side")?;
        let model = std::env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url =
            std::env::var("AI_UPSTREAM_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let http = Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .context("failed to build upstream HTTP client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    /// One completion round-trip; returns the concatenated text blocks.
    pub async fn complete(&self, system: &str, messages: &[UpstreamMessage]) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            messages,
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .context("upstream request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("upstream returned {status}: {body}");
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .context("unparseable upstream response")?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();

        if text.is_empty() {
            anyhow::bail!("upstream response contained no text");
        }
        Ok(text)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [UpstreamMessage],
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}
