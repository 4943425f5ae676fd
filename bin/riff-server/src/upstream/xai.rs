use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::{UpstreamError, join, json, parse_base};

pub const TEMPERATURE: f64 = 0.85;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct XaiClient {
    client: Client,
    base: Url,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for XaiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XaiClient")
            .field("base", &self.base.as_str())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl XaiClient {
    pub fn new(client: Client, base: &str, api_key: String, model: String) -> Result<Self, UpstreamError> {
        Ok(Self { client, base: parse_base(base)?, api_key, model })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One system + user exchange; returns the first choice's content, if any.
    pub async fn complete(&self, system: &str, user: &str) -> Result<Option<String>, UpstreamError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: TEMPERATURE,
        };
        let url = join(&self.base, &["chat", "completions"])?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let body: ChatResponse = json(resp).await?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty()))
    }
}
