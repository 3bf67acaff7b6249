//! OpenAI-compatible chat completions backend.
//!
//! Works with any endpoint exposing `/chat/completions` with image parts
//! (OpenAI, vLLM, Ollama, LiteLLM and similar proxies).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Endpoint, VisionBackend, http_client, read_success};
use crate::{Result, VisionError, VisionRequest};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: ChatContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent<'a> {
    Text(&'a str),
    Parts(Vec<ChatPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Backend speaking the OpenAI chat completions format.
pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl OpenAiBackend {
    /// Create a backend with its own HTTP client.
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(http_client(timeout)?, endpoint))
    }

    /// Create a backend reusing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, endpoint: Endpoint) -> Self {
        Self { client, endpoint }
    }

    fn build_body<'a>(&'a self, request: &'a VisionRequest<'a>) -> ChatRequest<'a> {
        let data_url = format!(
            "data:{};base64,{}",
            request.media_type.as_str(),
            request.image_base64()
        );

        ChatRequest {
            model: &self.endpoint.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: ChatContent::Text(request.system_prompt),
                },
                ChatMessage {
                    role: "user",
                    content: ChatContent::Parts(vec![
                        ChatPart::Text {
                            text: request.user_prompt,
                        },
                        ChatPart::ImageUrl {
                            image_url: ImageUrl { url: data_url },
                        },
                    ]),
                },
            ],
        }
    }
}

fn first_choice(body: &str) -> Result<String> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| VisionError::InvalidResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.is_empty())
        .ok_or(VisionError::EmptyResponse)
}

#[async_trait]
impl VisionBackend for OpenAiBackend {
    async fn complete(&self, request: &VisionRequest<'_>, api_key: &str) -> Result<String> {
        let url = self.endpoint.url("chat/completions");
        debug!(
            url = %url,
            model = %self.endpoint.model,
            image_bytes = request.image.len(),
            "Sending chat completions request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| VisionError::Transport(e.to_string()))?;

        let body = read_success(response).await?;
        first_choice(&body)
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }
}
