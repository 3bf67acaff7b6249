//! Anthropic Messages API backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Endpoint, VisionBackend, http_client, read_success};
use crate::{Result, VisionError, VisionRequest};

/// API version header value sent with every request.
pub const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: ImageSource },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Backend speaking the Anthropic Messages API.
pub struct AnthropicBackend {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl AnthropicBackend {
    /// Create a backend with its own HTTP client.
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(http_client(timeout)?, endpoint))
    }

    /// Create a backend reusing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, endpoint: Endpoint) -> Self {
        Self { client, endpoint }
    }

    fn build_body<'a>(&'a self, request: &'a VisionRequest<'a>) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.endpoint.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system_prompt,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type: request.media_type.as_str(),
                            data: request.image_base64(),
                        },
                    },
                    ContentBlock::Text {
                        text: request.user_prompt,
                    },
                ],
            }],
        }
    }
}

/// Pull the first text block out of a Messages API response body.
fn first_text(body: &str) -> Result<String> {
    let response: MessagesResponse =
        serde_json::from_str(body).map_err(|e| VisionError::InvalidResponse(e.to_string()))?;

    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or(VisionError::EmptyResponse)
}

#[async_trait]
impl VisionBackend for AnthropicBackend {
    async fn complete(&self, request: &VisionRequest<'_>, api_key: &str) -> Result<String> {
        let url = self.endpoint.url("v1/messages");
        debug!(
            url = %url,
            model = %self.endpoint.model,
            image_bytes = request.image.len(),
            "Sending Anthropic messages request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| VisionError::Transport(e.to_string()))?;

        let body = read_success(response).await?;
        first_text(&body)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }
}
