//! Vision backend implementations.

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "openai")]
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, VisionError, VisionRequest};

/// Trait for vision-model backends.
///
/// This trait abstracts over the wire format of different providers, so the
/// extraction layer only ever deals with "image in, text out".
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Send one request and return the model's text reply.
    ///
    /// # Arguments
    /// * `request` - Prompts and image to send
    /// * `api_key` - Credential for the endpoint
    ///
    /// # Returns
    /// The first text block of the model response
    async fn complete(&self, request: &VisionRequest<'_>, api_key: &str) -> Result<String>;

    /// Short provider name, used in logs.
    fn name(&self) -> &'static str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;
}

/// Base URL and model of a vision endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub model: String,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Join a path onto the base URL without doubling slashes.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Supported vision providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    /// Default API base URL for the provider.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::OpenAi => "https://api.openai.com/v1",
        }
    }

    /// Default model identifier for the provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-sonnet-4-5-20250929",
            Provider::OpenAi => "gpt-4o",
        }
    }

    /// Environment variable conventionally holding the provider credential.
    pub fn default_key_var(&self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Parse a provider name as used in configuration and on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Some(Provider::Anthropic),
            "openai" | "open_ai" | "chat" => Some(Provider::OpenAi),
            _ => None,
        }
    }

    /// Build the backend for this provider.
    pub fn backend(&self, endpoint: Endpoint, timeout: Duration) -> Result<Box<dyn VisionBackend>> {
        match self {
            #[cfg(feature = "anthropic")]
            Provider::Anthropic => Ok(Box::new(anthropic::AnthropicBackend::new(endpoint, timeout)?)),
            #[cfg(feature = "openai")]
            Provider::OpenAi => Ok(Box::new(openai::OpenAiBackend::new(endpoint, timeout)?)),
            #[allow(unreachable_patterns)]
            other => {
                let _ = (endpoint, timeout);
                Err(VisionError::Unavailable(format!("{:?}", other)))
            }
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Anthropic => f.write_str("anthropic"),
            Provider::OpenAi => f.write_str("openai"),
        }
    }
}

/// Build the shared HTTP client used by the reqwest-based backends.
#[cfg(any(feature = "anthropic", feature = "openai"))]
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| VisionError::Transport(e.to_string()))
}

/// Read a response, turning non-success statuses into `VisionError::Status`.
#[cfg(any(feature = "anthropic", feature = "openai"))]
pub(crate) async fn read_success(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| VisionError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(VisionError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_cleanly() {
        let endpoint = Endpoint::new("https://api.anthropic.com/", "m");
        assert_eq!(endpoint.url("/v1/messages"), "https://api.anthropic.com/v1/messages");

        let endpoint = Endpoint::new("http://localhost:8080/proxy", "m");
        assert_eq!(endpoint.url("v1/messages"), "http://localhost:8080/proxy/v1/messages");
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("Anthropic"), Some(Provider::Anthropic));
        assert_eq!(Provider::parse("openai"), Some(Provider::OpenAi));
        assert_eq!(Provider::parse("gemini"), None);
    }

    #[test]
    fn test_provider_serde_names() {
        let json = serde_json::to_string(&Provider::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
        let parsed: Provider = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(parsed, Provider::Anthropic);
    }
}
