//! Extraction client backed by a vision model.

use async_trait::async_trait;
use invx_vision::{MediaType, VisionBackend, VisionError, VisionRequest};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use super::prompt::{DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT, parse_fields_json};
use super::{ExtractionOutcome, InvoiceExtractor};
use crate::error::{ExtractionError, Result};
use crate::models::config::{ExtractionConfig, VisionConfig};
use crate::normalize::FieldNormalizer;

/// Canned model output returned in mock mode.
pub fn mock_fields() -> Map<String, Value> {
    match json!({
        "date": "01/01/2025",
        "abn": "51 824 753 556",
        "amount_inc_gst": "$110.00",
        "gst": "$10.00",
        "description": "Mock invoice - office supplies",
        "category": "Office Supplies"
    }) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Extracts invoice fields by sending the image to a vision model.
pub struct VisionExtractor {
    backend: Box<dyn VisionBackend>,
    normalizer: FieldNormalizer,
    system_prompt: String,
    user_prompt: String,
    api_key: Option<String>,
    key_var: String,
    max_tokens: u32,
    temperature: f32,
    mock: bool,
}

impl VisionExtractor {
    /// Create an extractor around a backend with default prompts and aliases.
    pub fn new(backend: Box<dyn VisionBackend>) -> Self {
        Self {
            backend,
            normalizer: FieldNormalizer::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prompt: DEFAULT_USER_PROMPT.to_string(),
            api_key: None,
            key_var: "ANTHROPIC_API_KEY".to_string(),
            max_tokens: 1024,
            temperature: 0.2,
            mock: false,
        }
    }

    /// Build the configured backend and extractor.
    pub fn from_config(vision: &VisionConfig, extraction: &ExtractionConfig) -> Result<Self> {
        let endpoint = vision.endpoint();
        let backend = vision.provider.backend(endpoint.clone(), vision.timeout())?;

        info!(
            provider = %vision.provider,
            url = %endpoint.base_url,
            model = %endpoint.model,
            mock = vision.mock,
            "Configured vision extractor"
        );

        Ok(Self::new(backend)
            .with_api_key(vision.api_key.clone(), vision.key_var())
            .with_prompts(&extraction.system_prompt, &extraction.user_prompt)
            .with_normalizer(FieldNormalizer::new(extraction.aliases.clone()))
            .with_sampling(vision.max_tokens, vision.temperature)
            .with_mock(vision.mock))
    }

    /// Set the API key and the variable name reported when it is missing.
    pub fn with_api_key(mut self, api_key: Option<String>, key_var: impl Into<String>) -> Self {
        self.api_key = api_key;
        self.key_var = key_var.into();
        self
    }

    pub fn with_prompts(mut self, system: impl Into<String>, user: impl Into<String>) -> Self {
        self.system_prompt = system.into();
        self.user_prompt = user.into();
        self
    }

    pub fn with_normalizer(mut self, normalizer: FieldNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Enable mock mode.
    pub fn with_mock(mut self, mock: bool) -> Self {
        self.mock = mock;
        self
    }

    pub fn is_mock(&self) -> bool {
        self.mock
    }
}

#[async_trait]
impl InvoiceExtractor for VisionExtractor {
    async fn extract(&self, image: &[u8], media_type: MediaType) -> ExtractionOutcome {
        if self.mock {
            debug!(image_bytes = image.len(), "Mock mode, skipping model call");
            return Ok(self.normalizer.normalize(&mock_fields()));
        }

        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ExtractionError::MissingCredential(self.key_var.clone()))?;

        let request = VisionRequest {
            system_prompt: &self.system_prompt,
            user_prompt: &self.user_prompt,
            image,
            media_type,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let text = self
            .backend
            .complete(&request, api_key)
            .await
            .map_err(|e| match e {
                VisionError::EmptyResponse => ExtractionError::NoContent,
                other => ExtractionError::Transport(other.to_string()),
            })?;

        let raw = parse_fields_json(&text).inspect_err(|e| {
            if let ExtractionError::Parse { raw } = e {
                warn!(backend = self.backend.name(), raw = %raw, "Model reply is not a JSON object");
            }
        })?;

        debug!(keys = raw.len(), backend = self.backend.name(), "Parsed model reply");
        Ok(self.normalizer.normalize(&raw))
    }
}
