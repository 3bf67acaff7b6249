//! Configuration structures for the extraction service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use invx_vision::{Endpoint, Provider};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InvxError, Result};
use crate::extract::prompt::{DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT};
use crate::normalize::AliasTable;

/// Main configuration for invx.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvxConfig {
    /// Vision model endpoint configuration.
    pub vision: VisionConfig,

    /// Prompt and field-mapping configuration.
    pub extraction: ExtractionConfig,

    /// Uploaded file storage configuration.
    pub storage: StorageConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,
}

/// Vision model endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Which wire format to speak.
    pub provider: Provider,

    /// API base URL (provider default when unset).
    pub base_url: Option<String>,

    /// Model identifier (provider default when unset).
    pub model: Option<String>,

    /// Environment variable holding the API key (provider default when unset).
    pub api_key_var: Option<String>,

    /// API key, only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Maximum tokens in the model reply.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Return a canned record instead of calling the model.
    pub mock: bool,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Anthropic,
            base_url: None,
            model: None,
            api_key_var: None,
            api_key: None,
            max_tokens: 1024,
            temperature: 0.2,
            timeout_secs: 60,
            mock: false,
        }
    }
}

impl VisionConfig {
    /// Resolved base URL and model.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(
            self.base_url
                .clone()
                .unwrap_or_else(|| self.provider.default_base_url().to_string()),
            self.model
                .clone()
                .unwrap_or_else(|| self.provider.default_model().to_string()),
        )
    }

    /// Name of the environment variable holding the API key.
    pub fn key_var(&self) -> &str {
        self.api_key_var
            .as_deref()
            .unwrap_or_else(|| self.provider.default_key_var())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Prompt text and model-output field aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Instruction describing the six fields and their formats.
    pub system_prompt: String,

    /// Per-image instruction requesting strict JSON.
    pub user_prompt: String,

    /// Keys accepted for each canonical field.
    pub aliases: AliasTable,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prompt: DEFAULT_USER_PROMPT.to_string(),
            aliases: AliasTable::default(),
        }
    }
}

/// Uploaded file storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory uploaded images are written to.
    pub upload_dir: PathBuf,

    /// URL path stored images are served under.
    pub public_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("public/uploaded_files"),
            public_path: "/uploaded_files".to_string(),
        }
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Files processed concurrently per chunk.
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 3 }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub host: String,

    /// Listen port.
    pub port: u16,

    /// Enable CORS.
    pub cors_enabled: bool,

    /// Allowed CORS origins (empty = any).
    pub cors_origins: Vec<String>,

    /// Maximum request body size for uploads, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl InvxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> std::result::Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Load the file (if given), then `.env`, then process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(dotenv) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", dotenv.display());
        }

        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    ///
    /// Recognised variables: the key variable named by `vision.api_key_var`,
    /// `INVX_PROVIDER`, `INVX_BASE_URL` / `ANTHROPIC_BASE_URL`,
    /// `INVX_MODEL` / `ANTHROPIC_MODEL`, `INVX_MOCK`, `UPLOAD_DIR`,
    /// `INVX_CONCURRENCY`, `INVX_HOST`, `INVX_PORT`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("INVX_PROVIDER") {
            self.vision.provider = Provider::parse(&provider)
                .ok_or_else(|| InvxError::Config(format!("unknown provider: {}", provider)))?;
        }

        if let Some(url) = get("INVX_BASE_URL").or_else(|| get("ANTHROPIC_BASE_URL")) {
            self.vision.base_url = Some(url);
        }

        if let Some(model) = get("INVX_MODEL").or_else(|| get("ANTHROPIC_MODEL")) {
            self.vision.model = Some(model);
        }

        if let Some(key) = get(self.vision.key_var()) {
            self.vision.api_key = Some(key);
        }

        if let Some(mock) = get("INVX_MOCK") {
            self.vision.mock = parse_flag(&mock)
                .ok_or_else(|| InvxError::Config(format!("invalid INVX_MOCK value: {}", mock)))?;
        }

        if let Some(dir) = get("UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }

        if let Some(concurrency) = get("INVX_CONCURRENCY") {
            self.batch.concurrency = concurrency
                .trim()
                .parse()
                .map_err(|_| InvxError::Config(format!("invalid INVX_CONCURRENCY: {}", concurrency)))?;
        }

        if let Some(host) = get("INVX_HOST") {
            self.server.host = host;
        }

        if let Some(port) = get("INVX_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| InvxError::Config(format!("invalid INVX_PORT: {}", port)))?;
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
