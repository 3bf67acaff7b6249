//! Request types shared by every vision backend.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Image media types accepted by the vision endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl MediaType {
    /// MIME string for this media type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Webp => "image/webp",
        }
    }

    /// Look up a media type by file extension (with or without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            "gif" => Some(MediaType::Gif),
            "webp" => Some(MediaType::Webp),
            _ => None,
        }
    }

    /// Media type for a file name; unknown extensions are sent as JPEG.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single image + prompt request.
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    /// Instruction describing the task and output format.
    pub system_prompt: &'a str,
    /// Per-image instruction sent alongside the image.
    pub user_prompt: &'a str,
    /// Raw image bytes.
    pub image: &'a [u8],
    /// Media type of `image`.
    pub media_type: MediaType,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl VisionRequest<'_> {
    /// Base64 (standard alphabet, padded) encoding of the image.
    pub fn image_base64(&self) -> String {
        STANDARD.encode(self.image)
    }
}
