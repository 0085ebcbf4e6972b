// src/config.rs
use log::warn;
use std::path::PathBuf;

use crate::errors::GenerationError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_FAL_BASE_URL: &str = "https://fal.run";
pub const DEFAULT_FALLBACK_IMAGE_URL: &str =
    "https://storage.googleapis.com/falserverless/example_inputs/seedream4_edit_input_1.png";
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Process-wide settings. Read once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub google_api_key: Option<String>,
    pub fal_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub fal_base_url: String,
    pub fallback_image_url: String,
    pub trends_path: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            google_api_key: None,
            fal_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            fal_base_url: DEFAULT_FAL_BASE_URL.to_string(),
            fallback_image_url: DEFAULT_FALLBACK_IMAGE_URL.to_string(),
            trends_path: None,
            static_dir: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Settings {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Settings::default();

        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid MAX_BODY_BYTES value: {}", raw);
                defaults.max_body_bytes
            }),
            None => defaults.max_body_bytes,
        };

        Settings {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            google_api_key: get("GOOGLE_API_KEY"),
            fal_key: get("FAL_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            fal_base_url: get("FAL_BASE_URL").unwrap_or(defaults.fal_base_url),
            fallback_image_url: get("FALLBACK_IMAGE_URL").unwrap_or(defaults.fallback_image_url),
            trends_path: get("TRENDS_PATH").map(PathBuf::from),
            static_dir: get("STATIC_DIR").map(PathBuf::from),
            max_body_bytes,
        }
    }
}

/// Where a resolved credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Request,
    Environment,
}

#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub key: String,
    pub source: CredentialSource,
}

/// Resolves the multimodal provider credential.
///
/// Precedence: a non-empty value from the request, then the configured
/// default, otherwise `MissingCredential`.
pub fn resolve_credential(
    from_request: Option<&str>,
    configured: Option<&str>,
) -> Result<ResolvedCredential, GenerationError> {
    fn non_empty(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|v| !v.is_empty())
    }

    if let Some(key) = non_empty(from_request) {
        return Ok(ResolvedCredential {
            key: key.to_string(),
            source: CredentialSource::Request,
        });
    }

    if let Some(key) = non_empty(configured) {
        return Ok(ResolvedCredential {
            key: key.to_string(),
            source: CredentialSource::Environment,
        });
    }

    Err(GenerationError::MissingCredential(
        "Google API key not configured. Please provide an API key or set GOOGLE_API_KEY environment variable."
            .to_string(),
    ))
}
