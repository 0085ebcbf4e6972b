// src/services/mod.rs
use thiserror::Error;

pub mod gemini;
pub mod image_processor;
pub mod seedream;
pub mod trends;

pub use gemini::{ContentPart, GeminiClient, MultimodalProvider};
pub use image_processor::{DataUrl, ImageProcessor};
pub use seedream::{EditInput, EditOutput, EditProvider, SeedreamClient};
pub use trends::TrendCatalog;

/// Failure reported by an upstream provider, before classification.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
    pub status: Option<u16>,
    pub body: Option<String>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    pub fn http(status: u16, body: String) -> Self {
        Self {
            message: format!("HTTP {}: {}", status, body),
            status: Some(status),
            body: Some(body),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
            body: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fails_with_provider_error() -> Result<(), ProviderError> {
        Err(ProviderError::http(503, "overloaded".to_string()))
    }

    #[test]
    fn displays_its_message() {
        let err = ProviderError::http(429, "slow down".to_string());
        assert_eq!(err.to_string(), "HTTP 429: slow down");
    }

    #[test]
    fn converts_into_anyhow_and_boxed_errors() {
        let wrapped = || -> anyhow::Result<()> {
            fails_with_provider_error()?;
            Ok(())
        };
        let err = wrapped().unwrap_err();
        let provider = err.downcast_ref::<ProviderError>().unwrap();
        assert_eq!(provider.status, Some(503));

        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(ProviderError::new("boom"));
        assert_eq!(boxed.to_string(), "boom");
    }
}
