// src/services/seedream.rs
use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ProviderError;
use crate::models::ResultImage;

const EDIT_MODEL_PATH: &str = "fal-ai/bytedance/seedream/v4/edit";
const PROBE_MODEL_PATH: &str = "fal-ai/flux/dev";

/// Input for one edit call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditInput {
    pub prompt: String,
    pub image_urls: Vec<String>,
    pub image_size: String,
    pub num_images: u32,
    pub enable_safety_checker: bool,
}

impl EditInput {
    /// Single-image request with the fixed output options used by the product.
    pub fn single(prompt: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image_urls: vec![image_url.into()],
            image_size: "square_hd".to_string(),
            num_images: 1,
            enable_safety_checker: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditOutput {
    #[serde(default)]
    pub images: Vec<ResultImage>,
    pub seed: Option<u64>,
}

#[async_trait]
pub trait EditProvider: Send + Sync {
    async fn edit(&self, input: EditInput) -> Result<EditOutput, ProviderError>;

    /// Cheap round trip proving the credential and endpoint work.
    async fn check_connection(&self) -> Result<bool, ProviderError>;
}

pub struct SeedreamClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SeedreamClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn run(
        &self,
        model_path: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::new("FAL_KEY is not configured"))?;

        let response = self
            .client
            .post(format!("{}/{}", self.base_url, model_path))
            .header("Authorization", format!("Key {}", api_key))
            .json(&input)
            .send()
            .await
            .map_err(|e| {
                error!("fal request to {} failed: {}", model_path, e);
                ProviderError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("fal {} returned {}: {}", model_path, status, error_text);
            return Err(ProviderError::http(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to parse fal response: {}", e)))
    }
}

#[async_trait]
impl EditProvider for SeedreamClient {
    async fn edit(&self, input: EditInput) -> Result<EditOutput, ProviderError> {
        let body = serde_json::to_value(&input)
            .map_err(|e| ProviderError::new(format!("Failed to encode edit input: {}", e)))?;

        let result = self.run(EDIT_MODEL_PATH, body).await?;

        let output: EditOutput = serde_json::from_value(result)
            .map_err(|e| ProviderError::new(format!("Unexpected edit response: {}", e)))?;

        info!(
            "Seedream edit returned {} image(s), seed {:?}",
            output.images.len(),
            output.seed
        );
        Ok(output)
    }

    async fn check_connection(&self) -> Result<bool, ProviderError> {
        let result = self
            .run(
                PROBE_MODEL_PATH,
                json!({
                    "prompt": "a simple test image",
                    "image_size": "square_hd",
                    "num_inference_steps": 1
                }),
            )
            .await?;

        Ok(!result.is_null())
    }
}
