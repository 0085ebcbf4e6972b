// src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A style template from the trend catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub id: String,
    pub title: String,
    pub description: String,
    pub prompt: String,
    pub image: String,
    pub category: String,
    pub order: i32,
    pub created_at: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub image: Option<String>,
    pub prompt: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSuccess {
    pub success: bool,
    pub generated_image: String,
    pub original_image: String,
    pub prompt: String,
    pub format: String,
    pub description: String,
}

/// Returned with a 400 when the model answered with text only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoImageGenerated {
    pub success: bool,
    pub error: String,
    pub text_response: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub prompt: Option<String>,
    // Kept loose so a non-list value is reported as a missing field, not a parse error.
    pub image_urls: Option<serde_json::Value>,
}

/// One image returned by the edit provider. Extra provider fields pass through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultImage {
    pub url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditSuccess {
    pub success: bool,
    pub images: Vec<ResultImage>,
    pub seed: Option<u64>,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub image: String,
    pub mime_type: String,
    pub file_name: String,
    pub size: usize,
    pub dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendQuery {
    pub search: Option<String>,
}
