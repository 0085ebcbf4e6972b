// src/services/gemini.rs
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::ProviderError;

/// One ordered fragment exchanged with the multimodal model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineImage { mime_type: String, data: String },
}

#[async_trait]
pub trait MultimodalProvider: Send + Sync {
    /// Sends the ordered parts in a single call and returns the first
    /// candidate's parts in order.
    async fn generate_content(
        &self,
        api_key: &str,
        parts: Vec<ContentPart>,
    ) -> Result<Vec<ContentPart>, ProviderError>;
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl From<ContentPart> for GeminiPart {
    fn from(part: ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => GeminiPart {
                text: Some(text),
                inline_data: None,
            },
            ContentPart::InlineImage { mime_type, data } => GeminiPart {
                text: None,
                inline_data: Some(InlineData { mime_type, data }),
            },
        }
    }
}

impl GeminiPart {
    fn into_content_part(self) -> Option<ContentPart> {
        match (self.inline_data, self.text) {
            (Some(inline), _) => Some(ContentPart::InlineImage {
                mime_type: inline.mime_type,
                data: inline.data,
            }),
            (None, Some(text)) => Some(ContentPart::Text(text)),
            (None, None) => None,
        }
    }
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl MultimodalProvider for GeminiClient {
    async fn generate_content(
        &self,
        api_key: &str,
        parts: Vec<ContentPart>,
    ) -> Result<Vec<ContentPart>, ProviderError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: parts.into_iter().map(GeminiPart::from).collect(),
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini request failed: {}", e);
                ProviderError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini returned {}: {}", status, error_text);
            return Err(ProviderError::http(status.as_u16(), error_text));
        }

        let result: GeminiResponse = response.json().await.map_err(|e| {
            ProviderError::new(format!("Failed to parse Gemini response: {}", e))
        })?;

        parts_from_response(result)
    }
}

fn parts_from_response(result: GeminiResponse) -> Result<Vec<ContentPart>, ProviderError> {
    if let Some(reason) = result.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ProviderError::new(format!("Prompt blocked: {}", reason)));
    }

    let Some(candidate) = result.candidates.into_iter().next() else {
        return Ok(Vec::new());
    };

    let parts: Vec<ContentPart> = candidate
        .content
        .unwrap_or_default()
        .parts
        .into_iter()
        .filter_map(GeminiPart::into_content_part)
        .collect();

    // An empty candidate stopped for safety is a block, not an empty answer.
    if parts.is_empty() {
        if let Some(reason) = candidate.finish_reason.filter(|r| r == "SAFETY") {
            return Err(ProviderError::new(format!("Candidate blocked: {}", reason)));
        }
    }

    debug!("Gemini returned {} content part(s)", parts.len());
    Ok(parts)
}
