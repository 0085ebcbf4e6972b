// src/dialog.rs
//! Client-side generation flow for one trend: pick a photo, choose a
//! backend, call the matching route, and hold the result for display.

use anyhow::Context;
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde_json::{Value, json};

use crate::errors::GenerationError;
use crate::models::Trend;
use crate::services::{DataUrl, ImageProcessor};

/// Which generation route the dialog calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Multimodal,
    EditStyle,
}

impl Backend {
    pub fn path(&self) -> &'static str {
        match self {
            Backend::Multimodal => "/api/generate",
            Backend::EditStyle => "/api/seedream",
        }
    }

    /// Both backends get the photo as a data URL; the edit route receives it
    /// as its single image reference.
    pub fn request_body(&self, prompt: &str, image: &str) -> Value {
        match self {
            Backend::Multimodal => json!({ "prompt": prompt, "image": image }),
            Backend::EditStyle => json!({ "prompt": prompt, "imageUrls": [image] }),
        }
    }

    fn read_images(&self, body: &Value) -> Option<Vec<String>> {
        if body["success"].as_bool() != Some(true) {
            return None;
        }
        let images: Vec<String> = match self {
            Backend::Multimodal => body["generatedImage"]
                .as_str()
                .map(|s| vec![s.to_string()])
                .unwrap_or_default(),
            Backend::EditStyle => body["images"]
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .filter_map(|img| img["url"].as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default(),
        };
        (!images.is_empty()).then_some(images)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Idle,
    Generating,
    Success { images: Vec<String> },
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

#[async_trait]
pub trait GenerateTransport: Send + Sync {
    async fn post_json(&self, path: &str, body: &Value) -> anyhow::Result<TransportResponse>;
}

/// Talks to a running Trendify server.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GenerateTransport for HttpTransport {
    async fn post_json(&self, path: &str, body: &Value) -> anyhow::Result<TransportResponse> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {} failed", path))?;

        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .with_context(|| format!("HTTP {}: response was not JSON", status))?;

        Ok(TransportResponse { status, body })
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub data_url: DataUrl,
}

pub struct GenerateDialog<T> {
    trend: Trend,
    backend: Backend,
    source: Option<SourceFile>,
    state: DialogState,
    notice: Option<String>,
    processor: ImageProcessor,
    transport: T,
}

impl<T: GenerateTransport> GenerateDialog<T> {
    pub fn new(trend: Trend, transport: T) -> Self {
        Self {
            trend,
            backend: Backend::default(),
            source: None,
            state: DialogState::Idle,
            notice: None,
            processor: ImageProcessor::new(),
            transport,
        }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    /// Local validation message from the last rejected `generate` call.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    pub fn trend(&self) -> &Trend {
        &self.trend
    }

    pub fn set_backend(&mut self, backend: Backend) {
        if self.state != DialogState::Generating {
            self.backend = backend;
        }
    }

    /// Reads a picked file into a data URL.
    pub fn select_file(
        &mut self,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<(), GenerationError> {
        let (data_url, _) = self.processor.encode_upload(mime_type, bytes)?;
        debug!("selected {} as {}", name, data_url.mime_type);
        self.source = Some(SourceFile {
            name: name.to_string(),
            data_url,
        });
        self.notice = None;
        Ok(())
    }

    pub fn remove_file(&mut self) {
        self.source = None;
        self.notice = None;
        self.state = DialogState::Idle;
    }

    /// Close/reopen: forget the file, the result, and any message.
    pub fn reset(&mut self) {
        self.remove_file();
    }

    pub async fn generate(&mut self) -> &DialogState {
        if self.state == DialogState::Generating {
            return &self.state;
        }

        if self.trend.prompt.trim().is_empty() {
            self.notice = Some("No prompt available".to_string());
            return &self.state;
        }

        let Some(source) = &self.source else {
            self.notice = Some("Please upload an image to generate a new one".to_string());
            return &self.state;
        };

        let body = self
            .backend
            .request_body(&self.trend.prompt, &source.data_url.to_string());
        let backend = self.backend;

        self.notice = None;
        self.state = DialogState::Generating;
        info!("generating '{}' via {:?}", self.trend.title, backend);

        let outcome = match self.transport.post_json(backend.path(), &body).await {
            Ok(response) => interpret(backend, response),
            Err(e) => Err(format!("{:#}", e)),
        };

        self.state = match outcome {
            Ok(images) => DialogState::Success { images },
            Err(message) => {
                error!("generation failed: {}", message);
                DialogState::Failed { message }
            }
        };
        &self.state
    }

    /// File name offered when saving the result.
    pub fn download_name(&self) -> String {
        format!("{}-generated.png", self.trend.title)
    }

    /// Decoded bytes of the first result, when it is an inline data URL.
    /// Remote results (edit backend) have to be fetched by the caller.
    pub fn generated_bytes(&self) -> Option<Vec<u8>> {
        let DialogState::Success { images } = &self.state else {
            return None;
        };
        let first = images.first()?;
        DataUrl::parse(first).ok()?.decode().ok()
    }

    /// Re-runs the last attempt. Only meaningful after a failure.
    pub async fn retry(&mut self) -> &DialogState {
        if matches!(self.state, DialogState::Failed { .. }) {
            return self.generate().await;
        }
        &self.state
    }
}

fn interpret(backend: Backend, response: TransportResponse) -> Result<Vec<String>, String> {
    let error_message = response.body["error"].as_str().map(String::from);

    if !(200..300).contains(&response.status) {
        return Err(error_message.unwrap_or_else(|| format!("HTTP {}", response.status)));
    }

    backend
        .read_images(&response.body)
        .ok_or_else(|| error_message.unwrap_or_else(|| "No image received from the API".to_string()))
}
