#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use trendify::AppState;
use trendify::config::Settings;
use trendify::services::{
    ContentPart, EditInput, EditOutput, EditProvider, MultimodalProvider, ProviderError,
    TrendCatalog,
};

/// Multimodal provider that replays one canned answer and records each call.
pub struct MockMultimodal {
    reply: Result<Vec<ContentPart>, ProviderError>,
    pub calls: Mutex<Vec<(String, Vec<ContentPart>)>>,
}

impl MockMultimodal {
    pub fn replying(parts: Vec<ContentPart>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(parts),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(ProviderError::new(message)),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MultimodalProvider for MockMultimodal {
    async fn generate_content(
        &self,
        api_key: &str,
        parts: Vec<ContentPart>,
    ) -> Result<Vec<ContentPart>, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((api_key.to_string(), parts));
        self.reply.clone()
    }
}

pub struct MockEditor {
    reply: Result<serde_json::Value, ProviderError>,
    pub calls: Mutex<Vec<EditInput>>,
}

impl MockEditor {
    pub fn replying(output: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(output),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(err: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(err),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl EditProvider for MockEditor {
    async fn edit(&self, input: EditInput) -> Result<EditOutput, ProviderError> {
        self.calls.lock().unwrap().push(input);
        match &self.reply {
            Ok(value) => Ok(serde_json::from_value(value.clone())
                .map_err(|e| ProviderError::new(e.to_string()))?),
            Err(e) => Err(e.clone()),
        }
    }

    async fn check_connection(&self) -> Result<bool, ProviderError> {
        match &self.reply {
            Ok(_) => Ok(true),
            Err(e) => Err(e.clone()),
        }
    }
}

pub fn settings() -> Settings {
    Settings {
        google_api_key: Some("env-google-key".to_string()),
        fal_key: Some("env-fal-key".to_string()),
        ..Settings::default()
    }
}

pub fn state(
    settings: Settings,
    multimodal: Arc<MockMultimodal>,
    editor: Arc<MockEditor>,
) -> AppState {
    AppState::new(
        settings,
        TrendCatalog::builtin().unwrap(),
        multimodal,
        editor,
    )
}
