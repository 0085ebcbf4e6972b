// src/lib.rs
use actix_web::{HttpRequest, HttpResponse, error::JsonPayloadError, web};
use std::sync::Arc;

pub mod config;
pub mod dialog;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

use crate::config::Settings;
use crate::services::{EditProvider, ImageProcessor, MultimodalProvider, TrendCatalog};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub catalog: Arc<TrendCatalog>,
    pub multimodal: Arc<dyn MultimodalProvider>,
    pub editor: Arc<dyn EditProvider>,
    pub image_processor: Arc<ImageProcessor>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        catalog: TrendCatalog,
        multimodal: Arc<dyn MultimodalProvider>,
        editor: Arc<dyn EditProvider>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            catalog: Arc::new(catalog),
            multimodal,
            editor,
            image_processor: Arc::new(ImageProcessor::new()),
        }
    }
}

/// Registers the API and health routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/generate", web::post().to(handlers::generate))
            .route("/seedream", web::post().to(handlers::seedream))
            .route("/seedream/check", web::get().to(handlers::seedream_check))
            .route("/upload", web::post().to(handlers::upload_image))
            .route("/trends", web::get().to(handlers::list_trends))
            .route("/trends/{id}", web::get().to(handlers::get_trend)),
    )
    .route("/health", web::get().to(handlers::health_check));
}

/// JSON extractor config: body limit plus `{ "error": ... }` bodies for bad payloads.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            let message = format!("Invalid request body: {}", err);
            let response = HttpResponse::BadRequest().json(serde_json::json!({ "error": message }));
            actix_web::error::InternalError::from_response(err, response).into()
        })
}
