// src/main.rs
use actix_web::{App, HttpServer, middleware, web};
use log::{info, warn};
use std::sync::Arc;

use trendify::config::Settings;
use trendify::services::{GeminiClient, SeedreamClient, TrendCatalog};
use trendify::{AppState, json_config, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // .env may carry RUST_LOG, so load it before the logger; settings come after
    // so their warnings are not dropped.
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let settings = Settings::from_env();

    info!("Starting Trendify service...");

    if settings.google_api_key.is_none() {
        warn!("GOOGLE_API_KEY not set; /api/generate requires an apiKey in each request");
    }
    if settings.fal_key.is_none() {
        warn!("FAL_KEY not set; /api/seedream is disabled");
    }

    let catalog = match &settings.trends_path {
        Some(path) => TrendCatalog::load(path),
        None => TrendCatalog::builtin(),
    }
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

    let multimodal = Arc::new(GeminiClient::new(
        settings.gemini_base_url.clone(),
        settings.gemini_model.clone(),
    ));
    let editor = Arc::new(SeedreamClient::new(
        settings.fal_base_url.clone(),
        settings.fal_key.clone(),
    ));

    let bind_addr = settings.bind_addr.clone();
    let max_body_bytes = settings.max_body_bytes;
    let static_dir = settings.static_dir.clone();

    let app_state = AppState::new(settings, catalog, multimodal, editor);

    info!("Starting HTTP server on {}", bind_addr);

    HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(json_config(max_body_bytes))
            .wrap(middleware::Logger::default())
            .configure(routes);

        match &static_dir {
            Some(dir) => app.service(actix_files::Files::new("/trend", dir)),
            None => app,
        }
    })
    .bind(bind_addr)?
    .run()
    .await
}
