// src/handlers.rs
use crate::{
    AppState,
    config::{CredentialSource, resolve_credential},
    errors::{GenerationError, classify_upstream},
    models::*,
    services::{
        ContentPart, DataUrl, EditInput, image_processor::is_transient_reference,
    },
};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use bytes::BytesMut;
use futures_util::TryStreamExt;
use log::{debug, error, info, warn};
use uuid::Uuid;

/// What the multimodal model gave back, after scanning its parts in order.
#[derive(Debug, PartialEq, Eq)]
pub enum MultimodalOutcome {
    Image(String),
    TextOnly(String),
}

/// First inline image wins; otherwise the first non-empty text part.
pub fn pick_outcome(parts: Vec<ContentPart>) -> Result<MultimodalOutcome, GenerationError> {
    let mut text = None;
    for part in parts {
        match part {
            ContentPart::InlineImage { data, .. } => return Ok(MultimodalOutcome::Image(data)),
            ContentPart::Text(t) if text.is_none() && !t.is_empty() => text = Some(t),
            ContentPart::Text(_) => {}
        }
    }

    text.map(MultimodalOutcome::TextOnly)
        .ok_or(GenerationError::UpstreamProtocolError)
}

fn required(value: Option<String>, message: &str) -> Result<String, GenerationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| GenerationError::MissingField(message.to_string()))
}

pub async fn generate(
    data: web::Data<AppState>,
    body: web::Json<GenerateRequest>,
) -> Result<HttpResponse, GenerationError> {
    let request_id = Uuid::new_v4();
    let GenerateRequest {
        image,
        prompt,
        api_key,
    } = body.into_inner();

    let image = required(image, "Image is required")?;
    let prompt = required(prompt, "Text prompt is required")?;

    let credential =
        resolve_credential(api_key.as_deref(), data.settings.google_api_key.as_deref())?;

    let source = DataUrl::parse(&image)?;
    source.ensure_supported()?;

    info!(
        "[{}] multimodal generation: {} input, {} credential",
        request_id,
        source.mime_type,
        match credential.source {
            CredentialSource::Request => "request",
            CredentialSource::Environment => "configured",
        }
    );
    debug!("[{}] inline payload {} base64 chars", request_id, source.data.len());

    let parts = vec![
        ContentPart::Text(prompt.clone()),
        ContentPart::InlineImage {
            mime_type: source.mime_type,
            data: source.data,
        },
    ];

    let response = data
        .multimodal
        .generate_content(&credential.key, parts)
        .await
        .map_err(|e| {
            error!("[{}] Image generation failed: {}", request_id, e);
            classify_upstream(e)
        })?;

    match pick_outcome(response) {
        Ok(MultimodalOutcome::Image(image_data)) => {
            info!("[{}] image generated", request_id);
            Ok(HttpResponse::Ok().json(GenerateSuccess {
                success: true,
                generated_image: format!("data:image/png;base64,{}", image_data),
                original_image: image,
                description: format!("Generated image based on prompt: {}", prompt),
                prompt,
                format: "png".to_string(),
            }))
        }
        Ok(MultimodalOutcome::TextOnly(text_response)) => {
            warn!("[{}] model answered with text only", request_id);
            Ok(HttpResponse::BadRequest().json(NoImageGenerated {
                success: false,
                error: "No image was generated".to_string(),
                text_response,
                message: "The model returned a text response instead of an image. Try a different prompt that specifically requests image generation.".to_string(),
            }))
        }
        Err(e) => {
            error!("[{}] {}", request_id, e);
            Err(e)
        }
    }
}

pub async fn seedream(
    data: web::Data<AppState>,
    body: web::Json<EditRequest>,
) -> Result<HttpResponse, GenerationError> {
    let request_id = Uuid::new_v4();

    if data.settings.fal_key.is_none() {
        return Err(GenerationError::MissingCredential(
            "FAL_KEY environment variable not set. Please add it to your .env file".to_string(),
        ));
    }

    let EditRequest { prompt, image_urls } = body.into_inner();
    let prompt = required(prompt, "Prompt is required")?;

    let first = image_urls
        .as_ref()
        .and_then(|v| v.as_array())
        .and_then(|urls| urls.first())
        .and_then(|url| url.as_str())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            GenerationError::MissingField("At least one image URL is required".to_string())
        })?;

    let image_url = if is_transient_reference(first) {
        warn!(
            "[{}] blob reference cannot be fetched server-side, using fallback image",
            request_id
        );
        data.settings.fallback_image_url.clone()
    } else {
        first.to_string()
    };

    info!("[{}] seedream edit dispatched", request_id);

    let output = data
        .editor
        .edit(EditInput::single(prompt.clone(), image_url))
        .await
        .map_err(|e| {
            error!(
                "[{}] Seedream edit failed: {} (status {:?}, body {:?})",
                request_id, e.message, e.status, e.body
            );
            GenerationError::upstream(e)
        })?;

    Ok(HttpResponse::Ok().json(EditSuccess {
        success: true,
        images: output.images,
        seed: output.seed,
        prompt,
    }))
}

pub async fn seedream_check(data: web::Data<AppState>) -> HttpResponse {
    if data.settings.fal_key.is_none() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "ok": false,
            "error": "FAL_KEY environment variable not set. Please add it to your .env file"
        }));
    }

    match data.editor.check_connection().await {
        Ok(has_result) => HttpResponse::Ok().json(serde_json::json!({
            "ok": true,
            "message": "FAL connection successful!",
            "hasResult": has_result
        })),
        Err(e) => {
            error!("FAL connection check failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "ok": false,
                "error": e.message,
                "details": e.body
            }))
        }
    }
}

pub async fn upload_image(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, GenerationError> {
    let limit = data.settings.max_body_bytes;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| GenerationError::InvalidUpload(e.to_string()))?
    {
        let Some(filename) = field
            .content_disposition()
            .get_filename()
            .map(|f| f.to_string())
        else {
            continue;
        };

        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut image_data = BytesMut::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| GenerationError::InvalidUpload(e.to_string()))?
        {
            if image_data.len() + chunk.len() > limit {
                return Err(GenerationError::InvalidUpload(format!(
                    "file exceeds {} bytes",
                    limit
                )));
            }
            image_data.extend_from_slice(&chunk);
        }

        let (data_url, dimensions) = data
            .image_processor
            .encode_upload(&content_type, &image_data)?;

        info!(
            "Encoded upload {} ({} bytes, {})",
            filename,
            image_data.len(),
            data_url.mime_type
        );

        return Ok(HttpResponse::Ok().json(UploadedImage {
            mime_type: data_url.mime_type.clone(),
            image: data_url.to_string(),
            file_name: filename,
            size: image_data.len(),
            dimensions,
        }));
    }

    Err(GenerationError::MissingField("No file uploaded".to_string()))
}

pub async fn list_trends(
    data: web::Data<AppState>,
    query: web::Query<TrendQuery>,
) -> HttpResponse {
    let trends = data.catalog.search(query.search.as_deref().unwrap_or(""));
    HttpResponse::Ok().json(trends)
}

pub async fn get_trend(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, GenerationError> {
    let id = path.into_inner();
    let trend = data
        .catalog
        .get(&id)
        .ok_or_else(|| GenerationError::NotFound(format!("Trend {} not found", id)))?;

    Ok(HttpResponse::Ok().json(trend))
}

pub async fn health_check(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "trendify",
        "version": env!("CARGO_PKG_VERSION"),
        "trends": data.catalog.len()
    }))
}
