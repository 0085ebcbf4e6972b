// src/errors.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::services::ProviderError;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{0}")]
    MissingField(String),

    #[error("{0}")]
    MissingCredential(String),

    #[error("Invalid image format. Please provide a base64 data URL.")]
    InvalidImageFormat,

    #[error("Unsupported image format: {}. Supported formats: {}", .mime_type, .allowed.join(", "))]
    UnsupportedMimeType {
        mime_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid Google API key provided")]
    Unauthorized,

    #[error("API quota exceeded. Please check your Google API usage limits.")]
    RateLimited,

    #[error("Content was blocked due to safety policies. Please try a different prompt or image.")]
    ContentBlocked,

    #[error("No image or text data received from generation")]
    UpstreamProtocolError,

    #[error("Upstream error: {message}")]
    UpstreamError {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Trend catalog error: {0}")]
    Catalog(String),
}

impl GenerationError {
    /// Wraps a provider failure without classifying it.
    pub fn upstream(err: ProviderError) -> Self {
        GenerationError::UpstreamError {
            message: err.message,
            status: err.status,
            body: err.body,
        }
    }
}

/// Maps a provider failure onto the client-facing taxonomy.
///
/// Matching is on case-sensitive markers in the provider message and raw
/// body. Credential problems win over quota, quota over safety.
pub fn classify_upstream(err: ProviderError) -> GenerationError {
    let contains = |marker: &str| {
        err.message.contains(marker) || err.body.as_deref().is_some_and(|b| b.contains(marker))
    };

    if contains("API_KEY_INVALID") {
        GenerationError::Unauthorized
    } else if contains("QUOTA_EXCEEDED") {
        GenerationError::RateLimited
    } else if contains("SAFETY") {
        GenerationError::ContentBlocked
    } else {
        GenerationError::upstream(err)
    }
}

impl ResponseError for GenerationError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenerationError::MissingField(_)
            | GenerationError::InvalidImageFormat
            | GenerationError::UnsupportedMimeType { .. }
            | GenerationError::ContentBlocked
            | GenerationError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            GenerationError::Unauthorized => StatusCode::UNAUTHORIZED,
            GenerationError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GenerationError::NotFound(_) => StatusCode::NOT_FOUND,
            GenerationError::MissingCredential(_)
            | GenerationError::UpstreamProtocolError
            | GenerationError::UpstreamError { .. }
            | GenerationError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            GenerationError::UpstreamProtocolError => serde_json::json!({
                "error": "Failed to generate image",
                "details": self.to_string()
            }),
            GenerationError::UpstreamError { message, .. } => serde_json::json!({
                "error": "Failed to generate image",
                "details": message
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_error(message: &str) -> ProviderError {
        ProviderError {
            message: message.to_string(),
            status: Some(400),
            body: None,
        }
    }

    #[test]
    fn classifies_credential_quota_and_safety_markers() {
        assert!(matches!(
            classify_upstream(provider_error("[400] API_KEY_INVALID: key rejected")),
            GenerationError::Unauthorized
        ));
        assert!(matches!(
            classify_upstream(provider_error("QUOTA_EXCEEDED for project")),
            GenerationError::RateLimited
        ));
        assert!(matches!(
            classify_upstream(provider_error("prompt blocked: SAFETY")),
            GenerationError::ContentBlocked
        ));
    }

    #[test]
    fn markers_in_raw_body_are_recognized() {
        let err = ProviderError {
            message: "Gemini returned HTTP 400".to_string(),
            status: Some(400),
            body: Some(r#"{"error":{"details":[{"reason":"API_KEY_INVALID"}]}}"#.to_string()),
        };
        assert!(matches!(classify_upstream(err), GenerationError::Unauthorized));
    }

    #[test]
    fn credential_marker_takes_precedence() {
        let err = provider_error("API_KEY_INVALID and QUOTA_EXCEEDED and SAFETY");
        assert!(matches!(classify_upstream(err), GenerationError::Unauthorized));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let err = provider_error("safety filter tripped");
        assert!(matches!(
            classify_upstream(err),
            GenerationError::UpstreamError { .. }
        ));
    }

    #[test]
    fn unknown_failures_keep_upstream_detail() {
        let err = ProviderError {
            message: "connection reset".to_string(),
            status: Some(503),
            body: Some("busy".to_string()),
        };
        match classify_upstream(err) {
            GenerationError::UpstreamError {
                message,
                status,
                body,
            } => {
                assert_eq!(message, "connection reset");
                assert_eq!(status, Some(503));
                assert_eq!(body.as_deref(), Some("busy"));
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn status_codes_follow_category() {
        assert_eq!(
            GenerationError::MissingField("Image is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GenerationError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GenerationError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            GenerationError::ContentBlocked.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GenerationError::MissingCredential("no key".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GenerationError::UpstreamProtocolError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unsupported_mime_message_names_type_and_allowed_set() {
        let err = GenerationError::UnsupportedMimeType {
            mime_type: "image/gif".to_string(),
            allowed: vec!["image/png".to_string(), "image/jpeg".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unsupported image format: image/gif. Supported formats: image/png, image/jpeg"
        );
    }
}
