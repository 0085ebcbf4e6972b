// src/services/image_processor.rs
use crate::errors::GenerationError;
use base64::{Engine as _, engine::general_purpose};
use image::{GenericImageView, ImageFormat as ImgFormat};

/// MIME types the multimodal provider accepts as inline image data.
pub const SUPPORTED_MIME_TYPES: [&str; 6] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "image/heic",
    "image/heif",
];

const DATA_URL_SCHEME: &str = "data:";
const BLOB_URL_SCHEME: &str = "blob:";

/// A parsed `data:<mime>;base64,<payload>` string. The payload stays encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub data: String,
}

impl DataUrl {
    pub fn parse(input: &str) -> Result<Self, GenerationError> {
        let rest = input
            .strip_prefix(DATA_URL_SCHEME)
            .ok_or(GenerationError::InvalidImageFormat)?;
        let (header, data) = rest
            .split_once(',')
            .ok_or(GenerationError::InvalidImageFormat)?;
        if data.is_empty() {
            return Err(GenerationError::InvalidImageFormat);
        }

        // Kept as declared: the allow-list match is case-sensitive.
        let mime_type = header.split(';').next().unwrap_or_default();

        Ok(DataUrl {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        DataUrl {
            mime_type: mime_type.to_string(),
            data: general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Rejects MIME types outside [`SUPPORTED_MIME_TYPES`].
    pub fn ensure_supported(&self) -> Result<(), GenerationError> {
        if is_supported_mime(&self.mime_type) {
            Ok(())
        } else {
            Err(GenerationError::UnsupportedMimeType {
                mime_type: self.mime_type.clone(),
                allowed: SUPPORTED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            })
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, GenerationError> {
        general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|_| GenerationError::InvalidImageFormat)
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}

pub fn is_supported_mime(mime_type: &str) -> bool {
    SUPPORTED_MIME_TYPES.contains(&mime_type)
}

/// True for references that only exist inside the browser session that made them.
pub fn is_transient_reference(reference: &str) -> bool {
    reference.starts_with(BLOB_URL_SCHEME)
}

pub struct ImageProcessor {
    max_dimension: u32,
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self {
            max_dimension: 2048,
        }
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    /// Checks the declared type and, for formats we can decode, the bytes themselves.
    ///
    /// HEIC/HEIF are accepted on the declared type alone; the decoder does not
    /// support them. Returns the pixel dimensions when they could be read.
    pub fn validate_image(
        &self,
        mime_type: &str,
        data: &[u8],
    ) -> Result<Option<(u32, u32)>, GenerationError> {
        if !is_supported_mime(mime_type) {
            return Err(GenerationError::UnsupportedMimeType {
                mime_type: mime_type.to_string(),
                allowed: SUPPORTED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            });
        }
        if data.is_empty() {
            return Err(GenerationError::InvalidUpload("file is empty".to_string()));
        }
        if matches!(mime_type, "image/heic" | "image/heif") {
            return Ok(None);
        }

        let img = image::load_from_memory(data)
            .map_err(|e| GenerationError::InvalidUpload(format!("Invalid image data: {}", e)))?;

        Ok(Some(img.dimensions()))
    }

    /// Downscales decodable images larger than the configured bound, re-encoding as PNG.
    ///
    /// Returns the (possibly unchanged) bytes and their MIME type.
    pub fn resize_if_needed(
        &self,
        mime_type: &str,
        data: &[u8],
    ) -> Result<(Vec<u8>, String), GenerationError> {
        if matches!(mime_type, "image/heic" | "image/heif") {
            return Ok((data.to_vec(), mime_type.to_string()));
        }

        let img = image::load_from_memory(data)
            .map_err(|e| GenerationError::InvalidUpload(format!("Failed to load image: {}", e)))?;

        let (width, height) = img.dimensions();
        let max_size = self.max_dimension;

        if width <= max_size && height <= max_size {
            return Ok((data.to_vec(), mime_type.to_string()));
        }

        let ratio = (max_size as f32 / width.max(height) as f32).min(1.0);
        let new_width = ((width as f32 * ratio) as u32).max(1);
        let new_height = ((height as f32 * ratio) as u32).max(1);

        let resized = img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3);

        let mut output = Vec::new();
        resized
            .write_to(&mut std::io::Cursor::new(&mut output), ImgFormat::Png)
            .map_err(|e| {
                GenerationError::InvalidUpload(format!("Failed to encode resized image: {}", e))
            })?;

        Ok((output, "image/png".to_string()))
    }

    /// Validates, downsizes, and wraps an uploaded file as a data URL.
    pub fn encode_upload(
        &self,
        mime_type: &str,
        data: &[u8],
    ) -> Result<(DataUrl, Option<(u32, u32)>), GenerationError> {
        let mime_type = normalize_mime(mime_type);
        self.validate_image(&mime_type, data)?;
        let (bytes, mime_type) = self.resize_if_needed(&mime_type, data)?;
        let dimensions = self.validate_image(&mime_type, &bytes)?;
        Ok((DataUrl::from_bytes(&mime_type, &bytes), dimensions))
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(width, height, Rgb([200, 40, 90]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), ImgFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn parses_mime_and_payload() {
        let url = DataUrl::parse("data:image/png;base64,AAAA").unwrap();
        assert_eq!(url.mime_type, "image/png");
        assert_eq!(url.data, "AAAA");
        assert_eq!(url.to_string(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn rejects_non_data_urls() {
        assert!(matches!(
            DataUrl::parse("https://example.com/a.png"),
            Err(GenerationError::InvalidImageFormat)
        ));
        assert!(matches!(
            DataUrl::parse("data:image/png;base64"),
            Err(GenerationError::InvalidImageFormat)
        ));
        assert!(matches!(
            DataUrl::parse("data:image/png;base64,"),
            Err(GenerationError::InvalidImageFormat)
        ));
    }

    #[test]
    fn allow_list_is_enforced() {
        for mime in SUPPORTED_MIME_TYPES {
            let url = DataUrl::parse(&format!("data:{};base64,AAAA", mime)).unwrap();
            assert!(url.ensure_supported().is_ok(), "{mime} should be allowed");
        }

        let gif = DataUrl::parse("data:image/gif;base64,R0lGOD").unwrap();
        match gif.ensure_supported() {
            Err(GenerationError::UnsupportedMimeType { mime_type, allowed }) => {
                assert_eq!(mime_type, "image/gif");
                assert_eq!(allowed.len(), SUPPORTED_MIME_TYPES.len());
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn declared_mime_case_is_preserved_and_checked_exactly() {
        let upper = DataUrl::parse("data:image/PNG;base64,AAAA").unwrap();
        assert_eq!(upper.mime_type, "image/PNG");
        match upper.ensure_supported() {
            Err(GenerationError::UnsupportedMimeType { mime_type, .. }) => {
                assert_eq!(mime_type, "image/PNG");
            }
            other => panic!("expected rejection, got {other:?}"),
        }

        let err = DataUrl::parse("data:image/GIF;base64,R0lGOD")
            .unwrap()
            .ensure_supported()
            .unwrap_err();
        assert!(err.to_string().contains("image/GIF"), "{err}");
    }

    #[test]
    fn blob_references_are_transient() {
        assert!(is_transient_reference("blob:http://localhost:3000/1234"));
        assert!(!is_transient_reference("https://cdn.example/a.png"));
        assert!(!is_transient_reference("data:image/png;base64,AAAA"));
    }

    #[test]
    fn from_bytes_round_trips() {
        let bytes = vec![0u8, 1, 2, 254, 255];
        let url = DataUrl::from_bytes("image/png", &bytes);
        let parsed = DataUrl::parse(&url.to_string()).unwrap();
        assert_eq!(parsed.decode().unwrap(), bytes);
    }

    #[test]
    fn validates_real_png() {
        let processor = ImageProcessor::new();
        let dims = processor.validate_image("image/png", &png_bytes(8, 4)).unwrap();
        assert_eq!(dims, Some((8, 4)));
    }

    #[test]
    fn rejects_garbage_bytes_for_decodable_types() {
        let processor = ImageProcessor::new();
        let err = processor.validate_image("image/png", b"not an image").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidUpload(_)));
    }

    #[test]
    fn heic_is_accepted_on_declared_type() {
        let processor = ImageProcessor::new();
        assert_eq!(processor.validate_image("image/heic", b"ftypheic").unwrap(), None);
    }

    #[test]
    fn oversized_images_are_downscaled_to_png() {
        let processor = ImageProcessor::with_max_dimension(16);
        let (bytes, mime) = processor.resize_if_needed("image/png", &png_bytes(64, 32)).unwrap();
        assert_eq!(mime, "image/png");
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.dimensions(), (16, 8));
    }

    #[test]
    fn encode_upload_produces_data_url() {
        let processor = ImageProcessor::new();
        let bytes = png_bytes(4, 4);
        let (url, dims) = processor.encode_upload("image/PNG", &bytes).unwrap();
        assert_eq!(url.mime_type, "image/png");
        assert_eq!(url.decode().unwrap(), bytes);
        assert_eq!(dims, Some((4, 4)));
    }
}
