// src/services/encoder.rs
use base64::{Engine as _, engine::general_purpose};
use image::{GenericImageView, ImageFormat, imageops::FilterType};

use crate::errors::MermaiderError;
use crate::models::UploadedImage;

/// Hard cap on source dimensions; anything larger is rejected outright.
const MAX_SOURCE_DIM: u32 = 4096;
/// Uploads are downscaled to this bound so the base64 payload stays within
/// vision request limits.
const MAX_UPLOAD_DIM: u32 = 2048;

/// Base64 form of a sketch as inlined into the vision request.
#[derive(Debug, Clone)]
pub struct TransportPayload {
    pub data: String,
    pub media_type: String,
}

pub struct ImageEncoder;

impl ImageEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Decodes an upload, rejects undecodable or oversized content, and
    /// downscales anything beyond `MAX_UPLOAD_DIM`. Returns the bytes to keep
    /// plus their media type (re-encoded as PNG when downscaled).
    pub fn prepare(
        &self,
        data: &[u8],
        declared_type: &str,
    ) -> Result<(Vec<u8>, String), MermaiderError> {
        let img = image::load_from_memory(data)
            .map_err(|e| MermaiderError::Encoding(format!("undecodable image: {}", e)))?;

        let (width, height) = img.dimensions();
        if width > MAX_SOURCE_DIM || height > MAX_SOURCE_DIM {
            return Err(MermaiderError::Encoding(format!(
                "image dimensions {}x{} exceed {}x{}",
                width, height, MAX_SOURCE_DIM, MAX_SOURCE_DIM
            )));
        }

        if width <= MAX_UPLOAD_DIM && height <= MAX_UPLOAD_DIM {
            return Ok((data.to_vec(), declared_type.to_string()));
        }

        // resize() keeps aspect ratio within the given bounds.
        let resized = img.resize(MAX_UPLOAD_DIM, MAX_UPLOAD_DIM, FilterType::Lanczos3);
        let mut output = Vec::new();
        resized
            .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
            .map_err(|e| {
                MermaiderError::Encoding(format!("failed to re-encode resized image: {}", e))
            })?;
        Ok((output, "image/png".to_string()))
    }

    /// Transport encoding for the generation request. Pure and deterministic.
    pub fn encode(&self, image: &UploadedImage) -> Result<TransportPayload, MermaiderError> {
        if image.data.is_empty() {
            return Err(MermaiderError::Encoding("empty image payload".to_string()));
        }
        Ok(TransportPayload {
            data: general_purpose::STANDARD.encode(&image.data),
            media_type: image.content_type.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn upload(data: Vec<u8>) -> UploadedImage {
        UploadedImage {
            identity: "sketch.png:1:0".into(),
            filename: "sketch.png".into(),
            content_type: "image/png".into(),
            size: data.len(),
            data: Bytes::from(data),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn prepare_accepts_valid_png_unchanged() {
        let encoder = ImageEncoder::new();
        let data = png_bytes(8, 8);
        let (kept, media_type) = encoder.prepare(&data, "image/png").unwrap();
        assert_eq!(kept, data);
        assert_eq!(media_type, "image/png");
    }

    #[test]
    fn prepare_rejects_garbage() {
        let encoder = ImageEncoder::new();
        let err = encoder.prepare(b"not an image", "image/png").unwrap_err();
        assert!(matches!(err, MermaiderError::Encoding(_)));
    }

    #[test]
    fn prepare_downscales_large_images() {
        let encoder = ImageEncoder::new();
        let data = png_bytes(MAX_UPLOAD_DIM + 100, 64);
        let (kept, media_type) = encoder.prepare(&data, "image/jpeg").unwrap();
        assert_eq!(media_type, "image/png");
        let (w, h) = image::load_from_memory(&kept).unwrap().dimensions();
        assert!(w <= MAX_UPLOAD_DIM && h <= MAX_UPLOAD_DIM);
    }

    #[test]
    fn encode_rejects_empty_payload() {
        let encoder = ImageEncoder::new();
        let err = encoder.encode(&upload(Vec::new())).unwrap_err();
        assert!(matches!(err, MermaiderError::Encoding(_)));
    }

    #[test]
    fn encode_is_deterministic_base64() {
        let encoder = ImageEncoder::new();
        let image = upload(b"abc".to_vec());
        let a = encoder.encode(&image).unwrap();
        let b = encoder.encode(&image).unwrap();
        assert_eq!(a.data, b.data);
        assert_eq!(a.data, "YWJj");
        assert_eq!(a.media_type, "image/png");
    }
}
