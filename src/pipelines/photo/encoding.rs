// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding for preview snapshots
//!
//! Still captures arrive from the device already JPEG encoded. Only the
//! fallback path, which grabs the pixels rendered on the preview surface,
//! needs to encode on our side.

use crate::backends::camera::Bitmap;
use crate::constants::JPEG_QUALITY;
use crate::errors::PhotoError;
use image::{DynamicImage, RgbImage, RgbaImage};
use tracing::debug;

/// Encoded image data ready for saving
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// JPEG encoder with a fixed quality
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    quality: u8,
}

impl PhotoEncoder {
    /// Encoder at the quality stamped on capture requests
    pub fn new() -> Self {
        Self {
            quality: JPEG_QUALITY,
        }
    }

    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode an RGBA bitmap, dropping the alpha channel
    pub fn encode_bitmap(&self, bitmap: &Bitmap) -> Result<EncodedImage, PhotoError> {
        if !bitmap.is_valid() {
            return Err(PhotoError::EncodingFailed(format!(
                "Invalid bitmap {}x{} with {} bytes",
                bitmap.width,
                bitmap.height,
                bitmap.rgba.len()
            )));
        }

        let rgba = RgbaImage::from_raw(bitmap.width, bitmap.height, bitmap.rgba.clone())
            .ok_or_else(|| PhotoError::EncodingFailed("Bitmap buffer too small".to_string()))?;
        let rgb = DynamicImage::ImageRgba8(rgba).into_rgb8();

        self.encode_rgb(&rgb)
    }

    /// Encode an RGB image
    pub fn encode_rgb(&self, image: &RgbImage) -> Result<EncodedImage, PhotoError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, self.quality);
        encoder.encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )?;

        debug!(
            width = image.width(),
            height = image.height(),
            size = buffer.len(),
            "JPEG encoding complete"
        );

        Ok(EncodedImage {
            data: buffer,
            width: image.width(),
            height: image.height(),
        })
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}
