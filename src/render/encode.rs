//! Output encoding and content types.

use crate::{Error, Result};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// 1x1 fully transparent PNG served when even the placeholder cannot be
/// rendered.
pub const EMPTY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x01, 0x03, 0x00, 0x00, 0x00, 0x25, 0xDB, 0x56,
    0xCA, 0x00, 0x00, 0x00, 0x03, 0x50, 0x4C, 0x54, 0x45, 0x00, 0x00, 0x00, 0xA7, 0x7A, 0x3D, 0xDA,
    0x00, 0x00, 0x00, 0x01, 0x74, 0x52, 0x4E, 0x53, 0x00, 0x40, 0xE6, 0xD8, 0x66, 0x00, 0x00, 0x00,
    0x0A, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0x60, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0xE2,
    0x21, 0xBC, 0x33, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub fn format_for_extension(extension: &str) -> Result<ImageFormat> {
    ImageFormat::from_extension(extension)
        .ok_or_else(|| Error::UnsupportedFormat(extension.to_string()))
}

pub fn content_type_for_extension(extension: &str) -> &'static str {
    ImageFormat::from_extension(extension)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}

/// Encode `image` as `format`. JPEG has no alpha channel, so it is encoded
/// from an RGB8 copy.
pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);

    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, format)?,
        _ => image.write_to(&mut cursor, format)?,
    }

    Ok(bytes)
}
