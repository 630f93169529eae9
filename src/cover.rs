//! Playlist cover rendering.
//!
//! The face region is centre-cropped to a square on its shorter side, then
//! resized to the cover size. The result is encoded as JPEG, stepping quality
//! down until the base64 form fits the catalog's upload limit.

use crate::catalog::CatalogError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use log::debug;
use thiserror::Error;

pub const DEFAULT_COVER_SIZE: u32 = 300;

/// Upload limit for the base64-encoded payload.
pub const MAX_COVER_BASE64_BYTES: usize = 256 * 1024;

const QUALITY_STEPS: [u8; 5] = [95, 85, 75, 60, 45];

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("face region is empty")]
    EmptyImage,

    #[error("cover size must be positive")]
    InvalidSize,

    #[error("failed to encode cover: {0}")]
    Encode(#[from] image::ImageError),

    #[error("cover still {0} bytes after base64 at lowest quality")]
    TooLarge(usize),

    #[error("cover upload failed: {0}")]
    Upload(#[from] CatalogError),
}

/// Render `face` as a `size`×`size` JPEG cover.
///
/// # Errors
///
/// Fails on an empty image, a zero size, an encoder error, or when even the
/// lowest quality step exceeds [`MAX_COVER_BASE64_BYTES`].
pub fn render_cover(face: &DynamicImage, size: u32) -> Result<Vec<u8>, CoverError> {
    let square = fit_square(face, size)?;

    let mut last_len = 0;
    for quality in QUALITY_STEPS {
        let bytes = encode_jpeg(&square, quality)?;
        last_len = base64_len(bytes.len());
        if last_len <= MAX_COVER_BASE64_BYTES {
            debug!("Cover encoded at quality {quality}: {} bytes", bytes.len());
            return Ok(bytes);
        }
        debug!("Cover at quality {quality} is {last_len} bytes encoded, retrying lower");
    }

    Err(CoverError::TooLarge(last_len))
}

/// Centre-crop to a square on the shorter side, then resize to `size`.
///
/// Only the cropped square is ever resampled, so the working buffer never
/// exceeds `size`×`size` whatever the input's aspect ratio.
///
/// # Errors
///
/// [`CoverError::EmptyImage`] or [`CoverError::InvalidSize`].
pub fn fit_square(face: &DynamicImage, size: u32) -> Result<RgbImage, CoverError> {
    if size == 0 {
        return Err(CoverError::InvalidSize);
    }
    let (width, height) = face.dimensions();
    if width == 0 || height == 0 {
        return Err(CoverError::EmptyImage);
    }

    let side = width.min(height);
    let square = face.crop_imm((width - side) / 2, (height - side) / 2, side, side);

    Ok(square.resize_exact(size, size, FilterType::Lanczos3).to_rgb8())
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CoverError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(image)?;
    Ok(bytes)
}

/// Padded base64 length; saturates so an overflow reads as "too large".
fn base64_len(raw: usize) -> usize {
    base64::encoded_len(raw, true).unwrap_or(usize::MAX)
}
