use base64::{engine::general_purpose::STANDARD, Engine};
use image::GrayImage;
use ndarray::Array2;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Mask buffer does not match its declared dimensions")]
    InvalidBuffer,
    #[error("Failed to encode mask as PNG: {0}")]
    Png(#[from] image::ImageError),
}

/// Losslessly encodes a binary mask as a single-channel PNG.
pub fn mask_to_png(mask: &Array2<u8>) -> Result<Vec<u8>, EncodeError> {
    let (height, width) = mask.dim();
    let pixels: Vec<u8> = mask.iter().copied().collect();
    let img = GrayImage::from_raw(width as u32, height as u32, pixels)
        .ok_or(EncodeError::InvalidBuffer)?;

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)?;

    Ok(buffer.into_inner())
}

/// PNG-encodes a binary mask and wraps it in standard base64 for transport.
pub fn mask_to_base64(mask: &Array2<u8>) -> Result<String, EncodeError> {
    let png = mask_to_png(mask)?;
    Ok(STANDARD.encode(png))
}
