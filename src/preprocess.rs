use image::{imageops::FilterType, GenericImageView};
use ndarray::{Array, Array4};
use std::io::Cursor;
use thiserror::Error;

/// Model input edge length. Uploads of any size are resized to this.
pub const INPUT_SIZE: u32 = 512;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Failed to probe image format: {0}")]
    FormatProbe(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decodes uploaded bytes into a (1, 3, 512, 512) tensor with values in [0, 1].
///
/// The declared content type of the upload is ignored; the format is sniffed
/// from the bytes. Grayscale inputs are expanded to three channels and alpha
/// channels are dropped. Source dimensions are resized, never cropped.
pub fn decode_and_normalize(image_data: &[u8]) -> Result<Array4<f32>, PreprocessError> {
    let image_reader = image::ImageReader::new(Cursor::new(image_data)).with_guessed_format()?;
    let original_img = image_reader.decode()?;

    let img = original_img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);

    let size = INPUT_SIZE as usize;
    let mut input = Array::zeros((1, 3, size, size));
    for pixel in img.pixels() {
        let x = pixel.0 as usize;
        let y = pixel.1 as usize;
        let [r, g, b, _] = pixel.2 .0;
        input[[0, 0, y, x]] = (r as f32) / 255.;
        input[[0, 1, y, x]] = (g as f32) / 255.;
        input[[0, 2, y, x]] = (b as f32) / 255.;
    }

    Ok(input)
}
