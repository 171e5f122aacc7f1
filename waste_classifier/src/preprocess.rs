use crate::config::ModelConfig;
use image::{imageops::FilterType, ImageFormat, ImageReader, RgbImage};
use ndarray::Array4;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("no image was uploaded")]
    EmptyUpload,
    #[error("unsupported image format, upload a JPEG or PNG file")]
    UnsupportedFormat,
    #[error("error decoding image: {0}")]
    Decode(String),
}

/// Decodes uploaded bytes into an RGB buffer. Only JPEG and PNG are accepted.
pub fn decode_upload(bytes: &[u8]) -> Result<RgbImage, PreprocessError> {
    if bytes.is_empty() {
        return Err(PreprocessError::EmptyUpload);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PreprocessError::Decode(e.to_string()))?;

    match reader.format() {
        Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {}
        _ => return Err(PreprocessError::UnsupportedFormat),
    }

    let image = reader
        .decode()
        .map_err(|e| PreprocessError::Decode(e.to_string()))?;

    Ok(image.to_rgb8())
}

/// Resizes and normalizes an RGB image into the `[1, 3, H, W]` input tensor.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    input_size: u32,
    mean: [f32; 3],
    std: [f32; 3],
}

impl Preprocessor {
    pub fn new(input_size: u32, mean: [f32; 3], std: [f32; 3]) -> Self {
        Self {
            input_size,
            mean,
            std,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.input_size, config.mean, config.std)
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn to_tensor(&self, image: &RgbImage) -> Array4<f32> {
        let size = self.input_size;
        let resized = image::imageops::resize(image, size, size, FilterType::CatmullRom);

        let mut input = Array4::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for channel in 0..3 {
                let value = pixel.0[channel] as f32 / 255.;
                input[[0, channel, y, x]] = (value - self.mean[channel]) / self.std[channel];
            }
        }

        input
    }
}
