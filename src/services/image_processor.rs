// src/services/image_processor.rs
use crate::errors::UploadError;
use crate::models::FileBlob;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat as ImgFormat};
use image::codecs::jpeg::JpegEncoder;

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Target dimensions for a downscale to `max_width`, keeping aspect ratio.
    pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
        if width <= max_width || max_width == 0 {
            return (width, height);
        }

        let new_height = (height as f64 * max_width as f64 / width as f64).round() as u32;
        (max_width, new_height.max(1))
    }

    /// Decodes `file`, shrinks it to at most `max_width` pixels wide and
    /// re-encodes it. The filename only changes when the type does.
    pub fn compress(
        &self,
        file: &FileBlob,
        max_width: u32,
        quality: f32,
    ) -> Result<FileBlob, UploadError> {
        let img = image::load_from_memory(&file.data)
            .map_err(|e| UploadError::Decode(format!("Failed to load image: {}", e)))?;

        let (width, height) = img.dimensions();
        let (new_width, new_height) = Self::target_dimensions(width, height, max_width);

        let img = if (new_width, new_height) != (width, height) {
            img.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
        } else {
            img
        };

        let (data, content_type) = match file.content_type.as_str() {
            "image/png" => (Self::encode_as(&img, ImgFormat::Png)?, "image/png"),
            "image/gif" => (Self::encode_as(&img, ImgFormat::Gif)?, "image/gif"),
            // lossless only; quality does not apply
            "image/webp" => (Self::encode_as(&img, ImgFormat::WebP)?, "image/webp"),
            _ => (Self::encode_jpeg(&img, quality)?, "image/jpeg"),
        };

        let filename = if content_type == file.content_type {
            file.filename.clone()
        } else {
            Self::jpeg_filename(&file.filename)
        };

        log::debug!(
            "Compressed {} from {}x{} to {}x{} ({} -> {} bytes)",
            file.filename,
            width,
            height,
            new_width,
            new_height,
            file.size(),
            data.len()
        );

        Ok(FileBlob::new(filename, content_type, data))
    }

    /// Swaps the extension so hosts that name files after the upload serve
    /// the right type.
    fn jpeg_filename(filename: &str) -> String {
        let path = std::path::Path::new(filename);
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
                filename.to_string()
            }
            _ => path.with_extension("jpg").to_string_lossy().into_owned(),
        }
    }

    fn encode_as(img: &DynamicImage, format: ImgFormat) -> Result<Vec<u8>, UploadError> {
        let mut output = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut output), format)
            .map_err(|e| UploadError::Decode(format!("Failed to encode image: {}", e)))?;
        Ok(output)
    }

    fn encode_jpeg(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, UploadError> {
        let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
        let rgb = img.to_rgb8();

        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, quality)
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| UploadError::Decode(format!("Failed to encode JPEG: {}", e)))?;
        Ok(output)
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}
