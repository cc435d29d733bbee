//! Fixed-size image resizing.

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

/// Target edge length for derived images. Both axes are forced to this,
/// stretching or squashing the source as needed.
pub const PHOTO_SIZE: u32 = 500;

#[derive(Debug, thiserror::Error)]
pub enum ResizeError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Select an appropriate filter type based on the resize ratio. Heavier
/// downscales tolerate cheaper filters.
fn select_filter(
    orig_width: u32,
    orig_height: u32,
    new_width: u32,
    new_height: u32,
) -> image::imageops::FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        image::imageops::FilterType::Triangle
    } else if max_ratio > 1.5 {
        image::imageops::FilterType::CatmullRom
    } else {
        image::imageops::FilterType::Lanczos3
    }
}

fn decode(data: &[u8]) -> Result<(DynamicImage, ImageFormat), ResizeError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ResizeError::Decode(e.to_string()))?;
    let format = reader.format().unwrap_or(ImageFormat::Jpeg);
    let img = reader
        .decode()
        .map_err(|e| ResizeError::Decode(e.to_string()))?;
    Ok((img, format))
}

/// Resize an image to exactly `width` x `height`, ignoring aspect ratio, and
/// re-encode it in its source format. This is CPU-bound; callers on an async
/// runtime should run it on the blocking pool.
pub fn resize_to_exact(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ResizeError> {
    let (img, format) = decode(data)?;
    let (orig_width, orig_height) = img.dimensions();

    let filter = select_filter(orig_width, orig_height, width, height);
    let resized = img.resize_exact(width, height, filter);

    // JPEG has no alpha channel; flatten before encoding
    let resized = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => resized,
    };

    let mut out = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut out), format)
        .map_err(|e| ResizeError::Encode(e.to_string()))?;
    Ok(out)
}

/// Decode and return image dimensions, if the data is a valid image.
pub fn dimensions(data: &[u8]) -> Option<(u32, u32)> {
    decode(data).ok().map(|(img, _)| img.dimensions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        let img = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
            _ => DynamicImage::ImageRgba8(img),
        };
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    #[test]
    fn test_resize_png_to_exact_square() {
        let data = test_image(800, 600, ImageFormat::Png);
        let resized = resize_to_exact(&data, PHOTO_SIZE, PHOTO_SIZE).unwrap();
        assert_eq!(dimensions(&resized), Some((500, 500)));
    }

    #[test]
    fn test_resize_jpeg_keeps_format() {
        let data = test_image(1024, 256, ImageFormat::Jpeg);
        let resized = resize_to_exact(&data, PHOTO_SIZE, PHOTO_SIZE).unwrap();
        assert_eq!(dimensions(&resized), Some((500, 500)));

        let reader = ImageReader::new(Cursor::new(&resized))
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_upscales_small_image() {
        // Aspect ratio is not preserved and small sources are stretched up
        let data = test_image(100, 100, ImageFormat::Png);
        let resized = resize_to_exact(&data, PHOTO_SIZE, PHOTO_SIZE).unwrap();
        assert_eq!(dimensions(&resized), Some((500, 500)));
    }

    #[test]
    fn test_resize_rejects_garbage() {
        let result = resize_to_exact(b"not an image", PHOTO_SIZE, PHOTO_SIZE);
        assert!(matches!(result, Err(ResizeError::Decode(_))));
    }

    #[test]
    fn test_filter_selection_by_ratio() {
        use image::imageops::FilterType;
        assert_eq!(select_filter(2000, 2000, 500, 500), FilterType::Triangle);
        assert_eq!(select_filter(900, 900, 500, 500), FilterType::CatmullRom);
        assert_eq!(select_filter(600, 600, 500, 500), FilterType::Lanczos3);
    }
}
