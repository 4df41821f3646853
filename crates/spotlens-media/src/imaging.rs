//! Blocking image operations. Callers run these on the blocking pool.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::size::{TargetSize, fit_dimensions};

/// Default JPEG quality for cached blobs.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Decode JPEG or PNG bytes, sniffing the format from the content.
pub(crate) fn decode(bytes: &[u8]) -> Result<DynamicImage, String> {
    let format = image::guess_format(bytes).map_err(|e| e.to_string())?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(format!("unsupported format {format:?}"));
    }
    image::load_from_memory_with_format(bytes, format).map_err(|e| e.to_string())
}

/// Re-encode as RGB8 JPEG.
pub(crate) fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    DynamicImage::ImageRgb8(image.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| e.to_string())?;
    Ok(buf)
}

/// Resize to fit `target`, upscaling only when the target asks for it.
pub(crate) fn fit(image: &DynamicImage, target: TargetSize) -> DynamicImage {
    let (width, height) =
        fit_dimensions((image.width(), image.height()), target, target.allow_upscale);
    if (width, height) == (image.width(), image.height()) {
        return image.clone();
    }
    image.resize_exact(width, height, FilterType::Triangle)
}

/// Encode a solid test pattern; used by tests and the mock origin.
pub(crate) fn encode_pattern(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Cursor::new(Vec::new());
    // Writing an in-memory RGB8 buffer as PNG or JPEG cannot fail.
    let _ = DynamicImage::ImageRgb8(image).write_to(&mut buf, format);
    buf.into_inner()
}
