//! Shared image decoding, normalization and resizing helpers.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use zune_core::{colorspace::ColorSpace, options::DecoderOptions};
use zune_jpeg::JpegDecoder;

fn looks_like_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0xff && bytes[1] == 0xd8
}

fn decode_jpeg_non_strict(bytes: &[u8]) -> Option<DynamicImage> {
    if !looks_like_jpeg(bytes) {
        return None;
    }

    let options = DecoderOptions::new_cmd()
        .set_strict_mode(false)
        .jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);
    let pixels = decoder.decode().ok()?;
    let (width, height) = decoder.dimensions()?;
    let image = image::RgbaImage::from_raw(width as u32, height as u32, pixels)?;
    Some(DynamicImage::ImageRgba8(image))
}

pub fn decode_image_from_memory_with_fallback(bytes: &[u8]) -> Option<DynamicImage> {
    // Primary decoder covers PNG/GIF/WebP/BMP; the lenient JPEG path catches
    // truncated or trailing-garbage JPEGs that some sources serve.
    image::load_from_memory(bytes)
        .ok()
        .or_else(|| decode_jpeg_non_strict(bytes))
}

pub fn decode_image_from_path_with_fallback(path: &Path) -> Option<DynamicImage> {
    image::open(path).ok().or_else(|| {
        let bytes = fs::read(path).ok()?;
        decode_image_from_memory_with_fallback(&bytes)
    })
}

pub fn image_dimensions_with_fallback(path: &Path) -> Option<(u32, u32)> {
    image::image_dimensions(path)
        .ok()
        .or_else(|| decode_image_from_path_with_fallback(path).map(|decoded| decoded.dimensions()))
}

/// True when the file fully decodes, not just when its header parses.
pub fn image_is_decodable(path: &Path) -> bool {
    decode_image_from_path_with_fallback(path).is_some()
}

/// Drops alpha by compositing onto white, the way JPEG output needs it.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    let mut flattened = RgbImage::from_pixel(rgba.width(), rgba.height(), Rgb([255, 255, 255]));
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u32::from(a);
        let blend = |channel: u8| -> u8 {
            ((u32::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        flattened.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    flattened
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Option<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100));
        encoder.encode_image(image).ok()?;
    }
    Some(cursor.into_inner())
}

/// Writes through a sibling temp file so a reader never sees half a JPEG.
pub fn write_atomic(target_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let temp_path = target_path.with_extension("jpg.tmp");
    if temp_path.exists() {
        let _ = fs::remove_file(&temp_path);
    }
    fs::write(&temp_path, bytes)?;
    fs::rename(&temp_path, target_path).inspect_err(|_| {
        let _ = fs::remove_file(&temp_path);
    })
}

/// Decodes arbitrary image bytes and stores them as a baseline JPEG.
pub fn normalize_to_jpeg(bytes: &[u8], target_path: &Path, quality: u8) -> Option<()> {
    let decoded = decode_image_from_memory_with_fallback(bytes)?;
    let encoded = encode_jpeg(&flatten_onto_white(&decoded), quality)?;
    write_atomic(target_path, &encoded).ok()
}

/// Exact resize to `width`×`height`, stepping down first for very large sources.
pub fn resize_exact(decoded: DynamicImage, width: u32, height: u32) -> DynamicImage {
    let target_w = width.max(1);
    let target_h = height.max(1);
    let mut current = decoded;
    let mut current_dims = current.dimensions();

    // Multi-stage reduction reduces aliasing on very high-resolution photos.
    while current_dims.0 > target_w.saturating_mul(4) && current_dims.1 > target_h.saturating_mul(4)
    {
        let next_w = (current_dims.0 / 2).max(target_w);
        let next_h = (current_dims.1 / 2).max(target_h);
        current = current.resize_exact(next_w, next_h, FilterType::Triangle);
        current_dims = current.dimensions();
    }

    if current_dims == (target_w, target_h) {
        return current;
    }
    current.resize_exact(target_w, target_h, FilterType::Lanczos3)
}
