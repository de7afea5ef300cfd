//! Synthetic stand-in images for slots no source could fill.

use std::fs;
use std::path::PathBuf;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_ellipse_mut, draw_hollow_ellipse_mut, draw_line_segment_mut, draw_text_mut,
    text_size,
};
use log::{info, warn};

use crate::asset_store::ImageStore;
use crate::config::PlaceholderConfig;
use crate::error::AssetError;
use crate::image_category::ImageCategory;
use crate::image_pipeline;
use crate::species_catalog::Species;

const BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// Decoration coordinates are laid out on this canvas and scaled to the real one.
const LAYOUT_WIDTH: f32 = 400.0;
const LAYOUT_HEIGHT: f32 = 300.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const SHADOW: Rgb<u8> = Rgb([0, 0, 0]);
const OCEAN: Rgb<u8> = Rgb([0, 100, 150]);
const SHADOW_OFFSET: i32 = 2;

/// Baseline 8×8 mid-gray JPEG written when drawing or encoding fails.
pub const FALLBACK_JPEG: [u8; 159] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, // APP0
    0xFF, 0xDB, 0x00, 0x43, 0x00, // DQT, all ones
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, // 64 entries
    0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x08, 0x00, 0x08, 0x01, 0x01, 0x11, 0x00, // SOF0
    0xFF, 0xC4, 0x00, 0x14, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // DC table: one 1-bit code
    0xFF, 0xC4, 0x00, 0x14, 0x10, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // AC table: EOB only
    0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00, // SOS
    0x3F, // DC 0, EOB, padding
    0xFF, 0xD9,
];

/// Writes a placeholder for one slot.
pub trait PlaceholderRender {
    /// Returns the written path. Drawing problems never surface here; only a
    /// destination that cannot be written is an error.
    fn render(
        &self,
        store: &ImageStore,
        category: ImageCategory,
        entity_id: &str,
        caption: &str,
        index: usize,
    ) -> Result<PathBuf, AssetError>;
}

pub struct PlaceholderRenderer {
    width: u32,
    height: u32,
    caption_scale: PxScale,
    jpeg_quality: u8,
    font: Option<FontArc>,
}

impl PlaceholderRenderer {
    /// Loads the configured caption font, or the bundled face when none is set.
    pub fn new(config: &PlaceholderConfig) -> Result<Self, AssetError> {
        let font = match &config.font_path {
            Some(path) => {
                let bytes = fs::read(path).map_err(|err| AssetError::io(path, err))?;
                let font = FontArc::try_from_vec(bytes).map_err(|err| {
                    AssetError::Config(format!("Invalid caption font {}: {err}", path.display()))
                })?;
                Some(font)
            }
            None => FontArc::try_from_slice(BUNDLED_FONT)
                .inspect_err(|err| warn!("Bundled caption font unusable: {err}"))
                .ok(),
        };
        Ok(Self {
            width: config.width.max(1),
            height: config.height.max(1),
            caption_scale: PxScale::from(config.caption_scale_px.max(1.0)),
            jpeg_quality: config.jpeg_quality,
            font,
        })
    }

    /// Name shown on the first caption line.
    pub fn caption_subject(species: &Species, category: ImageCategory) -> &str {
        match category {
            ImageCategory::Scientific => &species.scientific_name,
            _ => &species.common_name,
        }
    }

    fn base_color(category: ImageCategory) -> Rgb<u8> {
        match category {
            ImageCategory::Natural => Rgb([70, 130, 180]),
            ImageCategory::Scientific => Rgb([147, 112, 219]),
            ImageCategory::Map => Rgb([32, 178, 170]),
            ImageCategory::Culinary => Rgb([255, 160, 122]),
        }
    }

    /// Full placeholder raster for `category` captioned with `caption`.
    pub fn draw(&self, category: ImageCategory, caption: &str) -> Result<RgbImage, AssetError> {
        let font = self
            .font
            .as_ref()
            .ok_or_else(|| AssetError::Render("No caption font available".to_string()))?;
        let mut canvas = self.background(category);
        self.decorate(&mut canvas, category);
        self.caption(&mut canvas, font, [caption.trim(), category.caption_tag()]);
        Ok(canvas)
    }

    fn background(&self, category: ImageCategory) -> RgbImage {
        let base = Self::base_color(category);
        if category != ImageCategory::Natural {
            return RgbImage::from_pixel(self.width, self.height, base);
        }
        // Darker at the top, full color at the bottom.
        let height = self.height as f32;
        RgbImage::from_fn(self.width, self.height, |_, y| {
            let factor = 0.6 + 0.4 * (y as f32 / height);
            Rgb(base.0.map(|channel| (channel as f32 * factor) as u8))
        })
    }

    /// Maps a layout-space bounding box to (center, radii) on the real canvas.
    fn ellipse(&self, left: f32, top: f32, right: f32, bottom: f32) -> ((i32, i32), i32, i32) {
        let sx = self.width as f32 / LAYOUT_WIDTH;
        let sy = self.height as f32 / LAYOUT_HEIGHT;
        let center = (
            ((left + right) / 2.0 * sx).round() as i32,
            ((top + bottom) / 2.0 * sy).round() as i32,
        );
        let radii = (
            ((right - left) / 2.0 * sx).round() as i32,
            ((bottom - top) / 2.0 * sy).round() as i32,
        );
        (center, radii.0.max(1), radii.1.max(1))
    }

    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.width as f32 / LAYOUT_WIDTH,
            y * self.height as f32 / LAYOUT_HEIGHT,
        )
    }

    fn decorate(&self, canvas: &mut RgbImage, category: ImageCategory) {
        match category {
            ImageCategory::Scientific => {
                let (center, rx, ry) = self.ellipse(50.0, 100.0, 350.0, 200.0);
                for inset in -1..=1 {
                    draw_hollow_ellipse_mut(canvas, center, rx + inset, ry + inset, WHITE);
                }
                for ((x0, y0), (x1, y1)) in [((100.0, 150.0), (80.0, 120.0)), ((300.0, 150.0), (320.0, 120.0))] {
                    let start = self.point(x0, y0);
                    let end = self.point(x1, y1);
                    draw_line_segment_mut(canvas, start, end, WHITE);
                    draw_line_segment_mut(canvas, (start.0 + 1.0, start.1), (end.0 + 1.0, end.1), WHITE);
                }
            }
            ImageCategory::Map => {
                for (left, top, right, bottom) in [(20.0, 50.0, 180.0, 150.0), (220.0, 100.0, 380.0, 200.0)] {
                    let (center, rx, ry) = self.ellipse(left, top, right, bottom);
                    draw_filled_ellipse_mut(canvas, center, rx, ry, OCEAN);
                    draw_hollow_ellipse_mut(canvas, center, rx, ry, WHITE);
                }
            }
            ImageCategory::Natural | ImageCategory::Culinary => {}
        }
    }

    /// Two centered lines, each drawn as an offset shadow then the light copy.
    fn caption(&self, canvas: &mut RgbImage, font: &FontArc, lines: [&str; 2]) {
        let line_height = self.caption_scale.y.ceil() as i32;
        let gap = (self.caption_scale.y * 0.25).round() as i32;
        let block_height = line_height * 2 + gap;
        let mut y = (self.height as i32 - block_height) / 2;

        for line in lines {
            if !line.is_empty() {
                let (text_width, _) = text_size(self.caption_scale, font, line);
                let x = (self.width as i32 - text_width as i32) / 2;
                draw_text_mut(
                    canvas,
                    SHADOW,
                    x + SHADOW_OFFSET,
                    y + SHADOW_OFFSET,
                    self.caption_scale,
                    font,
                    line,
                );
                draw_text_mut(canvas, WHITE, x, y, self.caption_scale, font, line);
            }
            y += line_height + gap;
        }
    }
}

impl PlaceholderRender for PlaceholderRenderer {
    fn render(
        &self,
        store: &ImageStore,
        category: ImageCategory,
        entity_id: &str,
        caption: &str,
        index: usize,
    ) -> Result<PathBuf, AssetError> {
        let target = store.image_path(category, entity_id, index);
        let encoded = self.draw(category, caption).and_then(|canvas| {
            image_pipeline::encode_jpeg(&canvas, self.jpeg_quality)
                .ok_or_else(|| AssetError::Render("JPEG encoding failed".to_string()))
        });
        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(
                    "[{}] {} placeholder {} falls back to minimal image: {}",
                    entity_id, category, index, error
                );
                FALLBACK_JPEG.to_vec()
            }
        };
        image_pipeline::write_atomic(&target, &bytes).map_err(|err| AssetError::io(&target, err))?;
        info!(
            "[{}] created {} placeholder {}",
            entity_id,
            category,
            target.display()
        );
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::{PlaceholderRender, PlaceholderRenderer, FALLBACK_JPEG};
    use crate::asset_store::ImageStore;
    use crate::config::PlaceholderConfig;
    use crate::image_category::ImageCategory;
    use crate::image_pipeline;
    use crate::species_catalog::Species;
    use image::Rgb;

    fn renderer() -> PlaceholderRenderer {
        PlaceholderRenderer::new(&PlaceholderConfig::default()).expect("bundled font should load")
    }

    #[test]
    fn test_placeholder_is_written_as_decodable_jpeg_at_slot_path() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = ImageStore::init(dir.path(), "assets/images", 90).expect("init should succeed");

        let path = renderer()
            .render(&store, ImageCategory::Culinary, "aji", "Horse Mackerel", 1)
            .expect("placeholder should be written");
        assert_eq!(path, dir.path().join("sushi").join("aji_sashimi.jpg"));
        assert_eq!(
            image::image_dimensions(&path).expect("placeholder should be readable"),
            (600, 400)
        );
    }

    #[test]
    fn test_natural_background_is_vertically_graded() {
        let canvas = renderer()
            .draw(ImageCategory::Natural, "")
            .expect("drawing should succeed");
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([42, 78, 108]));
        let bottom = canvas.get_pixel(0, 399);
        assert!(bottom.0[2] > 175, "bottom row should approach the base color");
    }

    #[test]
    fn test_map_placeholder_has_ocean_shapes_and_caption() {
        let canvas = renderer()
            .draw(ImageCategory::Map, "Pacific Saury")
            .expect("drawing should succeed");
        // Center of the first ellipse in layout space (100, 100).
        assert_eq!(*canvas.get_pixel(150, 133), Rgb([0, 100, 150]));
        assert_eq!(*canvas.get_pixel(5, 395), Rgb([32, 178, 170]));
        let has_white = canvas.pixels().any(|pixel| *pixel == Rgb([255, 255, 255]));
        assert!(has_white, "outline or caption should be drawn in white");
    }

    #[test]
    fn test_caption_subject_uses_scientific_name_for_diagrams() {
        let species = Species::new("Japanese Eel", "Anguilla japonica", "Unagi", "鰻");
        assert_eq!(
            PlaceholderRenderer::caption_subject(&species, ImageCategory::Scientific),
            "Anguilla japonica"
        );
        assert_eq!(
            PlaceholderRenderer::caption_subject(&species, ImageCategory::Culinary),
            "Japanese Eel"
        );
    }

    #[test]
    fn test_missing_font_falls_back_to_minimal_jpeg() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = ImageStore::init(dir.path(), "assets/images", 90).expect("init should succeed");
        let mut fontless = renderer();
        fontless.font = None;

        let path = fontless
            .render(&store, ImageCategory::Scientific, "uni", "Strongylocentrotus nudus", 0)
            .expect("fallback should still be written");
        let bytes = std::fs::read(&path).expect("fallback should exist");
        assert_eq!(bytes, FALLBACK_JPEG.to_vec());
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
        assert_eq!(
            image::image_dimensions(&path).expect("fallback should decode"),
            (8, 8)
        );
        assert!(image_pipeline::image_is_decodable(&path));
    }

    #[test]
    fn test_unreadable_custom_font_is_a_config_error() {
        let config = PlaceholderConfig {
            font_path: Some("/definitely/missing/font.ttf".into()),
            ..PlaceholderConfig::default()
        };
        assert!(PlaceholderRenderer::new(&config).is_err());
    }
}
