//! Uniform resize pass and broken-image repair over the category folders.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{debug, info, warn};

use crate::asset_store::ImageStore;
use crate::error::AssetError;
use crate::image_category::ImageCategory;
use crate::image_pipeline;
use crate::placeholder_renderer::PlaceholderRender;
use crate::sources::{CommonsAdapter, ImageQuery, SlotRange, SourceAdapter, SourceContext};
use crate::species_catalog::Species;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeSummary {
    pub resized: usize,
    pub unchanged: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairSummary {
    pub redownloaded: usize,
    pub placeholders: usize,
    pub skipped: usize,
}

fn is_jpeg_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg"))
        .unwrap_or(false)
}

/// `.jpg` files directly inside a category folder, sorted.
pub fn collect_category_images(store: &ImageStore, category: ImageCategory) -> Vec<PathBuf> {
    let folder = store.folder(category);
    let entries = match std::fs::read_dir(&folder) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("Failed to read directory {}: {}", folder.display(), err);
            return Vec::new();
        }
    };

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                debug!(
                    "Failed to read a directory entry in {}: {}",
                    folder.display(),
                    err
                );
                None
            }
        })
        .filter(|path| path.is_file() && is_jpeg_file(path))
        .collect();
    images.sort_unstable();
    images
}

/// Rewrites one file at exactly `width`×`height`. Returns `false` when the
/// file already had that size and was left untouched.
pub fn resize_file(path: &Path, width: u32, height: u32, quality: u8) -> Result<bool, AssetError> {
    if image_pipeline::image_dimensions_with_fallback(path) == Some((width, height)) {
        return Ok(false);
    }
    let decoded = image_pipeline::decode_image_from_path_with_fallback(path)
        .ok_or_else(|| AssetError::Undecodable(path.to_path_buf()))?;
    let flattened = DynamicImage::ImageRgb8(image_pipeline::flatten_onto_white(&decoded));
    let resized = image_pipeline::resize_exact(flattened, width, height).to_rgb8();
    let encoded = image_pipeline::encode_jpeg(&resized, quality)
        .ok_or_else(|| AssetError::Encode(path.to_path_buf()))?;
    image_pipeline::write_atomic(path, &encoded).map_err(|err| AssetError::io(path, err))?;
    Ok(true)
}

/// Resizes every image in the four category folders. Per-file failures are
/// logged and counted, never fatal.
pub fn resize_all(store: &ImageStore, width: u32, height: u32, quality: u8) -> ResizeSummary {
    let mut summary = ResizeSummary::default();
    info!("Resizing all images to {width}x{height}");
    for category in ImageCategory::ALL {
        for path in collect_category_images(store, category) {
            match resize_file(&path, width, height, quality) {
                Ok(true) => {
                    debug!("Resized {}", path.display());
                    summary.resized += 1;
                }
                Ok(false) => summary.unchanged += 1,
                Err(error) => {
                    warn!("Resize skipped: {}", error);
                    summary.failed += 1;
                }
            }
        }
    }
    info!(
        "Resize complete: {} resized, {} already {}x{}, {} failed",
        summary.resized, summary.unchanged, width, height, summary.failed
    );
    summary
}

/// Images in the category folders that do not decode.
pub fn find_broken_images(store: &ImageStore) -> Vec<(ImageCategory, PathBuf)> {
    ImageCategory::ALL
        .into_iter()
        .flat_map(|category| {
            collect_category_images(store, category)
                .into_iter()
                .filter(|path| !image_pipeline::image_is_decodable(path))
                .map(move |path| (category, path))
        })
        .collect()
}

/// `"horse_mackerel"` → `"Horse Mackerel"`.
pub fn title_case_id(entity_id: &str) -> String {
    entity_id
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            let Some(first) = chars.next() else {
                return String::new();
            };
            let mut out = String::new();
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
            out
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replaces each undecodable image with a fresh media-search download, or a
/// placeholder when none can be found. Only an unwritable folder is fatal.
pub fn repair_broken_images(
    context: &SourceContext<'_>,
    renderer: &dyn PlaceholderRender,
) -> Result<RepairSummary, AssetError> {
    let mut summary = RepairSummary::default();
    let broken = find_broken_images(context.store);
    info!("Found {} broken image(s)", broken.len());

    for (category, path) in broken {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            summary.skipped += 1;
            continue;
        };
        let Some((entity_id, index)) = category.parse_file_name(file_name) else {
            warn!("Cannot tell which slot {} belongs to", path.display());
            summary.skipped += 1;
            continue;
        };

        let display_name = title_case_id(&entity_id);
        let term = format!(
            "{} {}",
            entity_id.replace('_', " "),
            category.search_keywords()
        );
        let species = Species::new(&display_name, "", "", "");
        let query = ImageQuery {
            entity_id: &entity_id,
            species: &species,
            category,
        };
        let downloaded = CommonsAdapter::with_terms(vec![term])
            .attempt(
                context,
                &query,
                SlotRange {
                    start: index,
                    remaining: 1,
                },
            )
            .inspect_err(|error| debug!("[{}] replacement search failed: {}", entity_id, error))
            .unwrap_or_default();

        if downloaded.is_empty() {
            renderer.render(context.store, category, &entity_id, &display_name, index)?;
            info!("[{}] replaced {} with a placeholder", entity_id, file_name);
            summary.placeholders += 1;
        } else {
            info!("[{}] downloaded replacement for {}", entity_id, file_name);
            summary.redownloaded += 1;
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::{
        collect_category_images, find_broken_images, repair_broken_images, resize_all,
        resize_file, title_case_id, RepairSummary, ResizeSummary,
    };
    use crate::asset_store::ImageStore;
    use crate::config::PlaceholderConfig;
    use crate::http_session::testing::ScriptedFetch;
    use crate::image_category::ImageCategory;
    use crate::placeholder_renderer::PlaceholderRenderer;
    use crate::sources::test_support::png_bytes;
    use crate::sources::{SourceContext, COMMONS_API_URL};
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use serde_json::json;
    use std::time::Duration;

    fn write_png(path: &std::path::Path, width: u32, height: u32) {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 128])))
            .save_with_format(path, ImageFormat::Png)
            .expect("fixture should be written");
    }

    #[test]
    fn test_resize_is_a_no_op_on_second_pass() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("aji_natural_1.jpg");
        write_png(&path, 1000, 500);

        assert!(resize_file(&path, 400, 300, 90).expect("resize should succeed"));
        assert_eq!(
            image::image_dimensions(&path).expect("resized file should be readable"),
            (400, 300)
        );
        let first_pass = std::fs::read(&path).expect("resized file should exist");

        assert!(!resize_file(&path, 400, 300, 90).expect("second pass should succeed"));
        assert_eq!(std::fs::read(&path).expect("file should exist"), first_pass);
    }

    #[test]
    fn test_resize_all_counts_outcomes_and_skips_broken_files() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = ImageStore::init(dir.path(), "assets/images", 90).expect("init should succeed");
        write_png(&store.image_path(ImageCategory::Natural, "aji", 0), 64, 64);
        write_png(&store.image_path(ImageCategory::Map, "aji", 0), 400, 300);
        std::fs::write(store.image_path(ImageCategory::Culinary, "aji", 0), b"garbage")
            .expect("fixture should be written");
        std::fs::write(store.folder(ImageCategory::Culinary).join("notes.txt"), b"ignored")
            .expect("fixture should be written");

        let summary = resize_all(&store, 400, 300, 90);
        assert_eq!(
            summary,
            ResizeSummary {
                resized: 1,
                unchanged: 1,
                failed: 1
            }
        );
    }

    #[test]
    fn test_collect_category_images_is_sorted_and_jpg_only() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = ImageStore::init(dir.path(), "assets/images", 90).expect("init should succeed");
        let folder = store.folder(ImageCategory::Natural);
        for name in ["b_natural_1.jpg", "a_natural_1.JPG", "c.png"] {
            std::fs::write(folder.join(name), b"x").expect("fixture should be written");
        }
        let names: Vec<String> = collect_category_images(&store, ImageCategory::Natural)
            .iter()
            .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["a_natural_1.JPG", "b_natural_1.jpg"]);
    }

    #[test]
    fn test_title_case_id() {
        assert_eq!(title_case_id("horse_mackerel"), "Horse Mackerel");
        assert_eq!(title_case_id("uni"), "Uni");
    }

    #[test]
    fn test_repair_redownloads_or_draws_placeholder() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = ImageStore::init(dir.path(), "assets/images", 90).expect("init should succeed");
        let salmon_map = store.image_path(ImageCategory::Map, "atlantic_salmon", 0);
        let tuna_diagram = store.image_path(ImageCategory::Scientific, "bluefin_tuna", 0);
        std::fs::write(&salmon_map, b"truncated").expect("fixture should be written");
        std::fs::write(&tuna_diagram, b"truncated").expect("fixture should be written");
        write_png(&store.image_path(ImageCategory::Natural, "aji", 0), 10, 10);
        assert_eq!(find_broken_images(&store).len(), 2);

        let search = "filetype:bitmap atlantic salmon distribution range map";
        let http = ScriptedFetch::default()
            .with_json(
                &ScriptedFetch::json_key(
                    COMMONS_API_URL,
                    &[
                        ("action", "query"),
                        ("format", "json"),
                        ("list", "search"),
                        ("srsearch", search),
                        ("srnamespace", "6"),
                        ("srlimit", "5"),
                    ],
                ),
                json!({"query": {"search": [{"title": "File:Salmon range.png"}]}}),
            )
            .with_json(
                &ScriptedFetch::json_key(
                    COMMONS_API_URL,
                    &[
                        ("action", "query"),
                        ("format", "json"),
                        ("titles", "File:Salmon range.png"),
                        ("prop", "imageinfo"),
                        ("iiprop", "url"),
                        ("iiurlwidth", "800"),
                    ],
                ),
                json!({"query": {"pages": {"1": {"imageinfo": [{"url": "https://upload/range.png"}]}}}}),
            )
            .with_payload("https://upload/range.png", png_bytes(), "image/png");
        let context = SourceContext {
            http: &http,
            store: &store,
            after_download: Duration::ZERO,
        };
        let renderer = PlaceholderRenderer::new(&PlaceholderConfig::default())
            .expect("renderer should load");

        let summary = repair_broken_images(&context, &renderer).expect("repair should succeed");
        assert_eq!(
            summary,
            RepairSummary {
                redownloaded: 1,
                placeholders: 1,
                skipped: 0
            }
        );
        assert!(find_broken_images(&store).is_empty());
        assert_eq!(
            image::image_dimensions(&salmon_map).expect("replacement should decode"),
            (8, 6)
        );
    }
}
