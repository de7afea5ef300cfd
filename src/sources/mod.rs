//! Image source adapters.
//!
//! Every adapter answers one question: given a species and a category, which
//! image files could you save for the next `remaining` slots? Failures stay
//! inside the adapter boundary and come back as a [`SourceError`], which the
//! acquisition pipeline treats exactly like an empty result.

mod commons;
mod gbif;
mod inaturalist;
mod page_scrape;

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};

use crate::asset_store::ImageStore;
use crate::config::pause;
use crate::error::SourceError;
use crate::http_session::HttpFetch;
use crate::image_category::ImageCategory;
use crate::species_catalog::Species;

pub use commons::{CommonsAdapter, SearchSubject};
#[cfg(test)]
pub use commons::COMMONS_API_URL;
pub use gbif::{GbifAdapter, GbifMode};
pub use inaturalist::INaturalistAdapter;
pub use page_scrape::PageScrapeAdapter;

/// What is being looked for.
#[derive(Debug, Clone, Copy)]
pub struct ImageQuery<'a> {
    pub entity_id: &'a str,
    pub species: &'a Species,
    pub category: ImageCategory,
}

/// The contiguous block of slots an adapter may fill: `start..start + remaining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub start: usize,
    pub remaining: usize,
}

/// Collaborators shared by all adapters during one run.
pub struct SourceContext<'a> {
    pub http: &'a dyn HttpFetch,
    pub store: &'a ImageStore,
    pub after_download: Duration,
}

pub trait SourceAdapter {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Tries to fill up to `slots.remaining` slots starting at `slots.start`.
    ///
    /// Returns the paths actually written, in slot order. An `Err` means the
    /// source could not be consulted at all; partial progress is reported as
    /// `Ok` with fewer paths than requested.
    fn attempt(
        &self,
        context: &SourceContext<'_>,
        query: &ImageQuery<'_>,
        slots: SlotRange,
    ) -> Result<Vec<PathBuf>, SourceError>;
}

/// Downloads candidate URLs in order into consecutive slots until `slots` is
/// full. Individual download failures are logged and skipped.
pub(crate) fn save_candidate_urls<I>(
    source_name: &str,
    context: &SourceContext<'_>,
    query: &ImageQuery<'_>,
    slots: SlotRange,
    urls: I,
) -> Vec<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut saved = Vec::new();
    for url in urls {
        if saved.len() >= slots.remaining {
            break;
        }
        let index = slots.start + saved.len();
        let result = context.http.get_payload(&url).and_then(|payload| {
            context
                .store
                .save_candidate(&payload, query.category, query.entity_id, index)
        });
        match result {
            Ok(path) => {
                info!(
                    "[{}] saved {} image {} from {}",
                    query.entity_id, query.category, index, source_name
                );
                saved.push(path);
                pause(context.after_download);
            }
            Err(error) => {
                debug!(
                    "[{}] {} candidate rejected ({}): {}",
                    query.entity_id, source_name, url, error
                );
            }
        }
    }
    saved
}

/// Priority-ordered adapters for one category.
pub fn default_chain(category: ImageCategory) -> Vec<Box<dyn SourceAdapter>> {
    match category {
        ImageCategory::Natural => vec![
            Box::new(CommonsAdapter::new(vec![
                SearchSubject::CommonName,
                SearchSubject::ScientificName,
            ])),
            Box::new(PageScrapeAdapter::fishbase_photos()),
            Box::new(GbifAdapter::new(GbifMode::OccurrencePhotos)),
            Box::new(INaturalistAdapter::new()),
        ],
        ImageCategory::Scientific => vec![
            Box::new(PageScrapeAdapter::fishbase_diagrams()),
            Box::new(CommonsAdapter::new(vec![SearchSubject::ScientificName])),
            Box::new(CommonsAdapter::new(vec![SearchSubject::CommonName])),
        ],
        ImageCategory::Map => vec![
            Box::new(PageScrapeAdapter::fishbase_maps()),
            Box::new(GbifAdapter::new(GbifMode::DensityMap)),
            Box::new(CommonsAdapter::new(vec![SearchSubject::ScientificName])),
        ],
        ImageCategory::Culinary => vec![Box::new(CommonsAdapter::new(vec![
            SearchSubject::CommonName,
            SearchSubject::Romaji,
        ]))],
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    use crate::species_catalog::Species;

    pub fn tuna() -> Species {
        Species::new("Bluefin Tuna", "Thunnus thynnus", "Kuro-maguro", "黒鮪")
    }

    pub fn png_bytes() -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 6, Rgb([30, 60, 90])))
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("png encoding should succeed");
        cursor.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::{default_chain, save_candidate_urls, ImageQuery, SlotRange, SourceContext};
    use crate::asset_store::ImageStore;
    use crate::http_session::testing::ScriptedFetch;
    use crate::image_category::ImageCategory;
    use crate::sources::test_support::{png_bytes, tuna};
    use std::time::Duration;

    #[test]
    fn test_default_chains_follow_priority_order() {
        let names = |category| {
            default_chain(category)
                .iter()
                .map(|adapter| adapter.name().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            names(ImageCategory::Natural),
            vec![
                "Wikimedia Commons",
                "FishBase photos",
                "GBIF occurrences",
                "iNaturalist"
            ]
        );
        assert_eq!(names(ImageCategory::Scientific)[0], "FishBase diagrams");
        assert_eq!(names(ImageCategory::Map)[1], "GBIF density map");
        assert_eq!(names(ImageCategory::Culinary).len(), 1);
    }

    #[test]
    fn test_save_candidate_urls_skips_failures_and_stops_when_full() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = ImageStore::init(dir.path(), "assets/images", 90).expect("init should succeed");
        let http = ScriptedFetch::default()
            .with_payload("https://img/html", b"<html/>".to_vec(), "text/html")
            .with_payload("https://img/a", png_bytes(), "image/png")
            .with_payload("https://img/b", png_bytes(), "image/png")
            .with_payload("https://img/c", png_bytes(), "image/png");
        let context = SourceContext {
            http: &http,
            store: &store,
            after_download: Duration::ZERO,
        };
        let species = tuna();
        let query = ImageQuery {
            entity_id: "bluefin_tuna",
            species: &species,
            category: ImageCategory::Natural,
        };

        let saved = save_candidate_urls(
            "test",
            &context,
            &query,
            SlotRange {
                start: 0,
                remaining: 2,
            },
            [
                "https://img/missing".to_string(),
                "https://img/html".to_string(),
                "https://img/a".to_string(),
                "https://img/b".to_string(),
                "https://img/c".to_string(),
            ],
        );

        assert_eq!(
            saved,
            vec![
                store.image_path(ImageCategory::Natural, "bluefin_tuna", 0),
                store.image_path(ImageCategory::Natural, "bluefin_tuna", 1),
            ]
        );
        assert!(!http.requests.borrow().contains(&"https://img/c".to_string()));
    }
}
