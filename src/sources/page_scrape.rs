use std::path::PathBuf;

use regex::Regex;

use super::{save_candidate_urls, ImageQuery, SlotRange, SourceAdapter, SourceContext};
use crate::error::SourceError;

/// Scrapes image links out of an HTML page by pattern.
///
/// Markup changes on the remote side simply yield no matches.
pub struct PageScrapeAdapter {
    name: &'static str,
    page_url: fn(&str) -> String,
    image_pattern: &'static str,
}

impl PageScrapeAdapter {
    pub fn fishbase_photos() -> Self {
        Self {
            name: "FishBase photos",
            page_url: |scientific| {
                format!(
                    "https://www.fishbase.se/photos/PicturesSummary.php?resultPage=1&what=species&ID={}",
                    urlencoding::encode(scientific)
                )
            },
            image_pattern: r"https://www\.fishbase\.se/photos/.*?\.jpg",
        }
    }

    pub fn fishbase_diagrams() -> Self {
        Self {
            name: "FishBase diagrams",
            page_url: |scientific| {
                format!(
                    "https://www.fishbase.se/summary/{}.html",
                    scientific.trim().replace(' ', "-")
                )
            },
            image_pattern: r"https://www\.fishbase\.se/images/species/.*?\.gif",
        }
    }

    pub fn fishbase_maps() -> Self {
        Self {
            name: "FishBase maps",
            page_url: |scientific| {
                format!(
                    "https://www.fishbase.se/Country/CountrySpeciesSummary.php?c_code=&id={}",
                    urlencoding::encode(scientific)
                )
            },
            image_pattern: r"https://www\.fishbase\.se/images/gifs/.*?map.*?\.gif",
        }
    }

    /// Distinct matches of `pattern` in `html`, in page order.
    pub fn extract_image_urls(pattern: &str, html: &str) -> Result<Vec<String>, SourceError> {
        let regex = Regex::new(pattern)
            .map_err(|error| SourceError::Parse(format!("Bad image pattern: {error}")))?;
        let mut urls: Vec<String> = Vec::new();
        for found in regex.find_iter(html) {
            let url = found.as_str().to_string();
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        Ok(urls)
    }
}

impl SourceAdapter for PageScrapeAdapter {
    fn name(&self) -> &str {
        self.name
    }

    fn attempt(
        &self,
        context: &SourceContext<'_>,
        query: &ImageQuery<'_>,
        slots: SlotRange,
    ) -> Result<Vec<PathBuf>, SourceError> {
        let page = (self.page_url)(&query.species.scientific_name);
        let html = context.http.get_text(&page)?;
        let urls = Self::extract_image_urls(self.image_pattern, &html)?;
        Ok(save_candidate_urls(self.name, context, query, slots, urls))
    }
}
