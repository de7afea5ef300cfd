use std::path::PathBuf;

use log::debug;
use serde_json::Value;

use super::{save_candidate_urls, ImageQuery, SlotRange, SourceAdapter, SourceContext};
use crate::error::SourceError;
use crate::http_session::HttpFetch;
use crate::image_category::ImageCategory;
use crate::species_catalog::Species;

pub const COMMONS_API_URL: &str = "https://commons.wikimedia.org/w/api.php";
const SEARCH_LIMIT: &str = "5";
const THUMB_WIDTH_PX: &str = "800";

/// Which name of the species a search is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSubject {
    CommonName,
    ScientificName,
    Romaji,
}

impl SearchSubject {
    fn resolve(self, species: &Species) -> &str {
        match self {
            Self::CommonName => &species.common_name,
            Self::ScientificName => &species.scientific_name,
            Self::Romaji => &species.japanese_romaji,
        }
    }
}

/// Keyword search over Wikimedia Commons files, then title → URL resolution.
pub struct CommonsAdapter {
    subjects: Vec<SearchSubject>,
    fixed_terms: Option<Vec<String>>,
}

impl CommonsAdapter {
    pub fn new(subjects: Vec<SearchSubject>) -> Self {
        Self {
            subjects,
            fixed_terms: None,
        }
    }

    /// Searches exactly `terms`, ignoring the species names.
    pub fn with_terms(terms: Vec<String>) -> Self {
        Self {
            subjects: Vec::new(),
            fixed_terms: Some(terms),
        }
    }

    fn category_suffixes(category: ImageCategory) -> &'static [&'static str] {
        match category {
            ImageCategory::Natural => &["", "fish"],
            ImageCategory::Scientific => &["anatomy", "diagram", "illustration"],
            ImageCategory::Map => &["distribution", "habitat", "range map"],
            ImageCategory::Culinary => &["nigiri", "sashimi", "sushi"],
        }
    }

    /// Search terms in the order they are tried.
    pub fn search_terms(&self, species: &Species, category: ImageCategory) -> Vec<String> {
        if let Some(terms) = &self.fixed_terms {
            return terms.clone();
        }
        let mut terms: Vec<String> = Vec::new();
        for suffix in Self::category_suffixes(category) {
            for subject in &self.subjects {
                let base = subject.resolve(species).trim();
                if base.is_empty() {
                    continue;
                }
                let term = if suffix.is_empty() {
                    base.to_string()
                } else {
                    format!("{base} {suffix}")
                };
                if !terms.contains(&term) {
                    terms.push(term);
                }
            }
        }
        terms
    }

    /// File titles matching `term` in the Commons file namespace.
    pub fn search_titles(http: &dyn HttpFetch, term: &str) -> Result<Vec<String>, SourceError> {
        let search = format!("filetype:bitmap {term}");
        let parsed = http.get_json(
            COMMONS_API_URL,
            &[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", search.as_str()),
                ("srnamespace", "6"),
                ("srlimit", SEARCH_LIMIT),
            ],
        )?;
        let results = parsed["query"]["search"]
            .as_array()
            .ok_or_else(|| SourceError::Parse("Commons search response missing results".into()))?;
        Ok(results
            .iter()
            .filter_map(|result| result["title"].as_str())
            .map(str::to_string)
            .collect())
    }

    /// Direct (thumbnail-sized when available) URL for a `File:` title.
    pub fn resolve_file_url(http: &dyn HttpFetch, title: &str) -> Result<String, SourceError> {
        let parsed = http.get_json(
            COMMONS_API_URL,
            &[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("prop", "imageinfo"),
                ("iiprop", "url"),
                ("iiurlwidth", THUMB_WIDTH_PX),
            ],
        )?;
        parsed["query"]["pages"]
            .as_object()
            .into_iter()
            .flat_map(|pages| pages.values())
            .find_map(Self::image_info_url)
            .ok_or_else(|| SourceError::Parse(format!("No image info for '{title}'")))
    }

    fn image_info_url(page: &Value) -> Option<String> {
        let info = &page["imageinfo"][0];
        info["thumburl"]
            .as_str()
            .or_else(|| info["url"].as_str())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    }
}

impl SourceAdapter for CommonsAdapter {
    fn name(&self) -> &str {
        "Wikimedia Commons"
    }

    fn attempt(
        &self,
        context: &SourceContext<'_>,
        query: &ImageQuery<'_>,
        slots: SlotRange,
    ) -> Result<Vec<PathBuf>, SourceError> {
        let mut saved: Vec<PathBuf> = Vec::new();
        let mut last_error = None;
        let mut any_search_succeeded = false;

        for term in self.search_terms(query.species, query.category) {
            if saved.len() >= slots.remaining {
                break;
            }
            let titles = match Self::search_titles(context.http, &term) {
                Ok(titles) => titles,
                Err(error) => {
                    debug!("[{}] Commons search '{}' failed: {}", query.entity_id, term, error);
                    last_error = Some(error);
                    continue;
                }
            };
            any_search_succeeded = true;

            let urls = titles.iter().filter_map(|title| {
                Self::resolve_file_url(context.http, title)
                    .inspect_err(|error| {
                        debug!("[{}] Commons title '{}': {}", query.entity_id, title, error)
                    })
                    .ok()
            });
            let remaining_slots = SlotRange {
                start: slots.start + saved.len(),
                remaining: slots.remaining - saved.len(),
            };
            saved.extend(save_candidate_urls(
                self.name(),
                context,
                query,
                remaining_slots,
                urls,
            ));
        }

        match last_error {
            Some(error) if saved.is_empty() && !any_search_succeeded => Err(error),
            _ => Ok(saved),
        }
    }
}
