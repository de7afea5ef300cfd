use std::path::PathBuf;

use serde_json::Value;

use super::{save_candidate_urls, ImageQuery, SlotRange, SourceAdapter, SourceContext};
use crate::error::SourceError;

const INATURALIST_OBSERVATIONS_URL: &str = "https://api.inaturalist.org/v1/observations";

/// Research-grade iNaturalist observation photos.
pub struct INaturalistAdapter;

impl INaturalistAdapter {
    pub fn new() -> Self {
        Self
    }

    /// First photo of each observation, upgraded from the square thumbnail.
    fn observation_photo_urls(parsed: &Value) -> Vec<String> {
        parsed["results"]
            .as_array()
            .map(|observations| {
                observations
                    .iter()
                    .filter_map(|observation| observation["photos"][0]["url"].as_str())
                    .filter(|url| !url.is_empty())
                    .map(|url| url.replace("square", "medium"))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for INaturalistAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAdapter for INaturalistAdapter {
    fn name(&self) -> &str {
        "iNaturalist"
    }

    fn attempt(
        &self,
        context: &SourceContext<'_>,
        query: &ImageQuery<'_>,
        slots: SlotRange,
    ) -> Result<Vec<PathBuf>, SourceError> {
        let parsed = context.http.get_json(
            INATURALIST_OBSERVATIONS_URL,
            &[
                ("taxon_name", query.species.scientific_name.as_str()),
                ("photos", "true"),
                ("quality_grade", "research"),
                ("per_page", "5"),
            ],
        )?;
        Ok(save_candidate_urls(
            self.name(),
            context,
            query,
            slots,
            Self::observation_photo_urls(&parsed),
        ))
    }
}
