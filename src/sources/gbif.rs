use std::path::PathBuf;

use serde_json::Value;

use super::{save_candidate_urls, ImageQuery, SlotRange, SourceAdapter, SourceContext};
use crate::error::SourceError;
use crate::http_session::HttpFetch;

const GBIF_SPECIES_SEARCH_URL: &str = "https://api.gbif.org/v1/species/search";
const GBIF_OCCURRENCE_SEARCH_URL: &str = "https://api.gbif.org/v1/occurrence/search";
const GBIF_DENSITY_MAP_URL: &str = "https://api.gbif.org/v2/map/occurrence/density/0/0/0@1x.png";
const OCCURRENCE_LIMIT: &str = "5";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GbifMode {
    /// Still images attached to occurrence records.
    OccurrencePhotos,
    /// World occurrence-density tile for the taxon.
    DensityMap,
}

/// Global Biodiversity Information Facility: taxon key lookup, then media.
pub struct GbifAdapter {
    mode: GbifMode,
}

impl GbifAdapter {
    pub fn new(mode: GbifMode) -> Self {
        Self { mode }
    }

    pub fn lookup_taxon_key(
        http: &dyn HttpFetch,
        scientific_name: &str,
    ) -> Result<u64, SourceError> {
        let parsed = http.get_json(
            GBIF_SPECIES_SEARCH_URL,
            &[("q", scientific_name), ("limit", "1")],
        )?;
        parsed["results"][0]["key"]
            .as_u64()
            .ok_or_else(|| SourceError::Parse(format!("No GBIF taxon for '{scientific_name}'")))
    }

    /// First still-image identifier of each occurrence, in record order.
    fn occurrence_image_urls(parsed: &Value) -> Vec<String> {
        parsed["results"]
            .as_array()
            .map(|occurrences| {
                occurrences
                    .iter()
                    .filter_map(|occurrence| {
                        occurrence["media"].as_array()?.iter().find_map(|media| {
                            (media["type"].as_str() == Some("StillImage"))
                                .then(|| media["identifier"].as_str())
                                .flatten()
                                .filter(|url| !url.is_empty())
                                .map(str::to_string)
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn density_map_url(taxon_key: u64) -> String {
        format!("{GBIF_DENSITY_MAP_URL}?taxonKey={taxon_key}")
    }
}

impl SourceAdapter for GbifAdapter {
    fn name(&self) -> &str {
        match self.mode {
            GbifMode::OccurrencePhotos => "GBIF occurrences",
            GbifMode::DensityMap => "GBIF density map",
        }
    }

    fn attempt(
        &self,
        context: &SourceContext<'_>,
        query: &ImageQuery<'_>,
        slots: SlotRange,
    ) -> Result<Vec<PathBuf>, SourceError> {
        let taxon_key = Self::lookup_taxon_key(context.http, &query.species.scientific_name)?;
        let urls = match self.mode {
            GbifMode::OccurrencePhotos => {
                let key = taxon_key.to_string();
                let parsed = context.http.get_json(
                    GBIF_OCCURRENCE_SEARCH_URL,
                    &[
                        ("taxonKey", key.as_str()),
                        ("mediaType", "StillImage"),
                        ("limit", OCCURRENCE_LIMIT),
                    ],
                )?;
                Self::occurrence_image_urls(&parsed)
            }
            GbifMode::DensityMap => vec![Self::density_map_url(taxon_key)],
        };
        Ok(save_candidate_urls(
            self.name(),
            context,
            query,
            slots,
            urls,
        ))
    }
}
