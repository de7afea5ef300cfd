//! Descriptive facts about a species, merged from structured and summary sources.

mod fishbase;
mod wikipedia;

use log::{debug, warn};
use serde_json::Value;

use crate::config::NetworkConfig;
use crate::error::SourceError;
use crate::http_session::HttpFetch;
use crate::species_catalog::Species;

pub use fishbase::FishBaseSource;
pub use wikipedia::WikipediaSummarySource;

const CM_TO_INCHES: f64 = 0.393701;
const KG_TO_LBS: f64 = 2.20462;

/// Whatever a source could tell us. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeciesFacts {
    pub description: Option<String>,
    pub longevity_years: Option<f64>,
    pub length_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

impl SpeciesFacts {
    /// Fills fields that are still empty from `other`. Present values are kept.
    pub fn merge_missing(&mut self, other: SpeciesFacts) {
        if self.description.is_none() {
            self.description = other.description;
        }
        if self.longevity_years.is_none() {
            self.longevity_years = other.longevity_years;
        }
        if self.length_cm.is_none() {
            self.length_cm = other.length_cm;
        }
        if self.weight_kg.is_none() {
            self.weight_kg = other.weight_kg;
        }
    }

    pub fn lifespan_text(&self) -> Option<String> {
        self.longevity_years
            .map(|years| format!("{} years", format_number(years)))
    }

    pub fn size_text(&self) -> Option<String> {
        self.length_cm.map(|cm| {
            format!(
                "{:.1} in ({} cm)",
                cm * CM_TO_INCHES,
                format_number(cm)
            )
        })
    }

    pub fn weight_text(&self) -> Option<String> {
        self.weight_kg.map(|kg| {
            format!(
                "{:.1} lbs ({} kg)",
                kg * KG_TO_LBS,
                format_number(kg)
            )
        })
    }
}

/// A provider of [`SpeciesFacts`].
pub trait MetadataSource {
    fn name(&self) -> &str;

    fn lookup(&self, http: &dyn HttpFetch, species: &Species) -> Result<SpeciesFacts, SourceError>;
}

/// Structured source first, then the encyclopedic summary.
pub fn default_sources(network: &NetworkConfig) -> Vec<Box<dyn MetadataSource>> {
    vec![
        Box::new(FishBaseSource::new(&network.fishbase_api_url)),
        Box::new(WikipediaSummarySource::new()),
    ]
}

/// Asks every source in order and keeps the first value seen for each field.
pub fn gather_facts(
    sources: &[Box<dyn MetadataSource>],
    http: &dyn HttpFetch,
    species: &Species,
) -> SpeciesFacts {
    let mut facts = SpeciesFacts::default();
    for source in sources {
        match source.lookup(http, species) {
            Ok(found) => {
                debug!(
                    "Metadata[{}]: {} answered (description={})",
                    species.common_name,
                    source.name(),
                    found.description.is_some()
                );
                facts.merge_missing(found);
            }
            Err(error) => {
                warn!(
                    "Metadata[{}]: {} lookup failed: {}",
                    species.common_name,
                    source.name(),
                    error
                );
            }
        }
    }
    facts
}

/// Whole numbers print without a fractional part.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Reads a numeric field that may be encoded as a number or a numeric string.
pub(crate) fn number_field(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}

/// Trimmed, non-empty string field.
pub(crate) fn text_field(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
