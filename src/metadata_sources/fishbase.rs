use serde_json::Value;

use super::{number_field, text_field, MetadataSource, SpeciesFacts};
use crate::error::SourceError;
use crate::http_session::HttpFetch;
use crate::species_catalog::Species;

/// FishBase species table, queried by scientific name.
pub struct FishBaseSource {
    species_url: String,
}

impl FishBaseSource {
    pub fn new(api_base_url: &str) -> Self {
        Self {
            species_url: format!("{}/species", api_base_url.trim_end_matches('/')),
        }
    }

    /// First species row, whether the API answers with a bare array or a
    /// `{"data": [...]}` envelope.
    fn first_row(parsed: &Value) -> Option<&Value> {
        let rows = match parsed {
            Value::Array(rows) => rows,
            Value::Object(envelope) => envelope.get("data")?.as_array()?,
            _ => return None,
        };
        rows.first().filter(|row| row.is_object())
    }

    fn facts_from_row(row: &Value) -> SpeciesFacts {
        SpeciesFacts {
            description: text_field(&row["Comments"]),
            longevity_years: number_field(&row["LongevityWild"]),
            length_cm: number_field(&row["Length"]),
            weight_kg: number_field(&row["Weight"]),
        }
    }
}

impl MetadataSource for FishBaseSource {
    fn name(&self) -> &str {
        "FishBase"
    }

    fn lookup(&self, http: &dyn HttpFetch, species: &Species) -> Result<SpeciesFacts, SourceError> {
        let parsed = http.get_json(
            &self.species_url,
            &[("species", species.scientific_name.as_str())],
        )?;
        let row = Self::first_row(&parsed).ok_or_else(|| {
            SourceError::Parse(format!(
                "No FishBase data found for {}",
                species.scientific_name
            ))
        })?;
        Ok(Self::facts_from_row(row))
    }
}
