use super::{text_field, MetadataSource, SpeciesFacts};
use crate::error::SourceError;
use crate::http_session::HttpFetch;
use crate::species_catalog::Species;

const WIKIPEDIA_SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";

/// Lead-section extract of the English Wikipedia article named after the
/// species' common name.
pub struct WikipediaSummarySource;

impl WikipediaSummarySource {
    pub fn new() -> Self {
        Self
    }

    pub fn summary_url(title: &str) -> String {
        format!("{WIKIPEDIA_SUMMARY_URL}{}", urlencoding::encode(title.trim()))
    }
}

impl Default for WikipediaSummarySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSource for WikipediaSummarySource {
    fn name(&self) -> &str {
        "Wikipedia"
    }

    fn lookup(&self, http: &dyn HttpFetch, species: &Species) -> Result<SpeciesFacts, SourceError> {
        let parsed = http.get_json(&Self::summary_url(&species.common_name), &[])?;
        if parsed["type"].as_str() == Some("disambiguation") {
            return Err(SourceError::Parse(format!(
                "'{}' is a disambiguation page",
                species.common_name
            )));
        }
        Ok(SpeciesFacts {
            description: text_field(&parsed["extract"]),
            ..SpeciesFacts::default()
        })
    }
}
