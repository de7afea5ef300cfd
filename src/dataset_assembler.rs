//! Per-species records and the dataset document the app reads.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::acquisition_pipeline::FallbackPipeline;
use crate::asset_store::ImageStore;
use crate::config::{pause, DatasetConfig, PacingConfig};
use crate::error::AssetError;
use crate::http_session::HttpFetch;
use crate::image_category::ImageCategory;
use crate::metadata_sources::{gather_facts, MetadataSource, SpeciesFacts};
use crate::placeholder_renderer::{PlaceholderRender, PlaceholderRenderer};
use crate::sources::{ImageQuery, SourceContext};
use crate::species_catalog::{self, Species};

const DATASET_DESCRIPTION: &str = "Fish database for Gyo Gai Do app";
const ELLIPSIS: &str = "...";

/// One species as the app consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishRecord {
    pub id: String,
    pub unique_name: String,
    pub description: String,
    pub common_aliases: Vec<String>,
    pub scientific_name: String,
    pub japanese_name_romaji: String,
    pub japanese_name_kanji: String,
    pub lifespan: String,
    pub size: String,
    pub weight: String,
    pub habitats: Vec<String>,
    pub ways_to_eat: Vec<String>,
    pub wild_images: Vec<String>,
    pub scientific_images: Vec<String>,
    pub habitat_map_images: Vec<String>,
    pub sushi_images: Vec<String>,
}

impl FishRecord {
    pub fn species(&self) -> Species {
        Species::new(
            &self.unique_name,
            &self.scientific_name,
            &self.japanese_name_romaji,
            &self.japanese_name_kanji,
        )
    }

    fn images_mut(&mut self, category: ImageCategory) -> &mut Vec<String> {
        match category {
            ImageCategory::Natural => &mut self.wild_images,
            ImageCategory::Scientific => &mut self.scientific_images,
            ImageCategory::Map => &mut self.habitat_map_images,
            ImageCategory::Culinary => &mut self.sushi_images,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub version: String,
    pub generated_at: String,
    pub total_species: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub fish_database: Vec<FishRecord>,
    pub metadata: DatasetMetadata,
}

impl Dataset {
    pub fn new(records: Vec<FishRecord>, schema_version: &str) -> Self {
        let metadata = DatasetMetadata {
            version: schema_version.to_string(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            total_species: records.len(),
            description: DATASET_DESCRIPTION.to_string(),
        };
        Self {
            fish_database: records,
            metadata,
        }
    }
}

/// Stable id derived from a display name: `"Bluefin Tuna"` → `"bluefin_tuna"`.
pub fn generate_id(display_name: &str) -> String {
    display_name
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// Cuts `text` to `max_chars` characters plus `...`. Shorter text is returned as is.
pub fn truncate_description(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect::<String>() + ELLIPSIS
}

/// Romaji name followed by any known aliases, first occurrence kept.
pub fn collect_aliases(species: &Species) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    std::iter::once(species.japanese_romaji.as_str())
        .chain(species_catalog::known_aliases(&species.common_name).iter().copied())
        .map(str::trim)
        .filter(|alias| !alias.is_empty() && seen.insert(*alias))
        .map(str::to_string)
        .collect()
}

/// Source text, then the static table, then the generic sentence.
pub fn resolve_description(species: &Species, facts: &SpeciesFacts, max_chars: usize) -> String {
    let text = facts
        .description
        .as_deref()
        .or_else(|| species_catalog::fallback_description(&species.common_name))
        .unwrap_or(species_catalog::GENERIC_DESCRIPTION);
    truncate_description(text, max_chars)
}

/// Record with every descriptive field resolved and empty image lists.
pub fn describe_species(
    species: &Species,
    facts: &SpeciesFacts,
    max_description_chars: usize,
) -> Result<FishRecord, AssetError> {
    let id = generate_id(&species.common_name);
    if id.is_empty() {
        return Err(AssetError::EmptyName);
    }
    Ok(FishRecord {
        id,
        unique_name: species.common_name.trim().to_string(),
        description: resolve_description(species, facts, max_description_chars),
        common_aliases: collect_aliases(species),
        scientific_name: species.scientific_name.clone(),
        japanese_name_romaji: species.japanese_romaji.clone(),
        japanese_name_kanji: species.japanese_kanji.clone(),
        lifespan: facts
            .lifespan_text()
            .unwrap_or_else(|| species_catalog::DEFAULT_LIFESPAN.to_string()),
        size: facts
            .size_text()
            .unwrap_or_else(|| species_catalog::DEFAULT_SIZE.to_string()),
        weight: facts
            .weight_text()
            .unwrap_or_else(|| species_catalog::DEFAULT_WEIGHT.to_string()),
        habitats: to_strings(&species_catalog::DEFAULT_HABITATS),
        ways_to_eat: to_strings(species_catalog::preparations(&species.common_name)),
        wild_images: Vec::new(),
        scientific_images: Vec::new(),
        habitat_map_images: Vec::new(),
        sushi_images: Vec::new(),
    })
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Drives metadata lookup and image acquisition for a list of species.
pub struct DatasetAssembler<'a> {
    pub http: &'a dyn HttpFetch,
    pub store: &'a ImageStore,
    pub metadata_sources: Vec<Box<dyn MetadataSource>>,
    pub pipeline: FallbackPipeline,
    pub renderer: &'a dyn PlaceholderRender,
    pub pacing: PacingConfig,
    pub settings: DatasetConfig,
}

impl DatasetAssembler<'_> {
    /// Processes species in input order. A species with an empty name or an
    /// id already taken is logged and left out. Any other error, such as an
    /// unwritable image folder, ends the run.
    pub fn assemble(&self, species_list: &[Species]) -> Result<Dataset, AssetError> {
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut records: Vec<FishRecord> = Vec::new();

        for (position, species) in species_list.iter().enumerate() {
            if position > 0 {
                pause(self.pacing.between_entities());
            }
            info!(
                "Processing {}/{}: {}",
                position + 1,
                species_list.len(),
                species.common_name
            );
            match self.assemble_one(species, &seen_ids) {
                Ok(record) => {
                    seen_ids.insert(record.id.clone());
                    records.push(record);
                }
                Err(error @ (AssetError::EmptyName | AssetError::DuplicateId(_))) => {
                    warn!("Skipping '{}': {}", species.common_name, error);
                }
                Err(error) => return Err(error),
            }
        }

        info!(
            "Assembled {} of {} species",
            records.len(),
            species_list.len()
        );
        Ok(Dataset::new(records, &self.settings.schema_version))
    }

    fn assemble_one(
        &self,
        species: &Species,
        seen_ids: &HashSet<String>,
    ) -> Result<FishRecord, AssetError> {
        let id = generate_id(&species.common_name);
        if id.is_empty() {
            return Err(AssetError::EmptyName);
        }
        if seen_ids.contains(&id) {
            return Err(AssetError::DuplicateId(id));
        }

        let facts = gather_facts(&self.metadata_sources, self.http, species);
        pause(self.pacing.after_metadata());
        let mut record = describe_species(species, &facts, self.settings.description_max_chars)?;

        let context = SourceContext {
            http: self.http,
            store: self.store,
            after_download: self.pacing.after_download(),
        };
        for category in ImageCategory::ALL {
            let query = ImageQuery {
                entity_id: &record.id,
                species,
                category,
            };
            let caption = PlaceholderRenderer::caption_subject(species, category);
            let paths = self
                .pipeline
                .fill_category(&context, &query, self.renderer, caption)?;
            let recorded = (0..paths.len())
                .map(|index| self.store.dataset_path(category, &record.id, index))
                .collect();
            *record.images_mut(category) = recorded;
        }
        Ok(record)
    }
}

/// Writes the document pretty-printed, replacing any previous file.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<(), AssetError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| AssetError::io(parent, err))?;
    }
    let text = serde_json::to_string_pretty(dataset)?;
    fs::write(path, text).map_err(|err| AssetError::io(path, err))?;
    info!(
        "Wrote dataset with {} species to {}",
        dataset.metadata.total_species,
        path.display()
    );
    Ok(())
}

pub fn read_dataset(path: &Path) -> Result<Dataset, AssetError> {
    let text = fs::read_to_string(path).map_err(|err| AssetError::io(path, err))?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::{
        collect_aliases, describe_species, generate_id, read_dataset, resolve_description,
        truncate_description, write_dataset, Dataset, DatasetAssembler,
    };
    use crate::acquisition_pipeline::FallbackPipeline;
    use crate::asset_store::ImageStore;
    use crate::config::{Config, PacingConfig, PlaceholderConfig};
    use crate::error::AssetError;
    use crate::http_session::testing::ScriptedFetch;
    use crate::metadata_sources::{default_sources, SpeciesFacts};
    use crate::placeholder_renderer::PlaceholderRenderer;
    use crate::species_catalog::{sushi_species, Species, GENERIC_DESCRIPTION};
    use serde_json::json;
    use std::collections::HashSet;
    use std::time::Duration;

    #[test]
    fn test_generate_id_is_stable_and_collision_free_for_catalog() {
        assert_eq!(generate_id("Bluefin Tuna"), "bluefin_tuna");
        assert_eq!(generate_id("Bluefin Tuna"), generate_id("Bluefin Tuna"));
        assert_eq!(generate_id("Kuro-maguro Special"), "kuro_maguro_special");

        let ids: HashSet<String> = sushi_species()
            .iter()
            .map(|species| generate_id(&species.common_name))
            .collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_truncate_description_counts_characters() {
        let short = "x".repeat(200);
        assert_eq!(truncate_description(&short, 200), short);

        let long = "y".repeat(250);
        let cut = truncate_description(&long, 200);
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("..."));

        let japanese = "鮪".repeat(5);
        assert_eq!(truncate_description(&japanese, 3), "鮪鮪鮪...");
    }

    #[test]
    fn test_aliases_start_with_romaji_and_drop_duplicates() {
        let tuna = Species::new("Bluefin Tuna", "Thunnus thynnus", "Kuro-maguro", "黒鮪");
        assert_eq!(
            collect_aliases(&tuna),
            vec!["Kuro-maguro", "Maguro", "Hon-maguro"]
        );
        let urchin = Species::new("Sea Urchin", "Strongylocentrotus nudus", "Uni", "雲丹");
        assert_eq!(collect_aliases(&urchin), vec!["Uni"]);
    }

    #[test]
    fn test_description_falls_back_to_table_then_generic() {
        let facts = SpeciesFacts::default();
        let salmon = Species::new("Atlantic Salmon", "Salmo salar", "Sake", "鮭");
        assert!(resolve_description(&salmon, &facts, 200).starts_with("Popular fish"));

        let urchin = Species::new("Sea Urchin", "Strongylocentrotus nudus", "Uni", "雲丹");
        assert_eq!(resolve_description(&urchin, &facts, 200), GENERIC_DESCRIPTION);

        let sourced = SpeciesFacts {
            description: Some("From a source.".to_string()),
            ..SpeciesFacts::default()
        };
        assert_eq!(resolve_description(&salmon, &sourced, 200), "From a source.");
    }

    #[test]
    fn test_describe_species_uses_defaults_when_facts_missing() {
        let urchin = Species::new("Sea Urchin", "Strongylocentrotus nudus", "Uni", "雲丹");
        let record = describe_species(&urchin, &SpeciesFacts::default(), 200)
            .expect("record should build");
        assert_eq!(record.id, "sea_urchin");
        assert_eq!(record.lifespan, "5-15 years");
        assert_eq!(record.size, "12-24 in (30-60 cm)");
        assert_eq!(record.weight, "2-10 lbs (1-4.5 kg)");
        assert_eq!(record.habitats, vec!["Pacific Ocean", "Atlantic Ocean"]);
        assert_eq!(record.ways_to_eat, vec!["Sashimi", "Nigiri", "Grilled", "Steamed"]);

        let blank = Species::new("  ", "x", "y", "z");
        assert!(describe_species(&blank, &SpeciesFacts::default(), 200).is_err());
    }

    #[test]
    fn test_assemble_fills_every_category_and_omits_duplicates() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = ImageStore::init(dir.path(), "assets/images", 90).expect("init should succeed");
        let config = Config::default();
        let http = ScriptedFetch::default().with_json(
            &ScriptedFetch::json_key(
                "https://fishbase.ropensci.org/species",
                &[("species", "Cololabis saira")],
            ),
            json!([{"Comments": "Schooling fish.", "LongevityWild": 4, "Length": 40}]),
        );
        let renderer = PlaceholderRenderer::new(&PlaceholderConfig::default())
            .expect("renderer should load");
        let assembler = DatasetAssembler {
            http: &http,
            store: &store,
            metadata_sources: default_sources(&config.network),
            pipeline: FallbackPipeline::new(Duration::ZERO),
            renderer: &renderer,
            pacing: PacingConfig::immediate(),
            settings: config.dataset.clone(),
        };
        let species = vec![
            Species::new("Pacific Saury", "Cololabis saira", "Sanma", "秋刀魚"),
            Species::new("Pacific-Saury", "Cololabis saira", "Sanma", "秋刀魚"),
            Species::new("", "Nothing", "", ""),
        ];

        let dataset = assembler.assemble(&species).expect("assembly should succeed");
        assert_eq!(dataset.metadata.total_species, 1);
        let record = &dataset.fish_database[0];
        assert_eq!(record.description, "Schooling fish.");
        assert_eq!(record.lifespan, "4 years");
        assert_eq!(record.size, "15.7 in (40 cm)");
        assert_eq!(
            record.wild_images,
            vec![
                "assets/images/natural/pacific_saury_natural_1.jpg",
                "assets/images/natural/pacific_saury_natural_2.jpg"
            ]
        );
        assert_eq!(
            record.scientific_images,
            vec!["assets/images/scientific/pacific_saury_diagram.jpg"]
        );
        assert_eq!(
            record.habitat_map_images,
            vec!["assets/images/maps/pacific_saury_habitat.jpg"]
        );
        assert_eq!(record.sushi_images.len(), 2);
        assert!(dir.path().join("sushi").join("pacific_saury_sashimi.jpg").exists());
    }

    #[test]
    fn test_unwritable_category_folder_ends_the_run() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = ImageStore::init(dir.path(), "assets/images", 90).expect("init should succeed");
        let sushi = dir.path().join("sushi");
        std::fs::remove_dir(&sushi).expect("sushi folder should be removed");
        std::fs::write(&sushi, b"not a folder").expect("blocking file should be written");

        let config = Config::default();
        let http = ScriptedFetch::default();
        let renderer = PlaceholderRenderer::new(&PlaceholderConfig::default())
            .expect("renderer should load");
        let assembler = DatasetAssembler {
            http: &http,
            store: &store,
            metadata_sources: default_sources(&config.network),
            pipeline: FallbackPipeline::new(Duration::ZERO),
            renderer: &renderer,
            pacing: PacingConfig::immediate(),
            settings: config.dataset.clone(),
        };

        let result = assembler.assemble(&sushi_species()[..3]);
        assert!(matches!(result, Err(AssetError::Io { .. })));
    }

    #[test]
    fn test_written_dataset_has_expected_shape_and_unescaped_text() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("data").join("fish_database.json");
        let urchin = Species::new("Sea Urchin", "Strongylocentrotus nudus", "Uni", "雲丹");
        let record = describe_species(&urchin, &SpeciesFacts::default(), 200)
            .expect("record should build");
        let dataset = Dataset::new(vec![record], "1.0");

        write_dataset(&path, &dataset).expect("dataset should be written");
        let text = std::fs::read_to_string(&path).expect("dataset should be readable");
        assert!(text.contains("雲丹"));
        assert!(text.contains("\n  \"metadata\": {"));

        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["metadata"]["version"], "1.0");
        assert_eq!(value["metadata"]["total_species"], 1);
        assert_eq!(
            value["metadata"]["description"],
            "Fish database for Gyo Gai Do app"
        );
        let generated_at = value["metadata"]["generated_at"]
            .as_str()
            .expect("timestamp should be a string");
        assert!(chrono::NaiveDateTime::parse_from_str(generated_at, "%Y-%m-%d %H:%M:%S").is_ok());
        assert_eq!(value["fish_database"][0]["japanese_name_kanji"], "雲丹");

        let reread = read_dataset(&path).expect("dataset should parse back");
        assert_eq!(reread.fish_database[0].species(), urchin);
    }
}
