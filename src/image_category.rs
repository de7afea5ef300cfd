//! Image categories, their acquisition targets and on-disk naming.

use std::fmt;

/// One of the four image slots every fish record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageCategory {
    Natural,
    Scientific,
    Map,
    Culinary,
}

impl ImageCategory {
    /// Processing order used by the assembler and by folder scans.
    pub const ALL: [ImageCategory; 4] = [
        ImageCategory::Natural,
        ImageCategory::Scientific,
        ImageCategory::Map,
        ImageCategory::Culinary,
    ];

    /// Number of images every record must end up with for this category.
    pub fn target_count(self) -> usize {
        match self {
            Self::Natural => 2,
            Self::Scientific => 1,
            Self::Map => 1,
            Self::Culinary => 2,
        }
    }

    /// Folder under the images root.
    pub fn folder(self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Scientific => "scientific",
            Self::Map => "maps",
            Self::Culinary => "sushi",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Scientific => "scientific",
            Self::Map => "map",
            Self::Culinary => "culinary",
        }
    }

    /// Deterministic file name for the `index`-th image (0-based) of an entity.
    pub fn file_name(self, entity_id: &str, index: usize) -> String {
        match self {
            Self::Natural => format!("{entity_id}_natural_{}.jpg", index + 1),
            Self::Scientific if index == 0 => format!("{entity_id}_diagram.jpg"),
            Self::Scientific => format!("{entity_id}_diagram_{}.jpg", index + 1),
            Self::Map if index == 0 => format!("{entity_id}_habitat.jpg"),
            Self::Map => format!("{entity_id}_habitat_{}.jpg", index + 1),
            Self::Culinary => match index {
                0 => format!("{entity_id}_nigiri.jpg"),
                1 => format!("{entity_id}_sashimi.jpg"),
                _ => format!("{entity_id}_sushi_{}.jpg", index + 1),
            },
        }
    }

    /// Reverse of [`ImageCategory::file_name`]: recovers the entity id and index.
    pub fn parse_file_name(self, file_name: &str) -> Option<(String, usize)> {
        let stem = file_name.strip_suffix(".jpg")?;
        let (id, index) = match self {
            Self::Natural => {
                let (id, ordinal) = stem.rsplit_once("_natural_")?;
                (id, ordinal.parse::<usize>().ok()?.checked_sub(1)?)
            }
            Self::Scientific => Self::parse_single_slot(stem, "_diagram")?,
            Self::Map => Self::parse_single_slot(stem, "_habitat")?,
            Self::Culinary => {
                if let Some(id) = stem.strip_suffix("_nigiri") {
                    (id, 0)
                } else if let Some(id) = stem.strip_suffix("_sashimi") {
                    (id, 1)
                } else {
                    let (id, ordinal) = stem.rsplit_once("_sushi_")?;
                    (id, ordinal.parse::<usize>().ok()?.checked_sub(1)?)
                }
            }
        };
        (!id.is_empty()).then(|| (id.to_string(), index))
    }

    fn parse_single_slot<'a>(stem: &'a str, suffix: &str) -> Option<(&'a str, usize)> {
        if let Some(id) = stem.strip_suffix(suffix) {
            return Some((id, 0));
        }
        let (id, ordinal) = stem.rsplit_once(&format!("{suffix}_"))?;
        Some((id, ordinal.parse::<usize>().ok()?.checked_sub(1)?))
    }

    /// Second caption line drawn on placeholders.
    pub fn caption_tag(self) -> &'static str {
        match self {
            Self::Natural => "(Natural Photo)",
            Self::Scientific => "(Diagram)",
            Self::Map => "(Habitat Map)",
            Self::Culinary => "(Sushi)",
        }
    }

    /// Keywords appended to free-text media searches for this category.
    pub fn search_keywords(self) -> &'static str {
        match self {
            Self::Natural => "fish",
            Self::Scientific => "anatomy diagram",
            Self::Map => "distribution range map",
            Self::Culinary => "sushi sashimi nigiri",
        }
    }
}

impl fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
