//! Built-in species list and the static fallback tables used when online
//! sources have nothing to say.

/// Identity fields for one species, as the extractor receives them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Species {
    pub common_name: String,
    pub scientific_name: String,
    pub japanese_romaji: String,
    pub japanese_kanji: String,
}

impl Species {
    pub fn new(common_name: &str, scientific_name: &str, romaji: &str, kanji: &str) -> Self {
        Self {
            common_name: common_name.to_string(),
            scientific_name: scientific_name.to_string(),
            japanese_romaji: romaji.to_string(),
            japanese_kanji: kanji.to_string(),
        }
    }
}

const SUSHI_SPECIES: [(&str, &str, &str, &str); 20] = [
    ("Bluefin Tuna", "Thunnus thynnus", "Kuro-maguro", "黒鮪"),
    ("Yellowfin Tuna", "Thunnus albacares", "Kihada", "黄肌"),
    ("Atlantic Salmon", "Salmo salar", "Sake", "鮭"),
    ("Japanese Amberjack", "Seriola quinqueradiata", "Hamachi", "鰤"),
    ("Red Sea Bream", "Pagrus major", "Madai", "真鯛"),
    ("Atlantic Mackerel", "Scomber scombrus", "Saba", "鯖"),
    ("Horse Mackerel", "Trachurus japonicus", "Aji", "鯵"),
    ("Japanese Sardine", "Sardinops melanostictus", "Iwashi", "鰯"),
    ("Japanese Sea Bass", "Lateolabrax japonicus", "Suzuki", "鱸"),
    ("Olive Flounder", "Paralichthys olivaceus", "Hirame", "鮃"),
    ("Red Snapper", "Lutjanus campechanus", "Tai", "鯛"),
    ("Japanese Eel", "Anguilla japonica", "Unagi", "鰻"),
    ("Conger Eel", "Conger myriaster", "Anago", "穴子"),
    ("Japanese Flying Squid", "Todarodes pacificus", "Ika", "烏賊"),
    ("Giant Pacific Octopus", "Enteroctopus dofleini", "Tako", "蛸"),
    ("Kuruma Prawn", "Penaeus japonicus", "Ebi", "海老"),
    ("Japanese Scallop", "Patinopecten yessoensis", "Hotate", "帆立"),
    ("Sea Urchin", "Strongylocentrotus nudus", "Uni", "雲丹"),
    ("Greater Amberjack", "Seriola dumerili", "Kanpachi", "間八"),
    ("Pacific Saury", "Cololabis saira", "Sanma", "秋刀魚"),
];

/// The twenty species prepared for the app, in processing order.
pub fn sushi_species() -> Vec<Species> {
    SUSHI_SPECIES
        .iter()
        .map(|(common, scientific, romaji, kanji)| Species::new(common, scientific, romaji, kanji))
        .collect()
}

pub const GENERIC_DESCRIPTION: &str = "A species of fish commonly used in Japanese cuisine, \
     particularly sushi and sashimi preparation.";
pub const DEFAULT_LIFESPAN: &str = "5-15 years";
pub const DEFAULT_SIZE: &str = "12-24 in (30-60 cm)";
pub const DEFAULT_WEIGHT: &str = "2-10 lbs (1-4.5 kg)";
pub const DEFAULT_HABITATS: [&str; 2] = ["Pacific Ocean", "Atlantic Ocean"];
pub const DEFAULT_PREPARATIONS: [&str; 4] = ["Sashimi", "Nigiri", "Grilled", "Steamed"];

pub fn fallback_description(common_name: &str) -> Option<&'static str> {
    match common_name {
        "Bluefin Tuna" => Some(
            "Large, powerful fish prized for its rich, fatty flesh. Highly valued in sushi \
             cuisine for its complex flavor profile ranging from lean akami to fatty otoro.",
        ),
        "Atlantic Salmon" => Some(
            "Popular fish with distinctive pink flesh. Commonly farm-raised and wild-caught, \
             known for its rich flavor and high omega-3 content.",
        ),
        "Japanese Amberjack" => Some(
            "Premium fish with buttery texture and clean taste. Young yellowtail (hamachi) is \
             especially prized for sushi and sashimi.",
        ),
        _ => None,
    }
}

pub fn known_aliases(common_name: &str) -> &'static [&'static str] {
    match common_name {
        "Bluefin Tuna" => &["Maguro", "Hon-maguro", "Kuro-maguro"],
        "Yellowfin Tuna" => &["Ahi", "Kihada"],
        "Atlantic Salmon" => &["Sake", "Norwegian Salmon"],
        "Japanese Amberjack" => &["Hamachi", "Yellowtail", "Buri"],
        "Red Sea Bream" => &["Tai", "Madai", "Sea Bream"],
        _ => &[],
    }
}

pub fn preparations(common_name: &str) -> &'static [&'static str] {
    match common_name {
        "Bluefin Tuna" => &["Sashimi", "Nigiri", "Seared", "Tataki"],
        "Atlantic Salmon" => &["Sashimi", "Nigiri", "Grilled", "Smoked"],
        "Japanese Amberjack" => &["Sashimi", "Nigiri", "Grilled", "Teriyaki"],
        "Red Sea Bream" => &["Sashimi", "Nigiri", "Steamed", "Grilled"],
        "Atlantic Mackerel" => &["Sashimi", "Nigiri", "Grilled", "Pickled"],
        "Japanese Eel" => &["Unagi", "Kabayaki", "Grilled", "Rice Bowl"],
        _ => &DEFAULT_PREPARATIONS,
    }
}

#[cfg(test)]
mod tests {
    use super::{fallback_description, known_aliases, preparations, sushi_species};

    #[test]
    fn test_catalog_has_twenty_distinct_species() {
        let species = sushi_species();
        assert_eq!(species.len(), 20);
        let mut names: Vec<&str> = species.iter().map(|s| s.common_name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 20);
        assert_eq!(species[0].common_name, "Bluefin Tuna");
        assert_eq!(species[19].japanese_kanji, "秋刀魚");
    }

    #[test]
    fn test_static_tables_fall_back_to_generic_values() {
        assert!(fallback_description("Bluefin Tuna").is_some());
        assert!(fallback_description("Sea Urchin").is_none());
        assert_eq!(known_aliases("Yellowfin Tuna"), &["Ahi", "Kihada"]);
        assert!(known_aliases("Sea Urchin").is_empty());
        assert_eq!(preparations("Japanese Eel")[1], "Kabayaki");
        assert_eq!(
            preparations("Sea Urchin"),
            &["Sashimi", "Nigiri", "Grilled", "Steamed"]
        );
    }
}
