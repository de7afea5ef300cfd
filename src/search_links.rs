//! Search links for sourcing images by hand.

use std::fmt::Write as _;

use crate::species_catalog::Species;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLink {
    pub label: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkGroup {
    pub heading: &'static str,
    pub links: Vec<SearchLink>,
}

fn plus_joined(value: &str) -> String {
    value.trim().replace(' ', "+")
}

pub fn fishbase_search_url(scientific_name: &str) -> String {
    format!(
        "https://www.fishbase.se/search.php?q={}",
        plus_joined(scientific_name)
    )
}

fn link(label: &'static str, url: String) -> SearchLink {
    SearchLink { label, url }
}

/// Diagram, habitat and sushi searches for one species.
pub fn sourcing_links(species: &Species) -> Vec<LinkGroup> {
    let scientific = plus_joined(&species.scientific_name);
    let romaji = plus_joined(&species.japanese_romaji);
    vec![
        LinkGroup {
            heading: "Scientific Diagrams",
            links: vec![
                link("FishBase", fishbase_search_url(&species.scientific_name)),
                link(
                    "Wikipedia",
                    format!(
                        "https://en.wikipedia.org/wiki/{}",
                        species.scientific_name.trim().replace(' ', "_")
                    ),
                ),
                link(
                    "Google Images",
                    format!("https://images.google.com/search?q={scientific}+anatomy+diagram"),
                ),
            ],
        },
        LinkGroup {
            heading: "Habitat Maps",
            links: vec![
                link(
                    "FishBase Maps",
                    format!(
                        "https://www.fishbase.se/Country/CountrySpeciesSummary.php?c_code=&id={scientific}"
                    ),
                ),
                link(
                    "GBIF",
                    format!("https://www.gbif.org/species/search?q={scientific}"),
                ),
                link(
                    "AquaMaps",
                    format!("https://www.aquamaps.org/search.php?q={scientific}"),
                ),
            ],
        },
        LinkGroup {
            heading: "Sushi Images",
            links: vec![
                link(
                    "Google Images",
                    format!("https://images.google.com/search?q={romaji}+nigiri"),
                ),
                link(
                    "Google Images",
                    format!("https://images.google.com/search?q={romaji}+sashimi"),
                ),
                link(
                    "Unsplash",
                    format!("https://unsplash.com/search/photos/{romaji}+sushi"),
                ),
            ],
        },
    ]
}

/// Plain-text report listing every species' links.
pub fn render_sourcing_report(species_list: &[Species]) -> String {
    let mut out = String::from("=== FISH IMAGE SEARCH URLS ===\n\n");
    for species in species_list {
        let _ = writeln!(
            out,
            "### {} ({})",
            species.common_name, species.scientific_name
        );
        let _ = writeln!(out, "Japanese: {}\n", species.japanese_romaji);
        for group in sourcing_links(species) {
            let _ = writeln!(out, "**{}:**", group.heading);
            for entry in group.links {
                let _ = writeln!(out, "- {}: {}", entry.label, entry.url);
            }
            out.push('\n');
        }
        out.push_str(&"-".repeat(80));
        out.push_str("\n\n");
    }
    out
}
