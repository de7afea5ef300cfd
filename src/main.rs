mod acquisition_pipeline;
mod asset_store;
mod config;
mod dataset_assembler;
mod error;
mod http_session;
mod image_category;
mod image_pipeline;
mod image_resizer;
mod metadata_sources;
mod placeholder_renderer;
mod search_links;
mod sources;
mod species_catalog;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{info, warn};

use acquisition_pipeline::FallbackPipeline;
use asset_store::ImageStore;
use config::{Config, PacingConfig};
use dataset_assembler::DatasetAssembler;
use http_session::HttpSession;
use placeholder_renderer::PlaceholderRenderer;
use sources::{CommonsAdapter, SourceContext};
use species_catalog::Species;

#[derive(Parser, Debug)]
#[command(name = "gyogaido-assets")]
#[command(about = "Fish dataset and image asset preparation for the Gyo Gai Do app")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the per-user config, then built-in defaults)
    #[arg(short, long, global = true, env = "GYOGAIDO_CONFIG")]
    config: Option<PathBuf>,

    /// Assets root, overriding `paths.assets_root`
    #[arg(short, long, global = true, env = "GYOGAIDO_ASSETS_ROOT")]
    root: Option<PathBuf>,

    /// Skip the pauses between requests
    #[arg(long, global = true)]
    no_delay: bool,

    /// Log debug detail
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Fetch metadata and images for every species and write the dataset
    Extract,
    /// Resize every category image to the configured size
    Resize,
    /// Replace undecodable images, then resize everything
    Repair,
    /// Print manual image sourcing links for each species
    SearchUrls,
    /// Print FishBase search links for each species
    FishbaseUrls,
    /// List Wikimedia Commons file titles matching a term
    CommonsSearch { term: String },
    /// Print the effective configuration
    Config,
}

impl Cli {
    fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else if self.quiet {
            log::LevelFilter::Warn
        } else {
            log::LevelFilter::Info
        }
    }
}

fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(root) = &cli.root {
        config.paths.assets_root = root.clone();
    }
    if cli.no_delay {
        config.pacing = PacingConfig::immediate();
    }
    config
}

fn open_store(config: &Config) -> Result<ImageStore, error::AssetError> {
    ImageStore::init(
        &config.paths.images_root(),
        &config.dataset.path_prefix,
        config.resize.jpeg_quality,
    )
}

/// Store over an images tree that must already exist.
fn existing_store(config: &Config) -> Result<ImageStore, error::AssetError> {
    let images_root = config.paths.images_root();
    if !images_root.is_dir() {
        return Err(error::AssetError::Config(format!(
            "No images directory at {}; run extract first",
            images_root.display()
        )));
    }
    Ok(ImageStore::open(
        &images_root,
        &config.dataset.path_prefix,
        config.resize.jpeg_quality,
    ))
}

/// Species from the existing dataset file, or the built-in list when there is none.
fn known_species(config: &Config) -> Vec<Species> {
    let dataset_path = config.paths.dataset_path();
    if !dataset_path.exists() {
        return species_catalog::sushi_species();
    }
    match dataset_assembler::read_dataset(&dataset_path) {
        Ok(dataset) => dataset
            .fish_database
            .iter()
            .map(dataset_assembler::FishRecord::species)
            .collect(),
        Err(err) => {
            warn!("Ignoring unreadable dataset: {err}");
            species_catalog::sushi_species()
        }
    }
}

fn run_extract(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let http = HttpSession::new(&config.network);
    let renderer = PlaceholderRenderer::new(&config.placeholder)?;
    let assembler = DatasetAssembler {
        http: &http,
        store: &store,
        metadata_sources: metadata_sources::default_sources(&config.network),
        pipeline: FallbackPipeline::new(config.pacing.between_sources()),
        renderer: &renderer,
        pacing: config.pacing.clone(),
        settings: config.dataset.clone(),
    };

    let species = species_catalog::sushi_species();
    let dataset = assembler.assemble(&species)?;
    dataset_assembler::write_dataset(&config.paths.dataset_path(), &dataset)?;
    info!(
        "Extraction complete: {} species in {}",
        dataset.metadata.total_species,
        config.paths.dataset_path().display()
    );
    Ok(())
}

fn run_resize(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = existing_store(config)?;
    image_resizer::resize_all(
        &store,
        config.resize.width,
        config.resize.height,
        config.resize.jpeg_quality,
    );
    Ok(())
}

fn run_repair(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = existing_store(config)?;
    let http = HttpSession::new(&config.network);
    let renderer = PlaceholderRenderer::new(&config.placeholder)?;
    let context = SourceContext {
        http: &http,
        store: &store,
        after_download: config.pacing.after_download(),
    };
    let summary = image_resizer::repair_broken_images(&context, &renderer)?;
    info!(
        "Repair complete: {} downloaded, {} placeholders, {} skipped",
        summary.redownloaded, summary.placeholders, summary.skipped
    );
    image_resizer::resize_all(
        &store,
        config.resize.width,
        config.resize.height,
        config.resize.jpeg_quality,
    );
    Ok(())
}

fn run_commons_search(config: &Config, term: &str) -> Result<(), Box<dyn std::error::Error>> {
    let http = HttpSession::new(&config.network);
    let titles = CommonsAdapter::search_titles(&http, term)?;
    println!("Found {} results for '{}':", titles.len(), term);
    for (position, title) in titles.iter().enumerate() {
        println!("{}. {}", position + 1, title);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    clog.filter(None, cli.log_level());
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let config = apply_overrides(config::load_config(cli.config.as_deref())?, &cli);

    match &cli.command {
        Command::Extract => run_extract(&config)?,
        Command::Resize => run_resize(&config)?,
        Command::Repair => run_repair(&config)?,
        Command::SearchUrls => {
            print!(
                "{}",
                search_links::render_sourcing_report(&known_species(&config))
            );
        }
        Command::FishbaseUrls => {
            for species in known_species(&config) {
                println!(
                    "{}: {}",
                    species.common_name,
                    search_links::fishbase_search_url(&species.scientific_name)
                );
            }
        }
        Command::CommonsSearch { term } => run_commons_search(&config, term)?,
        Command::Config => print!("{}", config::render_config(&config)?),
    }
    Ok(())
}
