//! Run configuration model and defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;

use crate::error::AssetError;

const CONFIG_DIR_NAME: &str = "gyogaido-assets";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Root configuration, optionally read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Where assets and the dataset are written.
    pub paths: PathsConfig,
    #[serde(default)]
    /// HTTP session settings.
    pub network: NetworkConfig,
    #[serde(default)]
    /// Fixed rate-limiting delays.
    pub pacing: PacingConfig,
    #[serde(default)]
    /// Placeholder canvas and caption settings.
    pub placeholder: PlaceholderConfig,
    #[serde(default)]
    /// Uniform resize pass settings.
    pub resize: ResizeConfig,
    #[serde(default)]
    /// Dataset document settings.
    pub dataset: DatasetConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PathsConfig {
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_dataset_file")]
    pub dataset_file: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NetworkConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    #[serde(default = "default_fishbase_api_url")]
    pub fishbase_api_url: String,
}

/// Delays between outbound requests. There is no adaptive backoff.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PacingConfig {
    #[serde(default = "default_between_sources_ms")]
    pub between_sources_ms: u64,
    #[serde(default = "default_after_download_ms")]
    pub after_download_ms: u64,
    #[serde(default = "default_between_entities_ms")]
    pub between_entities_ms: u64,
    #[serde(default = "default_after_metadata_ms")]
    pub after_metadata_ms: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PlaceholderConfig {
    #[serde(default = "default_placeholder_width")]
    pub width: u32,
    #[serde(default = "default_placeholder_height")]
    pub height: u32,
    #[serde(default = "default_caption_scale_px")]
    pub caption_scale_px: f32,
    /// TrueType font for captions. The bundled face is used when unset.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ResizeConfig {
    #[serde(default = "default_resize_width")]
    pub width: u32,
    #[serde(default = "default_resize_height")]
    pub height: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DatasetConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default = "default_description_max_chars")]
    pub description_max_chars: usize,
    /// Prefix used for image paths recorded in the dataset, as the app sees them.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            assets_root: default_assets_root(),
            images_dir: default_images_dir(),
            data_dir: default_data_dir(),
            dataset_file: default_dataset_file(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            fishbase_api_url: default_fishbase_api_url(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            between_sources_ms: default_between_sources_ms(),
            after_download_ms: default_after_download_ms(),
            between_entities_ms: default_between_entities_ms(),
            after_metadata_ms: default_after_metadata_ms(),
        }
    }
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            width: default_placeholder_width(),
            height: default_placeholder_height(),
            caption_scale_px: default_caption_scale_px(),
            font_path: None,
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            width: default_resize_width(),
            height: default_resize_height(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            description_max_chars: default_description_max_chars(),
            path_prefix: default_path_prefix(),
        }
    }
}

impl PathsConfig {
    pub fn images_root(&self) -> PathBuf {
        self.assets_root.join(&self.images_dir)
    }

    pub fn data_root(&self) -> PathBuf {
        self.assets_root.join(&self.data_dir)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_root().join(&self.dataset_file)
    }
}

impl PacingConfig {
    /// All delays zeroed.
    pub fn immediate() -> Self {
        Self {
            between_sources_ms: 0,
            after_download_ms: 0,
            between_entities_ms: 0,
            after_metadata_ms: 0,
        }
    }

    pub fn between_sources(&self) -> Duration {
        Duration::from_millis(self.between_sources_ms)
    }

    pub fn after_download(&self) -> Duration {
        Duration::from_millis(self.after_download_ms)
    }

    pub fn between_entities(&self) -> Duration {
        Duration::from_millis(self.between_entities_ms)
    }

    pub fn after_metadata(&self) -> Duration {
        Duration::from_millis(self.after_metadata_ms)
    }
}

/// Sleeps for `delay` unless it is zero.
pub fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Loads `explicit_path` if given, else the per-user config file if it exists,
/// else built-in defaults.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config, AssetError> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path().filter(|path| path.exists()) {
            Some(path) => path,
            None => {
                info!("No config file found. Using built-in defaults");
                return Ok(Config::default());
            }
        },
    };

    let text = std::fs::read_to_string(&path).map_err(|err| AssetError::io(&path, err))?;
    let config: Config = toml::from_str(&text)
        .map_err(|err| AssetError::Config(format!("{}: {err}", path.display())))?;
    info!("Loaded config. path={}", path.display());
    Ok(config)
}

pub fn render_config(config: &Config) -> Result<String, AssetError> {
    toml::to_string(config).map_err(|err| AssetError::Config(err.to_string()))
}

fn default_assets_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_images_dir() -> String {
    "images".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_dataset_file() -> String {
    "fish_database.json".to_string()
}

fn default_user_agent() -> String {
    "Gyo-Gai-Do-App/1.0 (Educational Research)".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_download_timeout_secs() -> u64 {
    30
}

fn default_fishbase_api_url() -> String {
    "https://fishbase.ropensci.org".to_string()
}

fn default_between_sources_ms() -> u64 {
    1_000
}

fn default_after_download_ms() -> u64 {
    1_000
}

fn default_between_entities_ms() -> u64 {
    2_000
}

fn default_after_metadata_ms() -> u64 {
    1_000
}

fn default_placeholder_width() -> u32 {
    600
}

fn default_placeholder_height() -> u32 {
    400
}

fn default_caption_scale_px() -> f32 {
    32.0
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_resize_width() -> u32 {
    400
}

fn default_resize_height() -> u32 {
    300
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

fn default_description_max_chars() -> usize {
    200
}

fn default_path_prefix() -> String {
    "assets/images".to_string()
}
