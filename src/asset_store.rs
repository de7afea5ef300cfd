//! On-disk layout for category image folders.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{AssetError, SourceError};
use crate::http_session::FetchedPayload;
use crate::image_category::ImageCategory;
use crate::image_pipeline;

/// Resolved images root plus the naming rules for every category slot.
///
/// Construct it with [`ImageStore::init`] once per run; nothing else creates
/// directories.
#[derive(Debug, Clone)]
pub struct ImageStore {
    images_root: PathBuf,
    path_prefix: String,
    jpeg_quality: u8,
}

impl ImageStore {
    /// Creates the four category folders under `images_root`.
    pub fn init(
        images_root: &Path,
        path_prefix: &str,
        jpeg_quality: u8,
    ) -> Result<Self, AssetError> {
        for category in ImageCategory::ALL {
            let folder = images_root.join(category.folder());
            fs::create_dir_all(&folder).map_err(|err| AssetError::io(&folder, err))?;
        }
        info!("Image folders ready. root={}", images_root.display());
        Ok(Self::open(images_root, path_prefix, jpeg_quality))
    }

    /// Wraps an existing layout without touching the filesystem.
    pub fn open(images_root: &Path, path_prefix: &str, jpeg_quality: u8) -> Self {
        Self {
            images_root: images_root.to_path_buf(),
            path_prefix: path_prefix.trim_end_matches('/').to_string(),
            jpeg_quality,
        }
    }

    pub fn images_root(&self) -> &Path {
        &self.images_root
    }

    pub fn folder(&self, category: ImageCategory) -> PathBuf {
        self.images_root.join(category.folder())
    }

    pub fn image_path(&self, category: ImageCategory, entity_id: &str, index: usize) -> PathBuf {
        self.folder(category)
            .join(category.file_name(entity_id, index))
    }

    /// Path as recorded in the dataset, e.g. `assets/images/maps/aji_habitat.jpg`.
    pub fn dataset_path(&self, category: ImageCategory, entity_id: &str, index: usize) -> String {
        format!(
            "{}/{}/{}",
            self.path_prefix,
            category.folder(),
            category.file_name(entity_id, index)
        )
    }

    /// Persists a candidate payload at its slot if it is really an image.
    pub fn save_candidate(
        &self,
        payload: &FetchedPayload,
        category: ImageCategory,
        entity_id: &str,
        index: usize,
    ) -> Result<PathBuf, SourceError> {
        if !payload.declares_image() {
            return Err(SourceError::NotAnImage(payload.content_type.clone()));
        }
        if payload.bytes.is_empty() {
            return Err(SourceError::Decode);
        }
        let target = self.image_path(category, entity_id, index);
        image_pipeline::normalize_to_jpeg(&payload.bytes, &target, self.jpeg_quality)
            .ok_or(SourceError::Decode)?;
        debug!("Saved candidate image to {}", target.display());
        Ok(target)
    }
}
