//! Error types shared across the asset preparation pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a single image or metadata source.
///
/// These never abort a run: acquisition treats any of them as "this source
/// produced nothing" and moves on to the next one.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Response is not an image (content-type '{0}')")]
    NotAnImage(String),

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Payload could not be decoded as an image")]
    Decode,
}

/// Crate-level error for failures that end an entity or the whole run.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Dataset JSON error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Duplicate entity id '{0}'")]
    DuplicateId(String),

    #[error("Entity has an empty display name")]
    EmptyName,

    #[error("Placeholder rendering failed: {0}")]
    Render(String),

    #[error("Cannot decode image {}", .0.display())]
    Undecodable(PathBuf),

    #[error("Failed to encode image {}", .0.display())]
    Encode(PathBuf),
}

impl AssetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
