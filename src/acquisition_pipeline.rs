//! Ordered source fallback with placeholder backfill.
//!
//! For every category the pipeline ends with exactly `target_count` files on
//! disk: real images from the first adapters that can supply them, then
//! placeholders numbered on from the last real one.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info, warn};

use crate::asset_store::ImageStore;
use crate::config::pause;
use crate::error::AssetError;
use crate::image_category::ImageCategory;
use crate::placeholder_renderer::PlaceholderRender;
use crate::sources::{default_chain, ImageQuery, SlotRange, SourceAdapter, SourceContext};

/// Result of running one category's adapter chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionOutcome {
    /// Real images in slot order, starting at slot 0.
    pub saved: Vec<PathBuf>,
    /// Slots still empty after every adapter had its turn.
    pub shortfall: usize,
}

pub struct FallbackPipeline {
    chains: HashMap<ImageCategory, Vec<Box<dyn SourceAdapter>>>,
    between_sources: Duration,
}

impl FallbackPipeline {
    /// Pipeline using the built-in priority chain for every category.
    pub fn new(between_sources: Duration) -> Self {
        let chains = ImageCategory::ALL
            .into_iter()
            .map(|category| (category, default_chain(category)))
            .collect();
        Self {
            chains,
            between_sources,
        }
    }

    /// Replaces the adapter chain for one category.
    #[cfg(test)]
    pub fn with_chain(
        mut self,
        category: ImageCategory,
        adapters: Vec<Box<dyn SourceAdapter>>,
    ) -> Self {
        self.chains.insert(category, adapters);
        self
    }

    /// Tries adapters in priority order until the category target is met.
    ///
    /// An adapter error counts as zero results. Never returns more than the
    /// target.
    pub fn acquire(&self, context: &SourceContext<'_>, query: &ImageQuery<'_>) -> AcquisitionOutcome {
        let target = query.category.target_count();
        let mut saved: Vec<PathBuf> = Vec::new();
        let adapters = self
            .chains
            .get(&query.category)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for (position, adapter) in adapters.iter().enumerate() {
            if saved.len() >= target {
                break;
            }
            if position > 0 {
                pause(self.between_sources);
            }
            let slots = SlotRange {
                start: saved.len(),
                remaining: target - saved.len(),
            };
            match adapter.attempt(context, query, slots) {
                Ok(mut found) => {
                    if found.len() > slots.remaining {
                        for extra in found.drain(slots.remaining..) {
                            warn!(
                                "[{}] {} wrote past its slots; removing {}",
                                query.entity_id,
                                adapter.name(),
                                extra.display()
                            );
                            if let Err(err) = fs::remove_file(&extra) {
                                warn!("Failed to remove {}: {}", extra.display(), err);
                            }
                        }
                    }
                    debug!(
                        "[{}] {} gave {} {} image(s)",
                        query.entity_id,
                        adapter.name(),
                        found.len(),
                        query.category
                    );
                    saved.extend(found);
                }
                Err(error) => {
                    warn!(
                        "[{}] {} failed for {}: {}",
                        query.entity_id,
                        adapter.name(),
                        query.category,
                        error
                    );
                }
            }
        }

        info!(
            "[{}] {}: downloaded {}/{}",
            query.entity_id,
            query.category,
            saved.len(),
            target
        );
        let shortfall = target - saved.len();
        AcquisitionOutcome { saved, shortfall }
    }

    /// Runs [`FallbackPipeline::acquire`] and fills the shortfall with
    /// placeholders, returning exactly `target_count` paths in slot order.
    pub fn fill_category(
        &self,
        context: &SourceContext<'_>,
        query: &ImageQuery<'_>,
        renderer: &dyn PlaceholderRender,
        caption: &str,
    ) -> Result<Vec<PathBuf>, AssetError> {
        let outcome = self.acquire(context, query);
        backfill(outcome, context.store, query, renderer, caption)
    }
}

/// Draws one placeholder per missing slot, numbered after the real images.
pub fn backfill(
    outcome: AcquisitionOutcome,
    store: &ImageStore,
    query: &ImageQuery<'_>,
    renderer: &dyn PlaceholderRender,
    caption: &str,
) -> Result<Vec<PathBuf>, AssetError> {
    let AcquisitionOutcome {
        mut saved,
        shortfall,
    } = outcome;
    let first_missing = saved.len();
    for index in first_missing..first_missing + shortfall {
        saved.push(renderer.render(store, query.category, query.entity_id, caption, index)?);
    }
    Ok(saved)
}
