//! Pricing sources
//!
//! A source builds a complete [`PriceTable`] for a region. The loader never
//! talks to a network; anything that fetches live prices runs before the
//! engine and hands its result over as a file.

use std::path::PathBuf;
use tracing::{debug, info};

use super::catalog::{region_multiplier, PriceTable};
use crate::error::{EstimationError, EstimationResult};

/// Trait for pricing sources
#[cfg_attr(test, mockall::automock)]
pub trait PricingSource {
    /// Source name used in logs and catalog origins
    fn name(&self) -> &'static str;

    /// Build a complete price table for a region
    fn fetch(&self, region: &str) -> EstimationResult<PriceTable>;
}

/// Published on-demand list prices adjusted for the region
#[derive(Debug, Clone, Default)]
pub struct PublishedRateSource;

impl PublishedRateSource {
    pub fn new() -> Self {
        Self
    }
}

impl PricingSource for PublishedRateSource {
    fn name(&self) -> &'static str {
        "published-rates"
    }

    fn fetch(&self, region: &str) -> EstimationResult<PriceTable> {
        let multiplier = region_multiplier(region);
        debug!(region = region, multiplier = multiplier, "Applying region multiplier");
        Ok(PriceTable::baseline().scaled(multiplier))
    }
}

/// Price table read from a JSON file, e.g. one exported by a price collector
#[derive(Debug, Clone)]
pub struct FileRateSource {
    path: PathBuf,
}

impl FileRateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PricingSource for FileRateSource {
    fn name(&self) -> &'static str {
        "price-file"
    }

    fn fetch(&self, region: &str) -> EstimationResult<PriceTable> {
        info!(path = %self.path.display(), region = region, "Reading price table");

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            EstimationError::PricingUnavailable(format!(
                "cannot read {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let table: PriceTable = serde_json::from_str(&content).map_err(|e| {
            EstimationError::PricingUnavailable(format!(
                "malformed price table {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(table)
    }
}
