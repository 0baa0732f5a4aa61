//! Pricing catalog
//!
//! [`CatalogLoader::load`] always returns a complete catalog: a usable
//! persisted snapshot, a freshly built one, or the hardcoded default snapshot
//! substituted in full.

pub mod cache;
pub mod catalog;
pub mod source;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

pub use cache::{PersistedSnapshot, SnapshotCache, DEFAULT_VALIDITY_HOURS};
pub use catalog::{
    region_multiplier, CatalogOrigin, ContainerRates, DataTransferRates, DatabaseRates,
    LoadBalancerRates, PriceCategory, PriceTable, PricingCatalog, DEFAULT_REGION,
    HOURS_PER_MONTH,
};
pub use source::{FileRateSource, PricingSource, PublishedRateSource};

use crate::error::EstimationResult;

/// Builds pricing catalogs from a source, with an optional persisted snapshot
pub struct CatalogLoader {
    source: Box<dyn PricingSource>,
    cache: Option<SnapshotCache>,
}

impl CatalogLoader {
    pub fn new(source: Box<dyn PricingSource>) -> Self {
        Self {
            source,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Load a catalog for `region`
    pub fn load(&self, region: &str) -> PricingCatalog {
        self.load_at(region, Utc::now())
    }

    /// Load a catalog for `region` as of `now`
    pub fn load_at(&self, region: &str, now: DateTime<Utc>) -> PricingCatalog {
        if let Some(catalog) = self.read_cached(region, now) {
            metrics::counter!("pricing_catalog_loads_total", "outcome" => "cache_hit").increment(1);
            info!(region = region, "Using cached pricing snapshot");
            return catalog;
        }

        metrics::counter!("pricing_catalog_loads_total", "outcome" => "cache_miss").increment(1);
        self.rebuild(region, now)
    }

    /// Ignore any persisted snapshot and rebuild from the source
    pub fn refresh(&self, region: &str) -> PricingCatalog {
        self.rebuild(region, Utc::now())
    }

    fn read_cached(&self, region: &str, now: DateTime<Utc>) -> Option<PricingCatalog> {
        let snapshot = self.cache.as_ref()?.read(region, now)?;
        let origin = CatalogOrigin::Cached {
            captured_at: snapshot.captured_at,
        };

        match PricingCatalog::new(region, origin, snapshot.pricing) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                warn!(region = region, error = %e, "Discarding invalid pricing snapshot");
                None
            }
        }
    }

    fn rebuild(&self, region: &str, now: DateTime<Utc>) -> PricingCatalog {
        info!(region = region, source = self.source.name(), "Building pricing snapshot");

        match self.build(region) {
            Ok(catalog) => {
                self.persist(&catalog, now);
                catalog
            }
            Err(e) => {
                warn!(
                    region = region,
                    source = self.source.name(),
                    error = %e,
                    "Pricing source failed, substituting default snapshot"
                );
                metrics::counter!("pricing_catalog_loads_total", "outcome" => "fallback")
                    .increment(1);
                PricingCatalog::fallback(region, e.to_string())
            }
        }
    }

    fn build(&self, region: &str) -> EstimationResult<PricingCatalog> {
        let table = self.source.fetch(region)?;
        let origin = CatalogOrigin::Fresh {
            source: self.source.name().to_string(),
        };
        PricingCatalog::new(region, origin, table)
    }

    fn persist(&self, catalog: &PricingCatalog, now: DateTime<Utc>) {
        let Some(cache) = &self.cache else {
            return;
        };

        let snapshot = PersistedSnapshot {
            captured_at: now,
            region: catalog.region().to_string(),
            pricing: catalog.prices().clone(),
        };

        match cache.write(&snapshot) {
            Ok(path) => info!(path = %path.display(), "Pricing snapshot cached"),
            Err(e) => warn!(error = %e, "Could not save pricing snapshot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EstimationError;
    use chrono::Duration;
    use source::MockPricingSource;

    fn failing_source() -> MockPricingSource {
        let mut source = MockPricingSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_fetch()
            .returning(|_| Err(EstimationError::PricingUnavailable("offline".into())));
        source
    }

    #[test]
    fn test_source_failure_substitutes_full_fallback() {
        let loader = CatalogLoader::new(Box::new(failing_source()));

        let catalog = loader.load("eu-west-1");

        assert!(catalog.is_fallback());
        assert_eq!(catalog.region(), "eu-west-1");
        assert_eq!(catalog.prices(), &PriceTable::baseline());
        assert!(catalog.prices().validate().is_ok());
    }

    #[test]
    fn test_partial_table_is_never_returned() {
        let mut source = MockPricingSource::new();
        source.expect_name().return_const("mock");
        source.expect_fetch().returning(|_| {
            let mut table = PriceTable::baseline();
            table.block_storage.clear();
            Ok(table)
        });

        let catalog = CatalogLoader::new(Box::new(source)).load("eu-west-1");

        assert!(catalog.is_fallback());
        assert!(catalog.storage_per_gb_month("gp3").is_ok());
    }

    #[test]
    fn test_fresh_build_is_persisted_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();

        let mut source = MockPricingSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_fetch()
            .times(1)
            .returning(|region| Ok(PriceTable::baseline().scaled(region_multiplier(region))));

        let loader = CatalogLoader::new(Box::new(source))
            .with_cache(SnapshotCache::with_default_validity(dir.path()));

        let first = loader.load_at("eu-west-1", now);
        assert!(matches!(first.origin(), CatalogOrigin::Fresh { .. }));

        let second = loader.load_at("eu-west-1", now + Duration::hours(1));
        assert_eq!(second.origin(), &CatalogOrigin::Cached { captured_at: now });
        assert_eq!(second.prices(), first.prices());
    }

    #[test]
    fn test_expired_snapshot_triggers_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::with_default_validity(dir.path());
        let now = Utc::now();

        cache
            .write(&PersistedSnapshot {
                captured_at: now - Duration::hours(24),
                region: "eu-west-1".into(),
                pricing: PriceTable::baseline().scaled(3.0),
            })
            .unwrap();

        let loader = CatalogLoader::new(Box::new(PublishedRateSource::new())).with_cache(cache);

        let catalog = loader.load_at("eu-west-1", now);
        assert!(matches!(catalog.origin(), CatalogOrigin::Fresh { .. }));
        assert_eq!(catalog.prices(), &PublishedRateSource::new().fetch("eu-west-1").unwrap());

        // boundary decision stays the same within the run
        let again = loader.load_at("eu-west-1", now);
        assert_eq!(again.origin(), &CatalogOrigin::Cached { captured_at: now });
    }

    #[test]
    fn test_invalid_cached_snapshot_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::with_default_validity(dir.path());
        let now = Utc::now();

        let mut pricing = PriceTable::baseline();
        pricing.nat_gateway_hourly = -1.0;
        cache
            .write(&PersistedSnapshot {
                captured_at: now,
                region: "us-east-1".into(),
                pricing,
            })
            .unwrap();

        let catalog = CatalogLoader::new(Box::new(PublishedRateSource::new()))
            .with_cache(cache)
            .load_at("us-east-1", now);

        assert!(matches!(catalog.origin(), CatalogOrigin::Fresh { .. }));
        assert!(catalog.nat_gateway_monthly() > 0.0);
    }

    #[test]
    fn test_unwritable_cache_is_not_fatal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // a regular file cannot act as the cache directory
        let loader = CatalogLoader::new(Box::new(PublishedRateSource::new()))
            .with_cache(SnapshotCache::with_default_validity(file.path()));

        let catalog = loader.load("us-east-1");
        assert!(matches!(catalog.origin(), CatalogOrigin::Fresh { .. }));
    }
}
