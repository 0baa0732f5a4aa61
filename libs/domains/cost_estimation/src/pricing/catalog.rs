//! Price snapshot types
//!
//! A [`PriceTable`] is the raw, serializable set of unit prices. A
//! [`PricingCatalog`] wraps a validated table together with the region it was
//! built for and where it came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString};

use crate::error::{EstimationError, EstimationResult};

/// Hours billed per month for hourly-priced resources
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Region used when a profile or caller declares none
pub const DEFAULT_REGION: &str = "eu-west-1";

/// Instance types the cost model and scenario sizing rely on
pub const REQUIRED_INSTANCE_TYPES: &[&str] = &["t3.medium", "t3.large"];

/// Block storage tiers the cost model and scenario sizing rely on
pub const REQUIRED_STORAGE_TIERS: &[&str] = &["gp3", "gp2"];

/// Database instance classes the cost model relies on
pub const REQUIRED_DATABASE_CLASSES: &[&str] = &["db.t3.micro", "db.t3.small"];

/// Price category enumeration
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PriceCategory {
    ComputeInstance,
    ContainerCpuHour,
    ContainerMemoryHour,
    ClusterControlPlane,
    LoadBalancerBase,
    LoadBalancerUnit,
    BlockStorageTier,
    DataTransfer,
    NatGateway,
    RegistryStorage,
    ManagedDatabase,
}

/// Serverless container rates (per vCPU-hour and GB-hour)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerRates {
    pub cpu_per_vcpu_hour: f64,
    pub memory_per_gb_hour: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerRates {
    pub base_hourly: f64,
    /// Per traffic unit (LCU) hour
    pub unit_hourly: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataTransferRates {
    pub out_per_gb: f64,
    /// Monthly volume billed at zero before `out_per_gb` applies
    pub free_allowance_gb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRates {
    /// Hourly rate per single-zone instance class
    pub instances: BTreeMap<String, f64>,
    pub storage_per_gb_month: f64,
}

/// Complete set of unit prices for one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    /// Hourly on-demand rate per instance type
    pub compute: BTreeMap<String, f64>,
    pub container: ContainerRates,
    pub cluster_control_plane_hourly: f64,
    pub load_balancer: LoadBalancerRates,
    /// Per GB-month rate per block storage tier
    pub block_storage: BTreeMap<String, f64>,
    pub data_transfer: DataTransferRates,
    pub nat_gateway_hourly: f64,
    pub registry_storage_per_gb_month: f64,
    pub database: DatabaseRates,
}

fn rate_map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(name, rate)| (name.to_string(), *rate))
        .collect()
}

impl PriceTable {
    /// Baseline list prices (us-east-1, on-demand, Linux)
    pub fn baseline() -> Self {
        Self {
            compute: rate_map(&[
                ("t3.micro", 0.0104),
                ("t3.small", 0.0208),
                ("t3.medium", 0.0416),
                ("t3.large", 0.0832),
                ("t3.xlarge", 0.1664),
                ("c5.large", 0.085),
                ("c5.xlarge", 0.17),
                ("c5.2xlarge", 0.34),
                ("m5.large", 0.096),
                ("m5.xlarge", 0.192),
                ("m5.2xlarge", 0.384),
                ("r5.large", 0.126),
                ("r5.xlarge", 0.252),
            ]),
            container: ContainerRates {
                cpu_per_vcpu_hour: 0.04048,
                memory_per_gb_hour: 0.004445,
            },
            cluster_control_plane_hourly: 0.10,
            load_balancer: LoadBalancerRates {
                base_hourly: 0.0225,
                unit_hourly: 0.008,
            },
            block_storage: rate_map(&[
                ("gp3", 0.08),
                ("gp2", 0.10),
                ("io1", 0.125),
                ("io2", 0.125),
                ("sc1", 0.025),
                ("st1", 0.045),
            ]),
            data_transfer: DataTransferRates {
                out_per_gb: 0.09,
                free_allowance_gb: 100.0,
            },
            nat_gateway_hourly: 0.045,
            registry_storage_per_gb_month: 0.10,
            database: DatabaseRates {
                instances: rate_map(&[
                    ("db.t3.micro", 0.017),
                    ("db.t3.small", 0.034),
                    ("db.t3.medium", 0.068),
                ]),
                storage_per_gb_month: 0.115,
            },
        }
    }

    /// Apply a region multiplier uniformly to every unit price
    pub fn scaled(&self, multiplier: f64) -> Self {
        let scale_map = |map: &BTreeMap<String, f64>| {
            map.iter()
                .map(|(name, rate)| (name.clone(), rate * multiplier))
                .collect()
        };

        Self {
            compute: scale_map(&self.compute),
            container: ContainerRates {
                cpu_per_vcpu_hour: self.container.cpu_per_vcpu_hour * multiplier,
                memory_per_gb_hour: self.container.memory_per_gb_hour * multiplier,
            },
            cluster_control_plane_hourly: self.cluster_control_plane_hourly * multiplier,
            load_balancer: LoadBalancerRates {
                base_hourly: self.load_balancer.base_hourly * multiplier,
                unit_hourly: self.load_balancer.unit_hourly * multiplier,
            },
            block_storage: scale_map(&self.block_storage),
            data_transfer: DataTransferRates {
                out_per_gb: self.data_transfer.out_per_gb * multiplier,
                free_allowance_gb: self.data_transfer.free_allowance_gb,
            },
            nat_gateway_hourly: self.nat_gateway_hourly * multiplier,
            registry_storage_per_gb_month: self.registry_storage_per_gb_month * multiplier,
            database: DatabaseRates {
                instances: scale_map(&self.database.instances),
                storage_per_gb_month: self.database.storage_per_gb_month * multiplier,
            },
        }
    }

    /// Every price in the table, labelled with its category
    fn entries(&self) -> Vec<(PriceCategory, String, f64)> {
        use PriceCategory::*;

        let mut entries = vec![
            (ContainerCpuHour, "cpu_per_vcpu_hour".to_string(), self.container.cpu_per_vcpu_hour),
            (ContainerMemoryHour, "memory_per_gb_hour".to_string(), self.container.memory_per_gb_hour),
            (ClusterControlPlane, "control_plane_hourly".to_string(), self.cluster_control_plane_hourly),
            (LoadBalancerBase, "base_hourly".to_string(), self.load_balancer.base_hourly),
            (LoadBalancerUnit, "unit_hourly".to_string(), self.load_balancer.unit_hourly),
            (DataTransfer, "out_per_gb".to_string(), self.data_transfer.out_per_gb),
            (DataTransfer, "free_allowance_gb".to_string(), self.data_transfer.free_allowance_gb),
            (NatGateway, "nat_gateway_hourly".to_string(), self.nat_gateway_hourly),
            (RegistryStorage, "storage_per_gb_month".to_string(), self.registry_storage_per_gb_month),
            (ManagedDatabase, "storage_per_gb_month".to_string(), self.database.storage_per_gb_month),
        ];
        entries.extend(self.compute.iter().map(|(k, v)| (ComputeInstance, k.clone(), *v)));
        entries.extend(self.block_storage.iter().map(|(k, v)| (BlockStorageTier, k.clone(), *v)));
        entries.extend(self.database.instances.iter().map(|(k, v)| (ManagedDatabase, k.clone(), *v)));
        entries
    }

    /// Check that the table is complete and every price is a non-negative number
    pub fn validate(&self) -> EstimationResult<()> {
        for (category, name, value) in self.entries() {
            if !value.is_finite() || value < 0.0 {
                return Err(EstimationError::contract(
                    category,
                    format!("'{}' has invalid price {}", name, value),
                ));
            }
        }

        let required = [
            (PriceCategory::ComputeInstance, &self.compute, REQUIRED_INSTANCE_TYPES),
            (PriceCategory::BlockStorageTier, &self.block_storage, REQUIRED_STORAGE_TIERS),
            (PriceCategory::ManagedDatabase, &self.database.instances, REQUIRED_DATABASE_CLASSES),
        ];
        for (category, map, keys) in required {
            if let Some(missing) = keys.iter().find(|key| !map.contains_key(**key)) {
                return Err(EstimationError::contract(
                    category,
                    format!("'{}' is missing", missing),
                ));
            }
        }

        Ok(())
    }
}

/// Price multiplier for a region relative to the baseline region
pub fn region_multiplier(region: &str) -> f64 {
    match region {
        "us-east-1" | "us-east-2" | "us-west-2" => 1.0,
        "eu-west-1" => 1.02,
        "eu-central-1" | "eu-west-2" => 1.04,
        _ => 1.05,
    }
}

/// Where a catalog's prices came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogOrigin {
    /// Read from a persisted snapshot still inside its validity window
    Cached { captured_at: DateTime<Utc> },
    /// Built from the pricing source during this run
    Fresh { source: String },
    /// Hardcoded default snapshot substituted in full
    Fallback { reason: String },
}

/// Validated, read-only price snapshot for one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingCatalog {
    region: String,
    origin: CatalogOrigin,
    prices: PriceTable,
}

impl PricingCatalog {
    /// Wrap a price table, rejecting incomplete or negative tables
    pub fn new(
        region: impl Into<String>,
        origin: CatalogOrigin,
        prices: PriceTable,
    ) -> EstimationResult<Self> {
        prices.validate()?;
        Ok(Self {
            region: region.into(),
            origin,
            prices,
        })
    }

    /// The hardcoded default snapshot
    pub fn fallback(region: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            origin: CatalogOrigin::Fallback {
                reason: reason.into(),
            },
            prices: PriceTable::baseline(),
        }
    }

    /// Wrap a table without validating it
    #[cfg(test)]
    pub(crate) fn unchecked(region: impl Into<String>, prices: PriceTable) -> Self {
        Self {
            region: region.into(),
            origin: CatalogOrigin::Fresh {
                source: "unchecked".to_string(),
            },
            prices,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn origin(&self) -> &CatalogOrigin {
        &self.origin
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, CatalogOrigin::Fallback { .. })
    }

    pub fn instance_monthly(&self, instance_type: &str) -> EstimationResult<f64> {
        lookup(&self.prices.compute, PriceCategory::ComputeInstance, instance_type)
            .map(|hourly| hourly * HOURS_PER_MONTH)
    }

    pub fn storage_per_gb_month(&self, tier: &str) -> EstimationResult<f64> {
        lookup(&self.prices.block_storage, PriceCategory::BlockStorageTier, tier)
    }

    pub fn database_monthly(&self, instance_class: &str) -> EstimationResult<f64> {
        lookup(&self.prices.database.instances, PriceCategory::ManagedDatabase, instance_class)
            .map(|hourly| hourly * HOURS_PER_MONTH)
    }

    pub fn database_storage_per_gb_month(&self) -> f64 {
        self.prices.database.storage_per_gb_month
    }

    pub fn container_cpu_monthly(&self) -> f64 {
        self.prices.container.cpu_per_vcpu_hour * HOURS_PER_MONTH
    }

    pub fn container_memory_monthly(&self) -> f64 {
        self.prices.container.memory_per_gb_hour * HOURS_PER_MONTH
    }

    pub fn control_plane_monthly(&self) -> f64 {
        self.prices.cluster_control_plane_hourly * HOURS_PER_MONTH
    }

    pub fn load_balancer_base_monthly(&self) -> f64 {
        self.prices.load_balancer.base_hourly * HOURS_PER_MONTH
    }

    pub fn load_balancer_unit_monthly(&self) -> f64 {
        self.prices.load_balancer.unit_hourly * HOURS_PER_MONTH
    }

    pub fn nat_gateway_monthly(&self) -> f64 {
        self.prices.nat_gateway_hourly * HOURS_PER_MONTH
    }

    pub fn registry_storage_per_gb_month(&self) -> f64 {
        self.prices.registry_storage_per_gb_month
    }

    /// Monthly charge for `gb` of outbound transfer after the free allowance
    pub fn data_transfer_cost(&self, gb: f64) -> f64 {
        let rates = &self.prices.data_transfer;
        ((gb - rates.free_allowance_gb) * rates.out_per_gb).max(0.0)
    }
}

fn lookup(map: &BTreeMap<String, f64>, category: PriceCategory, key: &str) -> EstimationResult<f64> {
    map.get(key)
        .copied()
        .ok_or_else(|| EstimationError::contract(category, format!("'{}' is missing", key)))
}
