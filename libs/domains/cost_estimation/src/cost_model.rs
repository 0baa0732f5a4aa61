//! Rule-based monthly cost model for declared environments
//!
//! Stages run in a fixed order and only ever append line items:
//! networking, load balancing, compute, registry, class-specific extras.
//! Every rule below is a pure function of [`EnvironmentClass`].

use tracing::debug;

use crate::error::EstimationResult;
use crate::models::{
    CostBreakdown, CostCategory, EnvironmentClass, EnvironmentProfile, EstimatedScale,
    ResourceEstimate,
};
use crate::pricing::{PricingCatalog, DEFAULT_REGION};

/// AZs assumed when a profile declares none
pub const DEFAULT_AVAILABILITY_ZONES: usize = 2;

const NAT_DATA_PROCESSING_PER_AZ: f64 = 15.0;
const REGISTRY_IMAGE_STORAGE_GB: f64 = 2.0;
const MULTI_ZONE_MULTIPLIER: f64 = 2.0;
const ENHANCED_MONITORING: f64 = 15.0;
const BACKUP_SERVICES: f64 = 25.0;
const BASIC_MONITORING: f64 = 5.0;
const MINIMAL_MONITORING: f64 = 2.0;

/// Which compute platform an environment is billed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputePath {
    Orchestration,
    Serverless,
}

/// Worker node sizing for the orchestration path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTier {
    pub count: u32,
    pub instance_type: &'static str,
}

/// Per-task allocation for the serverless path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskTier {
    pub vcpu: f64,
    pub memory_gb: f64,
    pub tasks: u32,
}

/// Managed database sizing added by the extras stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatabaseTier {
    pub instance_class: &'static str,
    pub multi_zone: bool,
    pub storage_gb: f64,
}

/// Compute platform for an environment.
///
/// The orchestration class always runs on the cluster; any other class does
/// when its source module is a Kubernetes module. Sizing still follows the class.
pub fn compute_path(class: EnvironmentClass, source_module: Option<&str>) -> ComputePath {
    let kubernetes_module = source_module
        .map(|module| module.to_ascii_lowercase().contains("eks"))
        .unwrap_or(false);

    if class == EnvironmentClass::Orchestration || kubernetes_module {
        ComputePath::Orchestration
    } else {
        ComputePath::Serverless
    }
}

pub fn traffic_unit_multiplier(class: EnvironmentClass) -> f64 {
    match class {
        EnvironmentClass::Production => 2.0,
        _ => 0.5,
    }
}

pub fn node_tier(class: EnvironmentClass) -> NodeTier {
    match class {
        EnvironmentClass::Production => NodeTier {
            count: 3,
            instance_type: "t3.large",
        },
        _ => NodeTier {
            count: 2,
            instance_type: "t3.medium",
        },
    }
}

pub fn task_tier(class: EnvironmentClass) -> TaskTier {
    match class {
        EnvironmentClass::Production => TaskTier {
            vcpu: 2.0,
            memory_gb: 4.0,
            tasks: 3,
        },
        EnvironmentClass::Staging => TaskTier {
            vcpu: 1.0,
            memory_gb: 2.0,
            tasks: 2,
        },
        _ => TaskTier {
            vcpu: 0.5,
            memory_gb: 1.0,
            tasks: 1,
        },
    }
}

pub fn database_tier(class: EnvironmentClass) -> Option<DatabaseTier> {
    match class {
        EnvironmentClass::Production => Some(DatabaseTier {
            instance_class: "db.t3.small",
            multi_zone: true,
            storage_gb: 20.0,
        }),
        EnvironmentClass::Staging => Some(DatabaseTier {
            instance_class: "db.t3.micro",
            multi_zone: false,
            storage_gb: 10.0,
        }),
        _ => None,
    }
}

pub fn estimated_scale(class: EnvironmentClass) -> EstimatedScale {
    match class {
        EnvironmentClass::Production => EstimatedScale::High,
        EnvironmentClass::Staging => EstimatedScale::Medium,
        _ => EstimatedScale::Low,
    }
}

/// Estimates monthly cost for environment profiles
#[derive(Debug, Clone, Default)]
pub struct CostModel;

impl CostModel {
    pub fn new() -> Self {
        Self
    }

    /// Itemized monthly cost of one environment.
    ///
    /// Fails only when the catalog lacks a category the model needs, which is
    /// a contract violation between catalog and model.
    pub fn estimate(
        &self,
        profile: &EnvironmentProfile,
        catalog: &PricingCatalog,
    ) -> EstimationResult<CostBreakdown> {
        let class = profile.class();
        let mut breakdown = CostBreakdown::new();

        self.networking(profile, catalog, &mut breakdown);
        self.load_balancing(class, catalog, &mut breakdown);
        match compute_path(class, profile.source_module.as_deref()) {
            ComputePath::Orchestration => self.cluster_compute(class, catalog, &mut breakdown)?,
            ComputePath::Serverless => self.container_compute(class, catalog, &mut breakdown),
        }
        self.registry(catalog, &mut breakdown);
        self.extras(class, catalog, &mut breakdown)?;

        debug!(
            environment = profile.name(),
            class = %class,
            items = breakdown.len(),
            total = breakdown.total(),
            "Estimated environment cost"
        );

        Ok(breakdown)
    }

    /// Resource summary reported alongside the cost breakdown
    pub fn resource_estimate(&self, profile: &EnvironmentProfile) -> ResourceEstimate {
        ResourceEstimate {
            environment_class: profile.class(),
            region: profile
                .region
                .clone()
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            vpc_subnets: profile.subnet_count(),
            availability_zones: profile.availability_zone_count(),
            cluster_name: profile
                .cluster_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            estimated_scale: estimated_scale(profile.class()),
        }
    }

    fn networking(
        &self,
        profile: &EnvironmentProfile,
        catalog: &PricingCatalog,
        breakdown: &mut CostBreakdown,
    ) {
        let declared = profile.availability_zone_count();
        let zones = if declared == 0 {
            DEFAULT_AVAILABILITY_ZONES
        } else {
            declared
        };
        let azs = zones as f64;

        breakdown.push(
            format!("NAT Gateways ({}x)", azs),
            CostCategory::Networking,
            catalog.nat_gateway_monthly() * azs,
        );
        breakdown.push(
            "NAT Gateway Data Processing",
            CostCategory::Networking,
            NAT_DATA_PROCESSING_PER_AZ * azs,
        );
    }

    fn load_balancing(
        &self,
        class: EnvironmentClass,
        catalog: &PricingCatalog,
        breakdown: &mut CostBreakdown,
    ) {
        breakdown.push(
            "Application Load Balancer",
            CostCategory::LoadBalancing,
            catalog.load_balancer_base_monthly(),
        );

        let label = match class {
            EnvironmentClass::Production => "ALB LCUs (Production)",
            _ => "ALB LCUs (Dev/Staging)",
        };
        breakdown.push(
            label,
            CostCategory::LoadBalancing,
            catalog.load_balancer_unit_monthly() * traffic_unit_multiplier(class),
        );
    }

    fn cluster_compute(
        &self,
        class: EnvironmentClass,
        catalog: &PricingCatalog,
        breakdown: &mut CostBreakdown,
    ) -> EstimationResult<()> {
        let tier = node_tier(class);
        let node_monthly = catalog.instance_monthly(tier.instance_type)?;

        breakdown.push(
            "EKS Cluster Management",
            CostCategory::Compute,
            catalog.control_plane_monthly(),
        );
        breakdown.push(
            format!("Worker Nodes ({}x {})", tier.count, tier.instance_type),
            CostCategory::Compute,
            node_monthly * tier.count as f64,
        );
        Ok(())
    }

    fn container_compute(
        &self,
        class: EnvironmentClass,
        catalog: &PricingCatalog,
        breakdown: &mut CostBreakdown,
    ) {
        let tier = task_tier(class);
        let tasks = tier.tasks as f64;

        breakdown.push(
            format!("Fargate CPU ({} vCPUs)", tier.vcpu * tasks),
            CostCategory::Compute,
            catalog.container_cpu_monthly() * tier.vcpu * tasks,
        );
        breakdown.push(
            format!("Fargate Memory ({} GB)", tier.memory_gb * tasks),
            CostCategory::Compute,
            catalog.container_memory_monthly() * tier.memory_gb * tasks,
        );
    }

    fn registry(&self, catalog: &PricingCatalog, breakdown: &mut CostBreakdown) {
        breakdown.push(
            "ECR Storage",
            CostCategory::Registry,
            REGISTRY_IMAGE_STORAGE_GB * catalog.registry_storage_per_gb_month(),
        );
    }

    fn extras(
        &self,
        class: EnvironmentClass,
        catalog: &PricingCatalog,
        breakdown: &mut CostBreakdown,
    ) -> EstimationResult<()> {
        if let Some(tier) = database_tier(class) {
            let base = catalog.database_monthly(tier.instance_class)?;
            let (label, amount) = if tier.multi_zone {
                ("RDS (Multi-AZ)", base * MULTI_ZONE_MULTIPLIER)
            } else {
                ("RDS (Single-AZ)", base)
            };
            breakdown.push(label, CostCategory::Database, amount);
            breakdown.push(
                "RDS Storage",
                CostCategory::Storage,
                tier.storage_gb * catalog.database_storage_per_gb_month(),
            );
        }

        match class {
            EnvironmentClass::Production => {
                breakdown.push("CloudWatch Enhanced", CostCategory::Monitoring, ENHANCED_MONITORING);
                breakdown.push("Backup Services", CostCategory::Backup, BACKUP_SERVICES);
            }
            EnvironmentClass::Staging => {
                breakdown.push("CloudWatch Basic", CostCategory::Monitoring, BASIC_MONITORING);
            }
            _ => {
                breakdown.push("CloudWatch Minimal", CostCategory::Monitoring, MINIMAL_MONITORING);
            }
        }

        Ok(())
    }
}
