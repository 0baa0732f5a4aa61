use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{EstimationError, EstimationResult};

/// Deployment tier or infrastructure style an environment belongs to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnvironmentClass {
    Production,
    Staging,
    Development,
    Orchestration,
    Serverless,
    Unrecognized,
}

impl EnvironmentClass {
    /// Resolve a declared environment name against the fixed vocabulary
    pub fn from_name(name: &str) -> Self {
        match name {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            "managed-orchestration" | "eks" | "kubernetes" => Self::Orchestration,
            "serverless-container" | "ecs" | "fargate" => Self::Serverless,
            _ => Self::Unrecognized,
        }
    }
}

/// Kind of charge a line item represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CostCategory {
    Networking,
    LoadBalancing,
    Compute,
    Registry,
    Database,
    Storage,
    Monitoring,
    Backup,
    DataTransfer,
}

/// A single named monthly charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLineItem {
    pub label: String,
    pub category: CostCategory,
    /// Monthly amount in USD, never negative
    pub amount: f64,
}

/// Insertion-ordered monthly cost items; the total is always derived from them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostBreakdown {
    items: Vec<CostLineItem>,
}

impl CostBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a charge. Amounts below zero or not finite are recorded as zero.
    /// Pushing an existing label adds to that item instead of replacing it.
    pub fn push(&mut self, label: impl Into<String>, category: CostCategory, amount: f64) {
        let label = label.into();
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };

        match self.items.iter_mut().find(|item| item.label == label) {
            Some(existing) => existing.amount += amount,
            None => self.items.push(CostLineItem {
                label,
                category,
                amount,
            }),
        }
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.amount).sum()
    }

    pub fn items(&self) -> &[CostLineItem] {
        &self.items
    }

    pub fn get(&self, label: &str) -> Option<&CostLineItem> {
        self.items.iter().find(|item| item.label == label)
    }

    pub fn by_category(&self, category: CostCategory) -> impl Iterator<Item = &CostLineItem> {
        self.items.iter().filter(move |item| item.category == category)
    }

    pub fn category_total(&self, category: CostCategory) -> f64 {
        self.by_category(category).map(|item| item.amount).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A listening port as declared; values that are not integers keep their raw text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSetting {
    Number(u16),
    Raw(String),
}

/// Typed parameters extracted from one environment definition.
///
/// Fields the definition does not declare are `None`, so callers can tell an
/// absent value apart from an explicit empty one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    name: String,
    class: EnvironmentClass,
    pub source_module: Option<String>,
    pub region: Option<String>,
    pub vpc_cidr: Option<String>,
    pub public_subnets: Option<Vec<String>>,
    pub private_subnets: Option<Vec<String>>,
    pub availability_zones: Option<Vec<String>>,
    pub cluster_name: Option<String>,
    pub registry_name: Option<String>,
    pub dns_name: Option<String>,
    pub port: Option<PortSetting>,
    pub container_port: Option<PortSetting>,
}

impl EnvironmentProfile {
    /// Create an empty profile; the class is resolved from the name once, here
    pub fn new(name: impl Into<String>) -> EstimationResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EstimationError::InvalidInput(
                "environment name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            class: EnvironmentClass::from_name(&name),
            name,
            source_module: None,
            region: None,
            vpc_cidr: None,
            public_subnets: None,
            private_subnets: None,
            availability_zones: None,
            cluster_name: None,
            registry_name: None,
            dns_name: None,
            port: None,
            container_port: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> EnvironmentClass {
        self.class
    }

    pub fn subnet_count(&self) -> usize {
        self.public_subnets.as_ref().map_or(0, Vec::len)
            + self.private_subnets.as_ref().map_or(0, Vec::len)
    }

    pub fn availability_zone_count(&self) -> usize {
        self.availability_zones.as_ref().map_or(0, Vec::len)
    }
}

/// Abstract workload used for what-if comparisons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadProfile {
    pub name: String,
    pub cpu_cores: f64,
    pub memory_gb: f64,
    pub storage_gb: f64,
    pub network_bandwidth_mbps: f64,
    pub expected_users: u32,
    /// Peak load relative to base load, at least 1.0
    pub peak_load_multiplier: f64,
}

impl WorkloadProfile {
    pub fn validate(&self) -> EstimationResult<()> {
        let positive = [
            ("cpu_cores", self.cpu_cores),
            ("memory_gb", self.memory_gb),
            ("storage_gb", self.storage_gb),
            ("network_bandwidth_mbps", self.network_bandwidth_mbps),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(EstimationError::InvalidInput(format!(
                    "{} must be positive, got {}",
                    field, value
                )));
            }
        }

        if self.expected_users == 0 {
            return Err(EstimationError::InvalidInput(
                "expected_users must be positive".to_string(),
            ));
        }

        if !self.peak_load_multiplier.is_finite() || self.peak_load_multiplier < 1.0 {
            return Err(EstimationError::InvalidInput(format!(
                "peak_load_multiplier must be at least 1.0, got {}",
                self.peak_load_multiplier
            )));
        }

        Ok(())
    }
}

/// Infrastructure style compared by the scenario comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum InfrastructureStyle {
    #[strum(serialize = "ECS Fargate")]
    Serverless,
    #[strum(serialize = "EKS Kubernetes")]
    Orchestration,
}

impl InfrastructureStyle {
    pub fn infrastructure_type(&self) -> &'static str {
        match self {
            Self::Serverless => "Serverless Containers",
            Self::Orchestration => "Managed Kubernetes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityUnit {
    Tasks,
    Nodes,
}

/// Unit counts a sizing can run at, plus qualitative scaling latencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingCapacity {
    pub unit: CapacityUnit,
    pub min_units: u32,
    pub max_units: u32,
    /// Billed average, midpoint of min and max
    pub avg_units: f64,
    pub scale_up_time: String,
    pub scale_down_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload_scale_time: Option<String>,
}

/// Estimated utilization percentages for a sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationEstimate {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub efficiency_percent: f64,
}

/// Sizing and cost of one infrastructure style for a workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleAnalysis {
    pub style: InfrastructureStyle,
    pub name: String,
    pub infrastructure_type: String,
    pub monthly_cost: f64,
    pub cost_breakdown: CostBreakdown,
    pub scaling_capacity: ScalingCapacity,
    pub utilization: UtilizationEstimate,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMetrics {
    pub cost_difference: f64,
    pub cost_difference_percentage: f64,
    pub cheaper_option: InfrastructureStyle,
    pub more_expensive_option: InfrastructureStyle,
    pub serverless_score: f64,
    pub orchestration_score: f64,
}

/// Outcome of comparing both styles for one workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub serverless: StyleAnalysis,
    pub orchestration: StyleAnalysis,
    pub metrics: ComparisonMetrics,
    pub recommended: InfrastructureStyle,
    pub justification: String,
}

/// Comparison wrapped with its inputs for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub workload: WorkloadProfile,
    pub comparison: ComparisonResult,
    pub analysis_timestamp: DateTime<Utc>,
    pub region: String,
    pub advisories: Vec<Advisory>,
}

/// Non-fatal condition surfaced alongside a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// A recognized field was present but could not be parsed
    ParseDegraded {
        environment: String,
        field: String,
        raw: String,
    },
    /// The default price snapshot was used
    PricingUnavailable { reason: String },
    /// An environment in a batch could not be analyzed
    EnvironmentSkipped { environment: String, reason: String },
}

impl Advisory {
    /// Advisory for a non-fatal error raised while analyzing `environment`
    pub fn from_error(environment: &str, error: EstimationError) -> Self {
        match error {
            EstimationError::ParseDegraded { field, raw } => Self::ParseDegraded {
                environment: environment.to_string(),
                field,
                raw,
            },
            EstimationError::PricingUnavailable(reason) => Self::PricingUnavailable { reason },
            other => Self::EnvironmentSkipped {
                environment: environment.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum EstimatedScale {
    High,
    Medium,
    Low,
}

/// Resource summary reported with each environment's costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEstimate {
    pub environment_class: EnvironmentClass,
    pub region: String,
    pub vpc_subnets: usize,
    pub availability_zones: usize,
    pub cluster_name: String,
    pub estimated_scale: EstimatedScale,
}

/// Cost analysis of one declared environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReport {
    pub name: String,
    pub path: String,
    pub source_module: Option<String>,
    pub profile: EnvironmentProfile,
    pub estimated_monthly_cost: f64,
    pub cost_breakdown: CostBreakdown,
    pub resource_estimates: ResourceEstimate,
    pub advisories: Vec<Advisory>,
}

/// Result of an analysis run; failures are reported here rather than raised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub region: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub environments: Vec<EnvironmentReport>,
    pub total_monthly_cost: f64,
    pub advisories: Vec<Advisory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_from_error() {
        let degraded = EstimationError::ParseDegraded {
            field: "port".into(),
            raw: "var.port".into(),
        };
        assert_eq!(
            Advisory::from_error("staging", degraded),
            Advisory::ParseDegraded {
                environment: "staging".into(),
                field: "port".into(),
                raw: "var.port".into(),
            }
        );

        let missing = Advisory::from_error("qa", EstimationError::NotFound("qa".into()));
        assert!(matches!(
            missing,
            Advisory::EnvironmentSkipped { environment, reason }
                if environment == "qa" && reason.starts_with("Not found")
        ));
    }

    #[test]
    fn test_environment_class_vocabulary() {
        assert_eq!(EnvironmentClass::from_name("production"), EnvironmentClass::Production);
        assert_eq!(EnvironmentClass::from_name("staging"), EnvironmentClass::Staging);
        assert_eq!(EnvironmentClass::from_name("development"), EnvironmentClass::Development);
        assert_eq!(EnvironmentClass::from_name("eks"), EnvironmentClass::Orchestration);
        assert_eq!(
            EnvironmentClass::from_name("managed-orchestration"),
            EnvironmentClass::Orchestration
        );
        assert_eq!(EnvironmentClass::from_name("ecs"), EnvironmentClass::Serverless);
        assert_eq!(EnvironmentClass::from_name("Production"), EnvironmentClass::Unrecognized);
        assert_eq!(EnvironmentClass::from_name("qa"), EnvironmentClass::Unrecognized);
    }

    #[test]
    fn test_breakdown_total_tracks_items() {
        let mut breakdown = CostBreakdown::new();
        breakdown.push("NAT Gateways (2x)", CostCategory::Networking, 65.7);
        breakdown.push("ECR Storage", CostCategory::Registry, 0.2);
        assert_eq!(breakdown.total(), 65.7 + 0.2);

        breakdown.push("Backup Services", CostCategory::Backup, 25.0);
        assert_eq!(breakdown.total(), 65.7 + 0.2 + 25.0);
        assert_eq!(breakdown.len(), 3);
    }

    #[test]
    fn test_breakdown_never_overwrites() {
        let mut breakdown = CostBreakdown::new();
        breakdown.push("Networking", CostCategory::Networking, 10.0);
        breakdown.push("Networking", CostCategory::Networking, 5.0);

        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown.get("Networking").unwrap().amount, 15.0);
    }

    #[test]
    fn test_breakdown_clamps_invalid_amounts() {
        let mut breakdown = CostBreakdown::new();
        breakdown.push("Data Transfer", CostCategory::DataTransfer, -3.0);
        breakdown.push("Broken", CostCategory::Compute, f64::NAN);

        assert_eq!(breakdown.total(), 0.0);
    }

    #[test]
    fn test_breakdown_serializes_in_insertion_order() {
        let mut breakdown = CostBreakdown::new();
        breakdown.push("Zeta", CostCategory::Compute, 1.0);
        breakdown.push("Alpha", CostCategory::Storage, 2.0);

        let json = serde_json::to_string(&breakdown).unwrap();
        assert!(json.find("Zeta").unwrap() < json.find("Alpha").unwrap());

        let back: CostBreakdown = serde_json::from_str(&json).unwrap();
        assert_eq!(back, breakdown);
    }

    #[test]
    fn test_profile_requires_name() {
        assert!(EnvironmentProfile::new("").is_err());
        assert!(EnvironmentProfile::new("   ").is_err());

        let profile = EnvironmentProfile::new("staging").unwrap();
        assert_eq!(profile.class(), EnvironmentClass::Staging);
        assert_eq!(profile.availability_zones, None);
        assert_eq!(profile.subnet_count(), 0);
    }

    #[test]
    fn test_port_setting_serialization() {
        assert_eq!(serde_json::to_string(&PortSetting::Number(80)).unwrap(), "80");
        assert_eq!(
            serde_json::to_string(&PortSetting::Raw("var.port".into())).unwrap(),
            "\"var.port\""
        );
    }

    #[test]
    fn test_workload_validation() {
        let workload = WorkloadProfile {
            name: "test".into(),
            cpu_cores: 2.0,
            memory_gb: 4.0,
            storage_gb: 50.0,
            network_bandwidth_mbps: 100.0,
            expected_users: 500,
            peak_load_multiplier: 2.5,
        };
        assert!(workload.validate().is_ok());

        let low_peak = WorkloadProfile {
            peak_load_multiplier: 0.5,
            ..workload.clone()
        };
        assert!(low_peak.validate().is_err());

        let no_cpu = WorkloadProfile {
            cpu_cores: 0.0,
            ..workload.clone()
        };
        assert!(no_cpu.validate().is_err());

        let no_users = WorkloadProfile {
            expected_users: 0,
            ..workload
        };
        assert!(no_users.validate().is_err());
    }

    #[test]
    fn test_style_display_names() {
        assert_eq!(InfrastructureStyle::Serverless.to_string(), "ECS Fargate");
        assert_eq!(InfrastructureStyle::Orchestration.to_string(), "EKS Kubernetes");
    }
}
