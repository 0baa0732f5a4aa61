//! What-if comparison between serverless containers and managed Kubernetes
//!
//! Both styles are sized independently from the same [`WorkloadProfile`],
//! priced against the same catalog, and scored with configurable weights.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EstimationError, EstimationResult};
use crate::models::{
    Advisory, CapacityUnit, ComparisonMetrics, ComparisonResult, CostBreakdown, CostCategory,
    InfrastructureStyle, ScalingCapacity, ScenarioReport, StyleAnalysis, UtilizationEstimate,
    WorkloadProfile,
};
use crate::pricing::{CatalogOrigin, PricingCatalog, HOURS_PER_MONTH};

/// Concurrent users one serverless task is assumed to serve
pub const USERS_PER_TASK: u32 = 250;
/// Concurrent users one worker node is assumed to serve
pub const USERS_PER_NODE: u32 = 500;

const MIN_TASKS: u32 = 2;
const MIN_NODES: u32 = 2;
const MAX_NODES: u32 = 10;

const NODE_INSTANCE_TYPE: &str = "t3.medium";
const NODE_VCPU: f64 = 2.0;
const NODE_MEMORY_GB: f64 = 4.0;
const NODE_STORAGE_GB: f64 = 20.0;
const NODE_NETWORKING_MONTHLY: f64 = 5.0;

const SERVERLESS_TRAFFIC_UNITS: f64 = 1.5;
const ORCHESTRATION_TRAFFIC_UNITS: f64 = 2.0;
const STORAGE_TIER: &str = "gp3";

const BANDWIDTH_UTILIZATION: f64 = 0.10;
const SECONDS_PER_MONTH: f64 = HOURS_PER_MONTH * 3600.0;

/// (vCPU, min memory GB, max memory GB) for each valid serverless task size
const TASK_SIZES: &[(f64, f64, f64)] = &[
    (0.25, 0.5, 2.0),
    (0.5, 1.0, 4.0),
    (1.0, 2.0, 8.0),
    (2.0, 4.0, 16.0),
    (4.0, 8.0, 30.0),
    (8.0, 16.0, 60.0),
    (16.0, 32.0, 120.0),
];

/// Names accepted by [`workload_preset`]
pub const PRESET_NAMES: &[&str] = &["default", "medium_app", "large_app"];

/// Built-in workload profiles
pub fn workload_preset(name: &str) -> Option<WorkloadProfile> {
    let (cpu, memory, storage, bandwidth, users, peak) = match name {
        "default" => (2.0, 4.0, 50.0, 100.0, 500, 2.0),
        "medium_app" => (2.0, 4.0, 50.0, 100.0, 500, 2.5),
        "large_app" => (8.0, 16.0, 200.0, 500.0, 2000, 3.0),
        _ => return None,
    };

    Some(WorkloadProfile {
        name: name.to_string(),
        cpu_cores: cpu,
        memory_gb: memory,
        storage_gb: storage,
        network_bandwidth_mbps: bandwidth,
        expected_users: users,
        peak_load_multiplier: peak,
    })
}

/// Scoring weights, each a percentage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub cost: f64,
    pub scalability: f64,
    pub reliability: f64,
    pub security: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            cost: 30.0,
            scalability: 30.0,
            reliability: 25.0,
            security: 15.0,
        }
    }
}

impl ScoringWeights {
    /// Build weights from `priority_*` preferences; unspecified weights keep their default
    pub fn from_preferences<'a>(
        preferences: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> EstimationResult<Self> {
        let mut weights = Self::default();

        for (key, value) in preferences {
            let slot = match key {
                "priority_cost" => &mut weights.cost,
                "priority_scalability" => &mut weights.scalability,
                "priority_reliability" => &mut weights.reliability,
                "priority_security" => &mut weights.security,
                other => {
                    warn!(key = other, "Ignoring unrecognized scoring preference");
                    continue;
                }
            };

            if !value.is_finite() || value < 0.0 {
                return Err(EstimationError::InvalidInput(format!(
                    "{} must be a non-negative percentage, got {}",
                    key, value
                )));
            }
            *slot = value;
        }

        Ok(weights)
    }
}

/// Serverless task allocation after rounding to a valid size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskAllocation {
    pub vcpu: f64,
    pub memory_gb: f64,
}

/// Round a CPU/memory requirement up to the nearest valid task size
pub fn task_allocation(cpu_cores: f64, memory_gb: f64) -> TaskAllocation {
    let memory = if memory_gb <= 0.5 { 0.5 } else { memory_gb.ceil() };

    let fitting = TASK_SIZES
        .iter()
        .find(|(vcpu, _, max_memory)| *vcpu >= cpu_cores && *max_memory >= memory);

    match fitting {
        Some(&(vcpu, min_memory, _)) => TaskAllocation {
            vcpu,
            memory_gb: memory.max(min_memory),
        },
        None => {
            let (vcpu, _, max_memory) = TASK_SIZES[TASK_SIZES.len() - 1];
            TaskAllocation {
                vcpu,
                memory_gb: memory.min(max_memory),
            }
        }
    }
}

/// Monthly outbound volume in GB for a sustained bandwidth
pub fn monthly_transfer_gb(bandwidth_mbps: f64) -> f64 {
    bandwidth_mbps * BANDWIDTH_UTILIZATION * SECONDS_PER_MONTH / 8.0 / 1000.0
}

fn scaled_units(base: u32, multiplier: f64) -> u32 {
    (base as f64 * multiplier).round() as u32
}

fn reliability_score(style: InfrastructureStyle) -> f64 {
    match style {
        InfrastructureStyle::Orchestration => 90.0,
        InfrastructureStyle::Serverless => 85.0,
    }
}

fn security_score(style: InfrastructureStyle) -> f64 {
    match style {
        InfrastructureStyle::Orchestration => 85.0,
        InfrastructureStyle::Serverless => 80.0,
    }
}

/// Compares serverless and orchestration deployments for a workload
#[derive(Debug, Clone, Default)]
pub struct ScenarioComparator {
    weights: ScoringWeights,
}

impl ScenarioComparator {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Size, price, score and recommend both styles
    pub fn compare(
        &self,
        workload: &WorkloadProfile,
        catalog: &PricingCatalog,
    ) -> EstimationResult<ComparisonResult> {
        workload.validate()?;

        let serverless = self.size_serverless(workload, catalog)?;
        let orchestration = self.size_orchestration(workload, catalog)?;

        let serverless_score = self.score(&serverless);
        let orchestration_score = self.score(&orchestration);

        let (cheaper, more_expensive) = if serverless.monthly_cost < orchestration.monthly_cost {
            (InfrastructureStyle::Serverless, InfrastructureStyle::Orchestration)
        } else {
            (InfrastructureStyle::Orchestration, InfrastructureStyle::Serverless)
        };

        let cost_difference = (serverless.monthly_cost - orchestration.monthly_cost).abs();
        let cheaper_cost = serverless.monthly_cost.min(orchestration.monthly_cost);
        let cost_difference_percentage = if cheaper_cost > 0.0 {
            cost_difference / cheaper_cost * 100.0
        } else {
            0.0
        };

        let recommended = if serverless_score > orchestration_score {
            InfrastructureStyle::Serverless
        } else {
            InfrastructureStyle::Orchestration
        };
        let justification = justify(recommended, cheaper, cost_difference, workload);

        info!(
            workload = %workload.name,
            serverless_cost = serverless.monthly_cost,
            orchestration_cost = orchestration.monthly_cost,
            recommended = %recommended,
            "Compared infrastructure styles"
        );

        Ok(ComparisonResult {
            serverless,
            orchestration,
            metrics: ComparisonMetrics {
                cost_difference,
                cost_difference_percentage,
                cheaper_option: cheaper,
                more_expensive_option: more_expensive,
                serverless_score,
                orchestration_score,
            },
            recommended,
            justification,
        })
    }

    /// Comparison wrapped with its inputs, timestamp and pricing advisories
    pub fn report(
        &self,
        workload: &WorkloadProfile,
        catalog: &PricingCatalog,
    ) -> EstimationResult<ScenarioReport> {
        let comparison = self.compare(workload, catalog)?;
        let advisories = match catalog.origin() {
            CatalogOrigin::Fallback { reason } => vec![Advisory::PricingUnavailable {
                reason: reason.clone(),
            }],
            _ => Vec::new(),
        };

        Ok(ScenarioReport {
            workload: workload.clone(),
            comparison,
            analysis_timestamp: Utc::now(),
            region: catalog.region().to_string(),
            advisories,
        })
    }

    fn score(&self, analysis: &StyleAnalysis) -> f64 {
        let cost_score = (100.0 - analysis.monthly_cost / 10.0).max(0.0);
        let scalability_score = (analysis.scaling_capacity.max_units as f64).min(100.0);

        cost_score * self.weights.cost / 100.0
            + scalability_score * self.weights.scalability / 100.0
            + reliability_score(analysis.style) * self.weights.reliability / 100.0
            + security_score(analysis.style) * self.weights.security / 100.0
    }

    fn size_serverless(
        &self,
        workload: &WorkloadProfile,
        catalog: &PricingCatalog,
    ) -> EstimationResult<StyleAnalysis> {
        let allocation = task_allocation(workload.cpu_cores, workload.memory_gb);

        let base_tasks = workload.expected_users.div_ceil(USERS_PER_TASK).max(MIN_TASKS);
        let peak_tasks = scaled_units(base_tasks, workload.peak_load_multiplier).max(base_tasks);
        let avg_tasks = (base_tasks as f64 + peak_tasks as f64) / 2.0;

        let mut breakdown = CostBreakdown::new();
        breakdown.push(
            "Fargate CPU",
            CostCategory::Compute,
            catalog.container_cpu_monthly() * allocation.vcpu * avg_tasks,
        );
        breakdown.push(
            "Fargate Memory",
            CostCategory::Compute,
            catalog.container_memory_monthly() * allocation.memory_gb * avg_tasks,
        );
        breakdown.push(
            "Application Load Balancer",
            CostCategory::LoadBalancing,
            catalog.load_balancer_base_monthly(),
        );
        breakdown.push(
            "ALB Load Balancer Units",
            CostCategory::LoadBalancing,
            catalog.load_balancer_unit_monthly() * SERVERLESS_TRAFFIC_UNITS,
        );
        breakdown.push(
            "Storage (EBS/EFS)",
            CostCategory::Storage,
            workload.storage_gb * catalog.storage_per_gb_month(STORAGE_TIER)?,
        );
        breakdown.push(
            "Data Transfer",
            CostCategory::DataTransfer,
            catalog.data_transfer_cost(monthly_transfer_gb(workload.network_bandwidth_mbps)),
        );

        let monthly_cost = breakdown.total();

        let mut recommendations = vec![
            "Consider Fargate Spot for non-critical workloads to save up to 70%".to_string(),
            format!(
                "Current configuration can handle up to {} concurrent users",
                peak_tasks.saturating_mul(USERS_PER_TASK)
            ),
            "Set CloudWatch alarms for cost monitoring".to_string(),
            "Use load balancer target groups for blue-green deployments".to_string(),
        ];
        if monthly_cost > 500.0 {
            recommendations
                .push("Consider Compute Savings Plans for predictable workloads".to_string());
        }

        Ok(StyleAnalysis {
            style: InfrastructureStyle::Serverless,
            name: InfrastructureStyle::Serverless.to_string(),
            infrastructure_type: InfrastructureStyle::Serverless.infrastructure_type().to_string(),
            monthly_cost,
            cost_breakdown: breakdown,
            scaling_capacity: ScalingCapacity {
                unit: CapacityUnit::Tasks,
                min_units: base_tasks,
                max_units: peak_tasks,
                avg_units: avg_tasks,
                scale_up_time: "2-3 minutes".to_string(),
                scale_down_time: "5-10 minutes".to_string(),
                workload_scale_time: None,
            },
            utilization: UtilizationEstimate {
                cpu_percent: (workload.cpu_cores * 20.0).min(85.0),
                memory_percent: (workload.memory_gb * 10.0).min(80.0),
                efficiency_percent: 85.0,
            },
            recommendations,
        })
    }

    fn size_orchestration(
        &self,
        workload: &WorkloadProfile,
        catalog: &PricingCatalog,
    ) -> EstimationResult<StyleAnalysis> {
        let nodes_for_cpu = (workload.cpu_cores / NODE_VCPU).ceil() as u32;
        let nodes_for_memory = (workload.memory_gb / NODE_MEMORY_GB).ceil() as u32;
        let base_nodes = nodes_for_cpu.max(nodes_for_memory).max(MIN_NODES);
        let peak_nodes = scaled_units(base_nodes, workload.peak_load_multiplier)
            .min(MAX_NODES)
            .max(base_nodes);
        let avg_nodes = (base_nodes as f64 + peak_nodes as f64) / 2.0;

        let storage_rate = catalog.storage_per_gb_month(STORAGE_TIER)?;
        let storage_gb = NODE_STORAGE_GB * avg_nodes + workload.storage_gb;

        let mut breakdown = CostBreakdown::new();
        breakdown.push(
            "EKS Cluster Management",
            CostCategory::Compute,
            catalog.control_plane_monthly(),
        );
        breakdown.push(
            format!("Worker Nodes ({:.1}x {})", avg_nodes, NODE_INSTANCE_TYPE),
            CostCategory::Compute,
            catalog.instance_monthly(NODE_INSTANCE_TYPE)? * avg_nodes,
        );
        breakdown.push(
            "Application Load Balancer",
            CostCategory::LoadBalancing,
            catalog.load_balancer_base_monthly(),
        );
        breakdown.push(
            "ALB Load Balancer Units",
            CostCategory::LoadBalancing,
            catalog.load_balancer_unit_monthly() * ORCHESTRATION_TRAFFIC_UNITS,
        );
        breakdown.push("Storage (EBS)", CostCategory::Storage, storage_gb * storage_rate);
        breakdown.push(
            "Networking",
            CostCategory::Networking,
            avg_nodes * NODE_NETWORKING_MONTHLY,
        );
        breakdown.push(
            "Data Transfer",
            CostCategory::DataTransfer,
            catalog.data_transfer_cost(monthly_transfer_gb(workload.network_bandwidth_mbps)),
        );

        let monthly_cost = breakdown.total();

        let mut recommendations = vec![
            "Use the Horizontal Pod Autoscaler for automatic scaling".to_string(),
            format!(
                "Current configuration supports {} to {} concurrent users",
                base_nodes.saturating_mul(USERS_PER_NODE),
                peak_nodes.saturating_mul(USERS_PER_NODE)
            ),
            "Consider Spot instances for worker nodes to reduce costs by 60-90%".to_string(),
            "Run the Cluster Autoscaler for automatic node scaling".to_string(),
            "Use resource quotas to prevent resource exhaustion".to_string(),
        ];
        if monthly_cost > 300.0 {
            recommendations
                .push("Consider Reserved Instances for predictable node capacity".to_string());
        }
        if workload.expected_users > 1000 {
            recommendations
                .push("Consider a service mesh for advanced traffic management".to_string());
        }

        Ok(StyleAnalysis {
            style: InfrastructureStyle::Orchestration,
            name: InfrastructureStyle::Orchestration.to_string(),
            infrastructure_type: InfrastructureStyle::Orchestration
                .infrastructure_type()
                .to_string(),
            monthly_cost,
            cost_breakdown: breakdown,
            scaling_capacity: ScalingCapacity {
                unit: CapacityUnit::Nodes,
                min_units: base_nodes,
                max_units: peak_nodes,
                avg_units: avg_nodes,
                scale_up_time: "3-5 minutes (node startup)".to_string(),
                scale_down_time: "10-15 minutes".to_string(),
                workload_scale_time: Some("30-60 seconds".to_string()),
            },
            utilization: UtilizationEstimate {
                cpu_percent: (workload.cpu_cores * 15.0).min(70.0),
                memory_percent: (workload.memory_gb * 8.0).min(75.0),
                efficiency_percent: 75.0,
            },
            recommendations,
        })
    }
}

fn strength(style: InfrastructureStyle) -> &'static str {
    match style {
        InfrastructureStyle::Serverless => "serverless simplicity",
        InfrastructureStyle::Orchestration => "Kubernetes ecosystem flexibility",
    }
}

fn other(style: InfrastructureStyle) -> InfrastructureStyle {
    match style {
        InfrastructureStyle::Serverless => InfrastructureStyle::Orchestration,
        InfrastructureStyle::Orchestration => InfrastructureStyle::Serverless,
    }
}

fn justify(
    recommended: InfrastructureStyle,
    cheaper: InfrastructureStyle,
    cost_difference: f64,
    workload: &WorkloadProfile,
) -> String {
    if recommended == cheaper {
        return if cost_difference > 100.0 {
            format!(
                "{} is ${:.0}/month cheaper than {} and provides {}",
                recommended,
                cost_difference,
                other(recommended),
                strength(recommended)
            )
        } else {
            format!(
                "{} is ${:.2}/month cheaper than {} and offers better cost efficiency",
                recommended,
                cost_difference,
                other(recommended)
            )
        };
    }

    match recommended {
        InfrastructureStyle::Orchestration if workload.expected_users > 1000 => format!(
            "{} provides better scalability and flexibility for large applications ({} expected users) at ${:.0}/month more",
            recommended, workload.expected_users, cost_difference
        ),
        InfrastructureStyle::Orchestration if cost_difference < 50.0 => format!(
            "{} offers more control and ecosystem benefits for a minimal cost difference (${:.2}/month)",
            recommended, cost_difference
        ),
        InfrastructureStyle::Orchestration => format!(
            "{} provides enterprise features worth the additional ${:.0}/month",
            recommended, cost_difference
        ),
        InfrastructureStyle::Serverless => format!(
            "{} provides operational simplicity worth the additional ${:.0}/month",
            recommended, cost_difference
        ),
    }
}
