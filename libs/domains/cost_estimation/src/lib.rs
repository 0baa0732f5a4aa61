//! Cost Estimation Domain
//!
//! Monthly cloud cost estimation for declared deployment environments, plus
//! what-if comparison of serverless containers against managed Kubernetes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────┐
//! │ EnvironmentAnalyzer  │        │  ScenarioComparator  │  ← what-if path
//! └──────────┬───────────┘        └──────────┬───────────┘
//!            │                               │
//! ┌──────────▼───────────┐                   │
//! │ConfigurationExtractor│                   │
//! └──────────┬───────────┘                   │
//!            │                               │
//! ┌──────────▼───────────┐                   │
//! │      CostModel       │                   │
//! └──────────┬───────────┘                   │
//!            │                               │
//! ┌──────────▼───────────────────────────────▼┐
//! │              PricingCatalog               │  ← cache + fallback
//! └───────────────────────────────────────────┘
//! ```

pub mod analyzer;
pub mod cost_model;
pub mod error;
pub mod extractor;
pub mod models;
pub mod pricing;
pub mod scenario;

// Re-export commonly used types
pub use analyzer::{BatchAnalysis, EnvironmentAnalyzer, DEFAULT_DEFINITION_FILE, ENVIRONMENTS_DIR};
pub use cost_model::CostModel;
pub use error::{EstimationError, EstimationResult};
pub use extractor::{ConfigurationExtractor, Extraction};
pub use models::{
    Advisory, AnalysisOutcome, CapacityUnit, ComparisonMetrics, ComparisonResult, CostBreakdown,
    CostCategory, CostLineItem, EnvironmentClass, EnvironmentProfile, EnvironmentReport,
    InfrastructureStyle, PortSetting, ResourceEstimate, ScalingCapacity, ScenarioReport,
    StyleAnalysis, WorkloadProfile,
};
pub use pricing::{
    CatalogLoader, CatalogOrigin, FileRateSource, PriceTable, PricingCatalog, PricingSource,
    PublishedRateSource, SnapshotCache, DEFAULT_REGION,
};
pub use scenario::{workload_preset, ScenarioComparator, ScoringWeights, PRESET_NAMES};
