use thiserror::Error;

use crate::pricing::PriceCategory;

/// Result type for cost estimation operations
pub type EstimationResult<T> = Result<T, EstimationError>;

/// Errors that can occur while estimating costs
#[derive(Debug, Error)]
pub enum EstimationError {
    /// Definition file or environment directory is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// A recognized field could not be parsed
    #[error("Could not parse field '{field}' (raw value: {raw})")]
    ParseDegraded { field: String, raw: String },

    /// The pricing source could not produce a snapshot
    #[error("Pricing unavailable: {0}")]
    PricingUnavailable(String),

    /// A price category required by the cost model is absent or invalid
    #[error("Pricing contract violated for category '{category}': {detail}")]
    ContractViolation {
        category: PriceCategory,
        detail: String,
    },

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EstimationError {
    pub fn contract(category: PriceCategory, detail: impl Into<String>) -> Self {
        Self::ContractViolation {
            category,
            detail: detail.into(),
        }
    }

    /// Whether the error must abort a whole analysis run rather than a single environment
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ContractViolation { .. })
    }
}
