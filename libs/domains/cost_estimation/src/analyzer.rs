//! Batch analysis of declared environments
//!
//! Environments live under `<root>/environments/<name>/` and are described by
//! a single definition file. [`EnvironmentAnalyzer::run`] is the boundary
//! entry point: it never returns an error, failures are reported in the
//! [`AnalysisOutcome`] instead.

use chrono::Utc;
use std::path::Path;
use tracing::{error, info, warn};

use crate::cost_model::CostModel;
use crate::error::{EstimationError, EstimationResult};
use crate::extractor::ConfigurationExtractor;
use crate::models::{Advisory, AnalysisOutcome, EnvironmentReport};
use crate::pricing::{CatalogOrigin, PricingCatalog};

pub const DEFAULT_DEFINITION_FILE: &str = "terragrunt.hcl";
pub const ENVIRONMENTS_DIR: &str = "environments";

/// Reports for a batch plus the environments that had to be skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchAnalysis {
    pub environments: Vec<EnvironmentReport>,
    pub advisories: Vec<Advisory>,
}

/// Runs extraction and cost estimation over environment directories
pub struct EnvironmentAnalyzer {
    extractor: ConfigurationExtractor,
    model: CostModel,
    catalog: PricingCatalog,
    definition_file: String,
}

impl EnvironmentAnalyzer {
    pub fn new(catalog: PricingCatalog) -> Self {
        Self {
            extractor: ConfigurationExtractor::new(),
            model: CostModel::new(),
            catalog,
            definition_file: DEFAULT_DEFINITION_FILE.to_string(),
        }
    }

    pub fn with_definition_file(mut self, file_name: impl Into<String>) -> Self {
        self.definition_file = file_name.into();
        self
    }

    pub fn catalog(&self) -> &PricingCatalog {
        &self.catalog
    }

    /// Analyze the environment defined in `dir`
    pub fn analyze_environment(&self, dir: &Path) -> EstimationResult<EnvironmentReport> {
        let dir_name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let definition = dir.join(&self.definition_file);
        if !definition.is_file() {
            return Err(EstimationError::NotFound(format!(
                "no {} in {}",
                self.definition_file,
                dir.display()
            )));
        }

        let extraction = self.extractor.extract_file(&definition, &dir_name)?;
        let profile = extraction.profile;
        let breakdown = self.model.estimate(&profile, &self.catalog)?;

        info!(
            environment = profile.name(),
            class = %profile.class(),
            monthly_cost = breakdown.total(),
            "Analyzed environment"
        );

        Ok(EnvironmentReport {
            name: profile.name().to_string(),
            path: dir.display().to_string(),
            source_module: profile.source_module.clone(),
            estimated_monthly_cost: breakdown.total(),
            resource_estimates: self.model.resource_estimate(&profile),
            cost_breakdown: breakdown,
            profile,
            advisories: extraction.advisories,
        })
    }

    /// Analyze every environment under `<root>/environments`, in name order.
    ///
    /// A failing environment is skipped with an advisory; only a contract
    /// violation aborts the batch.
    pub fn analyze_all(&self, root: &Path) -> EstimationResult<BatchAnalysis> {
        let environments_dir = root.join(ENVIRONMENTS_DIR);
        if !environments_dir.is_dir() {
            return Err(EstimationError::NotFound(format!(
                "environments directory {}",
                environments_dir.display()
            )));
        }

        let mut dirs = std::fs::read_dir(&environments_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>();
        dirs.sort();

        let mut batch = BatchAnalysis::default();
        for dir in dirs {
            match self.analyze_environment(&dir) {
                Ok(report) => {
                    metrics::counter!("environment_analyses_total", "outcome" => "analyzed")
                        .increment(1);
                    batch.environments.push(report);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let environment = dir
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    warn!(environment = %environment, error = %e, "Skipping environment");
                    metrics::counter!("environment_analyses_total", "outcome" => "skipped")
                        .increment(1);
                    batch.advisories.push(Advisory::from_error(&environment, e));
                }
            }
        }

        Ok(batch)
    }

    /// Analyze one named environment, or all of them when `environment` is `None`
    pub fn run(&self, root: &Path, environment: Option<&str>) -> AnalysisOutcome {
        let mut advisories = Vec::new();
        if let CatalogOrigin::Fallback { reason } = self.catalog.origin() {
            advisories.push(Advisory::PricingUnavailable {
                reason: reason.clone(),
            });
        }

        let result = match environment {
            Some(name) => self
                .analyze_named(root, name)
                .map(|report| BatchAnalysis {
                    environments: vec![report],
                    advisories: Vec::new(),
                }),
            None => self.analyze_all(root),
        };

        let (success, error_message, environments) = match result {
            Ok(batch) => {
                advisories.extend(batch.advisories);
                (true, None, batch.environments)
            }
            Err(e) => {
                error!(error = %e, "Analysis failed");
                metrics::counter!("environment_analyses_total", "outcome" => "failed")
                    .increment(1);
                (false, Some(e.to_string()), Vec::new())
            }
        };

        let total_monthly_cost = environments
            .iter()
            .map(|report| report.estimated_monthly_cost)
            .sum();

        AnalysisOutcome {
            success,
            error: error_message,
            region: self.catalog.region().to_string(),
            analysis_timestamp: Utc::now(),
            environments,
            total_monthly_cost,
            advisories,
        }
    }

    fn analyze_named(&self, root: &Path, name: &str) -> EstimationResult<EnvironmentReport> {
        let dir = root.join(ENVIRONMENTS_DIR).join(name);
        if !dir.is_dir() {
            return Err(EstimationError::NotFound(format!(
                "environment directory {}",
                dir.display()
            )));
        }
        self.analyze_environment(&dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnvironmentClass;
    use crate::pricing::{PriceCategory, PriceTable};
    use std::fs;
    use tempfile::TempDir;

    fn write_environment(root: &Path, name: &str, body: &str) {
        let dir = root.join(ENVIRONMENTS_DIR).join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(DEFAULT_DEFINITION_FILE), body).unwrap();
    }

    fn analyzer() -> EnvironmentAnalyzer {
        EnvironmentAnalyzer::new(PricingCatalog::fallback("eu-west-1", "offline"))
    }

    #[test]
    fn test_analyze_environment_uses_directory_name() {
        let root = TempDir::new().unwrap();
        write_environment(root.path(), "staging", r#"aws_region = "eu-west-1""#);

        let report = analyzer()
            .analyze_environment(&root.path().join(ENVIRONMENTS_DIR).join("staging"))
            .unwrap();

        assert_eq!(report.name, "staging");
        assert_eq!(report.profile.class(), EnvironmentClass::Staging);
        assert_eq!(report.estimated_monthly_cost, report.cost_breakdown.total());
        assert!(report.estimated_monthly_cost > 0.0);
    }

    #[test]
    fn test_missing_definition_is_not_found() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(ENVIRONMENTS_DIR).join("qa");
        fs::create_dir_all(&dir).unwrap();

        let result = analyzer().analyze_environment(&dir);
        assert!(matches!(result, Err(EstimationError::NotFound(_))));
    }

    #[test]
    fn test_analyze_all_skips_broken_siblings() {
        let root = TempDir::new().unwrap();
        write_environment(root.path(), "production", r#"environment = "production""#);
        write_environment(root.path(), "development", r#"environment = "development""#);
        fs::create_dir_all(root.path().join(ENVIRONMENTS_DIR).join("empty")).unwrap();

        let batch = analyzer().analyze_all(root.path()).unwrap();

        let names: Vec<_> = batch.environments.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["development", "production"]);
        assert_eq!(batch.advisories.len(), 1);
        assert!(matches!(
            &batch.advisories[0],
            Advisory::EnvironmentSkipped { environment, .. } if environment == "empty"
        ));
    }

    #[test]
    fn test_contract_violation_aborts_batch() {
        let root = TempDir::new().unwrap();
        write_environment(root.path(), "development", r#"environment = "development""#);
        write_environment(root.path(), "production", r#"environment = "production""#);

        let mut prices = PriceTable::baseline();
        prices.database.instances.remove("db.t3.small");
        let analyzer = EnvironmentAnalyzer::new(PricingCatalog::unchecked("eu-west-1", prices));

        let result = analyzer.analyze_all(root.path());
        assert!(matches!(
            result,
            Err(EstimationError::ContractViolation {
                category: PriceCategory::ManagedDatabase,
                ..
            })
        ));

        let outcome = analyzer.run(root.path(), None);
        assert!(!outcome.success);
        assert!(outcome.environments.is_empty());
        assert!(outcome.error.unwrap().contains("managed-database"));
    }

    #[test]
    fn test_definition_file_is_configurable() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(ENVIRONMENTS_DIR).join("development");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("env.hcl"), r#"environment = "development""#).unwrap();

        let report = analyzer()
            .with_definition_file("env.hcl")
            .analyze_environment(&dir)
            .unwrap();
        assert_eq!(report.name, "development");
    }

    #[test]
    fn test_run_without_environments_dir_fails() {
        let root = TempDir::new().unwrap();

        let outcome = analyzer().run(root.path(), None);

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains(ENVIRONMENTS_DIR));
        assert!(outcome.environments.is_empty());
        assert_eq!(outcome.total_monthly_cost, 0.0);
    }

    #[test]
    fn test_run_named_environment() {
        let root = TempDir::new().unwrap();
        write_environment(root.path(), "production", r#"environment = "production""#);
        write_environment(root.path(), "staging", r#"environment = "staging""#);

        let outcome = analyzer().run(root.path(), Some("staging"));

        assert!(outcome.success);
        assert_eq!(outcome.environments.len(), 1);
        assert_eq!(outcome.environments[0].name, "staging");
        assert_eq!(
            outcome.total_monthly_cost,
            outcome.environments[0].estimated_monthly_cost
        );
    }

    #[test]
    fn test_run_missing_named_environment_fails() {
        let root = TempDir::new().unwrap();
        write_environment(root.path(), "production", r#"environment = "production""#);

        let outcome = analyzer().run(root.path(), Some("qa"));

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_run_reports_fallback_pricing() {
        let root = TempDir::new().unwrap();
        write_environment(root.path(), "development", r#"environment = "development""#);

        let outcome = analyzer().run(root.path(), None);

        assert!(outcome.success);
        assert!(outcome.advisories.contains(&Advisory::PricingUnavailable {
            reason: "offline".into()
        }));
    }
}
