//! Report rendering for the terminal and output files

use clap::ValueEnum;
use domain_cost_estimation::{
    Advisory, AnalysisOutcome, CapacityUnit, ScenarioReport, StyleAnalysis,
};
use eyre::{Result, WrapErr};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON document
    Json,
    /// Human-readable text summary
    Summary,
}

/// Render `value` as JSON or with the given summary renderer
pub fn render<T: Serialize>(
    value: &T,
    format: OutputFormat,
    summary: impl FnOnce(&T) -> String,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Summary => Ok(summary(value)),
    }
}

/// Write rendered output to `path`, or stdout when no path is given
pub fn emit(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .wrap_err_with(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "Report saved");
        }
        None => println!("{}", content),
    }
    Ok(())
}

pub fn outcome_summary(outcome: &AnalysisOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cost analysis ({})", outcome.region);
    let _ = writeln!(out, "{}", "=".repeat(60));

    if let Some(error) = &outcome.error {
        let _ = writeln!(out, "Analysis failed: {}", error);
    }

    for report in &outcome.environments {
        let _ = writeln!(
            out,
            "{:<40} ${:>10.2}/month",
            report.name, report.estimated_monthly_cost
        );
        for item in report.cost_breakdown.items() {
            let _ = writeln!(out, "  {:<38} ${:>10.2}", item.label, item.amount);
        }
    }

    let _ = writeln!(out, "{}", "-".repeat(60));
    let _ = writeln!(
        out,
        "{:<40} ${:>10.2}/month",
        "Total", outcome.total_monthly_cost
    );
    write_advisories(&mut out, &outcome.advisories);
    out
}

pub fn scenario_summary(report: &ScenarioReport) -> String {
    let workload = &report.workload;
    let comparison = &report.comparison;
    let metrics = &comparison.metrics;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Scenario {} ({}): {} vCPU, {} GB, {} users, peak x{}",
        workload.name,
        report.region,
        workload.cpu_cores,
        workload.memory_gb,
        workload.expected_users,
        workload.peak_load_multiplier
    );
    let _ = writeln!(out, "{}", "=".repeat(60));

    write_style(&mut out, &comparison.serverless, metrics.serverless_score);
    write_style(&mut out, &comparison.orchestration, metrics.orchestration_score);

    let _ = writeln!(
        out,
        "Cost difference: ${:.2}/month ({:.1}%), {} is cheaper",
        metrics.cost_difference, metrics.cost_difference_percentage, metrics.cheaper_option
    );
    let _ = writeln!(out, "Recommended: {}", comparison.recommended);
    let _ = writeln!(out, "{}", comparison.justification);
    write_advisories(&mut out, &report.advisories);
    out
}

fn write_style(out: &mut String, analysis: &StyleAnalysis, score: f64) {
    let capacity = &analysis.scaling_capacity;
    let unit = match capacity.unit {
        CapacityUnit::Tasks => "tasks",
        CapacityUnit::Nodes => "nodes",
    };

    let _ = writeln!(
        out,
        "{:<16} ${:>10.2}/month  {} {}-{} (avg {})  score {:.1}",
        analysis.name,
        analysis.monthly_cost,
        unit,
        capacity.min_units,
        capacity.max_units,
        capacity.avg_units,
        score
    );
    for item in analysis.cost_breakdown.items() {
        let _ = writeln!(out, "  {:<38} ${:>10.2}", item.label, item.amount);
    }
}

fn write_advisories(out: &mut String, advisories: &[Advisory]) {
    if advisories.is_empty() {
        return;
    }

    let _ = writeln!(out, "Advisories:");
    for advisory in advisories {
        let line = match advisory {
            Advisory::ParseDegraded {
                environment,
                field,
                raw,
            } => format!("{}: could not parse {} ({})", environment, field, raw),
            Advisory::PricingUnavailable { reason } => {
                format!("default prices used: {}", reason)
            }
            Advisory::EnvironmentSkipped {
                environment,
                reason,
            } => format!("{} skipped: {}", environment, reason),
        };
        let _ = writeln!(out, "  - {}", line);
    }
}
