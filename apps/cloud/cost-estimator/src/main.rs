//! Cost Estimator
//!
//! Estimates monthly cloud costs for the environments declared under
//! `<root>/environments/*/terragrunt.hcl`, and compares serverless containers
//! against managed Kubernetes for a what-if workload.

use clap::{Parser, Subcommand};
use domain_cost_estimation::{
    workload_preset, CatalogLoader, EnvironmentAnalyzer, FileRateSource, PricingSource,
    PublishedRateSource, ScenarioComparator, SnapshotCache, WorkloadProfile, PRESET_NAMES,
};
use eyre::{bail, eyre, Result};
use std::path::PathBuf;
use tracing::info;

mod config;
mod output;
mod telemetry;

use config::Config;
use output::{emit, outcome_summary, render, scenario_summary, OutputFormat};
use telemetry::{init_tracing, install_color_eyre};

#[derive(Parser)]
#[command(name = "cost-estimator")]
#[command(about = "Estimate monthly cloud costs for declared environments")]
struct Cli {
    /// Pricing region. Defaults to ESTIMATOR_REGION.
    #[arg(short, long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate costs of the environments under ROOT/environments
    Environments {
        /// Infrastructure root containing the environments directory
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Analyze a single environment
        #[arg(short, long)]
        environment: Option<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare serverless containers against managed Kubernetes for a workload
    Compare {
        /// Workload preset to start from (default, medium_app, large_app)
        #[arg(short, long, default_value = "default")]
        scenario: String,

        /// CPU cores
        #[arg(long)]
        cpu: Option<f64>,

        /// Memory in GB
        #[arg(long)]
        memory: Option<f64>,

        /// Storage in GB
        #[arg(long)]
        storage: Option<f64>,

        /// Network bandwidth in Mbps
        #[arg(long)]
        bandwidth: Option<f64>,

        /// Expected concurrent users
        #[arg(long)]
        users: Option<u32>,

        /// Peak load multiplier
        #[arg(long)]
        peak: Option<f64>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the pricing snapshot for the region
    Catalog {
        /// Rebuild the snapshot even if a fresh one is cached
        #[arg(long)]
        refresh: bool,
    },
}

/// Overrides applied on top of a workload preset
#[derive(Debug, Default)]
struct WorkloadOverrides {
    cpu: Option<f64>,
    memory: Option<f64>,
    storage: Option<f64>,
    bandwidth: Option<f64>,
    users: Option<u32>,
    peak: Option<f64>,
}

fn build_workload(scenario: &str, overrides: WorkloadOverrides) -> Result<WorkloadProfile> {
    let mut workload = workload_preset(scenario).ok_or_else(|| {
        eyre!(
            "Unknown scenario '{}', expected one of: {}",
            scenario,
            PRESET_NAMES.join(", ")
        )
    })?;

    if let Some(cpu) = overrides.cpu {
        workload.cpu_cores = cpu;
    }
    if let Some(memory) = overrides.memory {
        workload.memory_gb = memory;
    }
    if let Some(storage) = overrides.storage {
        workload.storage_gb = storage;
    }
    if let Some(bandwidth) = overrides.bandwidth {
        workload.network_bandwidth_mbps = bandwidth;
    }
    if let Some(users) = overrides.users {
        workload.expected_users = users;
    }
    if let Some(peak) = overrides.peak {
        workload.peak_load_multiplier = peak;
    }

    Ok(workload)
}

fn catalog_loader(config: &Config) -> CatalogLoader {
    let source: Box<dyn PricingSource> = match &config.price_file {
        Some(path) => Box::new(FileRateSource::new(path)),
        None => Box::new(PublishedRateSource::new()),
    };

    let loader = CatalogLoader::new(source);
    if config.cache.enabled {
        loader.with_cache(SnapshotCache::new(&config.cache.dir, config.cache.validity))
    } else {
        loader
    }
}

fn main() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let cli = Cli::parse();
    let region = cli.region.unwrap_or_else(|| config.region.clone());
    let loader = catalog_loader(&config);

    match cli.command {
        Commands::Environments {
            root,
            environment,
            format,
            output,
        } => {
            let catalog = loader.load(&region);
            let analyzer = EnvironmentAnalyzer::new(catalog)
                .with_definition_file(config.definition_file.clone());

            info!(root = %root.display(), region = %region, "Analyzing environments");
            let outcome = analyzer.run(&root, environment.as_deref());

            let rendered = render(&outcome, format, outcome_summary)?;
            emit(&rendered, output.as_deref())?;

            if !outcome.success {
                bail!(
                    "Analysis failed: {}",
                    outcome.error.unwrap_or_else(|| "unknown error".to_string())
                );
            }
        }

        Commands::Compare {
            scenario,
            cpu,
            memory,
            storage,
            bandwidth,
            users,
            peak,
            format,
            output,
        } => {
            let workload = build_workload(
                &scenario,
                WorkloadOverrides {
                    cpu,
                    memory,
                    storage,
                    bandwidth,
                    users,
                    peak,
                },
            )?;

            let catalog = loader.load(&region);
            let report = ScenarioComparator::new(config.weights).report(&workload, &catalog)?;

            let rendered = render(&report, format, scenario_summary)?;
            emit(&rendered, output.as_deref())?;
        }

        Commands::Catalog { refresh } => {
            let catalog = if refresh {
                loader.refresh(&region)
            } else {
                loader.load(&region)
            };
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
    }

    Ok(())
}
