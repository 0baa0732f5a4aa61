//! Configuration for the cost estimator

use chrono::Duration;
use domain_cost_estimation::pricing::DEFAULT_VALIDITY_HOURS;
use domain_cost_estimation::{ScoringWeights, DEFAULT_DEFINITION_FILE, DEFAULT_REGION};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Application environment, selects the log format
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env_or_default("APP_ENV", "development");

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
    /// Age after which a persisted snapshot is rebuilt
    pub validity: Duration,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Pricing region used when `--region` is not given
    pub region: String,
    pub cache: CacheConfig,
    /// JSON price table to price from instead of the published rates
    pub price_file: Option<PathBuf>,
    /// Definition file looked up in each environment directory
    pub definition_file: String,
    pub weights: ScoringWeights,
}

const PRIORITY_VARS: &[(&str, &str)] = &[
    ("ESTIMATOR_PRIORITY_COST", "priority_cost"),
    ("ESTIMATOR_PRIORITY_SCALABILITY", "priority_scalability"),
    ("ESTIMATOR_PRIORITY_RELIABILITY", "priority_reliability"),
    ("ESTIMATOR_PRIORITY_SECURITY", "priority_security"),
];

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            environment: Environment::from_env(),
            region: env_or_default("ESTIMATOR_REGION", DEFAULT_REGION),
            cache: CacheConfig {
                dir: PathBuf::from(env_or_default("ESTIMATOR_CACHE_DIR", ".cost-estimator")),
                validity: cache_validity()?,
                enabled: env_parse("ESTIMATOR_CACHE_ENABLED", true)?,
            },
            price_file: env::var("ESTIMATOR_PRICE_FILE").ok().map(PathBuf::from),
            definition_file: env_or_default("ESTIMATOR_DEFINITION_FILE", DEFAULT_DEFINITION_FILE),
            weights: load_weights()?,
        })
    }
}

fn cache_validity() -> Result<Duration, ConfigError> {
    const KEY: &str = "ESTIMATOR_CACHE_TTL_HOURS";
    let hours: i64 = env_parse(KEY, DEFAULT_VALIDITY_HOURS)?;

    Duration::try_hours(hours)
        .filter(|validity| *validity > Duration::zero())
        .ok_or_else(|| ConfigError::ParseError {
            key: KEY.to_string(),
            details: format!("{} hours is not a usable validity window", hours),
        })
}

fn load_weights() -> Result<ScoringWeights, ConfigError> {
    let mut preferences = Vec::new();
    for (key, preference) in PRIORITY_VARS {
        if let Ok(raw) = env::var(key) {
            let value = parse_value::<f64>(key, &raw)?;
            preferences.push((*preference, value));
        }
    }

    ScoringWeights::from_preferences(preferences).map_err(|e| ConfigError::ParseError {
        key: "ESTIMATOR_PRIORITY_*".to_string(),
        details: e.to_string(),
    })
}

/// Helper to load an environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to parse an environment variable, falling back to `default` when unset
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
        key: key.to_string(),
        details: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: &[&str] = &[
        "APP_ENV",
        "ESTIMATOR_REGION",
        "ESTIMATOR_CACHE_DIR",
        "ESTIMATOR_CACHE_TTL_HOURS",
        "ESTIMATOR_CACHE_ENABLED",
        "ESTIMATOR_PRICE_FILE",
        "ESTIMATOR_DEFINITION_FILE",
        "ESTIMATOR_PRIORITY_COST",
        "ESTIMATOR_PRIORITY_SCALABILITY",
        "ESTIMATOR_PRIORITY_RELIABILITY",
        "ESTIMATOR_PRIORITY_SECURITY",
    ];

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(ALL_VARS, || {
            let config = Config::from_env().unwrap();

            assert_eq!(config.environment, Environment::Development);
            assert_eq!(config.region, "eu-west-1");
            assert_eq!(config.cache.dir, PathBuf::from(".cost-estimator"));
            assert_eq!(config.cache.validity, Duration::hours(24));
            assert!(config.cache.enabled);
            assert!(config.price_file.is_none());
            assert_eq!(config.definition_file, "terragrunt.hcl");
            assert_eq!(config.weights, ScoringWeights::default());
        });
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("APP_ENV", Some("Production")),
                ("ESTIMATOR_REGION", Some("us-east-1")),
                ("ESTIMATOR_CACHE_TTL_HOURS", Some("6")),
                ("ESTIMATOR_CACHE_ENABLED", Some("false")),
                ("ESTIMATOR_PRICE_FILE", Some("/tmp/prices.json")),
                ("ESTIMATOR_PRIORITY_COST", Some("50")),
            ],
            || {
                let config = Config::from_env().unwrap();

                assert!(config.environment.is_production());
                assert_eq!(config.region, "us-east-1");
                assert_eq!(config.cache.validity, Duration::hours(6));
                assert!(!config.cache.enabled);
                assert_eq!(config.price_file, Some(PathBuf::from("/tmp/prices.json")));
                assert_eq!(config.weights.cost, 50.0);
                assert_eq!(config.weights.security, 15.0);
            },
        );
    }

    #[test]
    fn test_malformed_ttl_is_an_error() {
        temp_env::with_var("ESTIMATOR_CACHE_TTL_HOURS", Some("a day"), || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("ESTIMATOR_CACHE_TTL_HOURS"));
        });
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        for hours in ["9223372036854775807", "0", "-3"] {
            temp_env::with_var("ESTIMATOR_CACHE_TTL_HOURS", Some(hours), || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("ESTIMATOR_CACHE_TTL_HOURS"));
            });
        }
    }

    #[test]
    fn test_negative_weight_is_an_error() {
        temp_env::with_var("ESTIMATOR_PRIORITY_SECURITY", Some("-5"), || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var_unset("MISSING_VAR", || {
            assert_eq!(env_or_default("MISSING_VAR", "fallback"), "fallback");
        });
    }
}
