//! Configuration extractor
//!
//! Best-effort extraction of environment parameters from declarative
//! definitions (e.g. `terragrunt.hcl`). Each recognized key is matched on its
//! own, anywhere in the text; a key that does not match is left absent and a
//! key that matches but cannot be parsed is kept raw with an advisory.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::{EstimationError, EstimationResult};
use crate::models::{Advisory, EnvironmentProfile, PortSetting};

static SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bsource\s*=\s*"([^"]*)""#).unwrap());
static ENVIRONMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\benvironment\s*=\s*"([^"]*)""#).unwrap());
static REGION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(?:aws_)?region\s*=\s*"([^"]*)""#).unwrap());
static VPC_CIDR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bvpc_cidr\s*=\s*"([^"]*)""#).unwrap());
static CLUSTER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:\w+_)?cluster_name\s*=\s*"([^"]*)""#).unwrap()
});
static REGISTRY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(?:ecr|registry)_name\s*=\s*"([^"]*)""#).unwrap());
static DNS_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bdns(?:_name)?\s*=\s*"([^"]*)""#).unwrap());
static PORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bport\s*=\s*("[^"]*"|[^\s,}\]#]+)"#).unwrap());
static CONTAINER_PORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bcontainer_port\s*=\s*("[^"]*"|[^\s,}\]#]+)"#).unwrap()
});
static PUBLIC_SUBNETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpublic_subnets\s*=\s*\[([^\]]*)\]").unwrap());
static PRIVATE_SUBNETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bprivate_subnets\s*=\s*\[([^\]]*)\]").unwrap());
static AVAILABILITY_ZONES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bavailability_zones\s*=\s*\[([^\]]*)\]").unwrap());

/// Profile plus any non-fatal parse advisories
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub profile: EnvironmentProfile,
    pub advisories: Vec<Advisory>,
}

/// Turns declarative environment definitions into [`EnvironmentProfile`]s
#[derive(Debug, Clone, Default)]
pub struct ConfigurationExtractor;

impl ConfigurationExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Read and extract a definition file
    pub fn extract_file(&self, path: &Path, fallback_name: &str) -> EstimationResult<Extraction> {
        if !path.is_file() {
            return Err(EstimationError::NotFound(format!(
                "definition file {}",
                path.display()
            )));
        }

        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = text.len(), "Read environment definition");
        self.extract(&text, fallback_name)
    }

    /// Extract a profile from definition text.
    ///
    /// The profile is named after the declared `environment`, or
    /// `fallback_name` when none is declared.
    pub fn extract(&self, text: &str, fallback_name: &str) -> EstimationResult<Extraction> {
        let name = capture(&ENVIRONMENT, text)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| fallback_name.to_string());

        let mut profile = EnvironmentProfile::new(name)?;
        let mut advisories = Vec::new();

        profile.source_module = capture(&SOURCE, text);
        profile.region = capture(&REGION, text);
        profile.vpc_cidr = capture(&VPC_CIDR, text);
        profile.cluster_name = capture(&CLUSTER_NAME, text);
        profile.registry_name = capture(&REGISTRY_NAME, text);
        profile.dns_name = capture(&DNS_NAME, text);
        profile.public_subnets = capture(&PUBLIC_SUBNETS, text).map(|raw| split_list(&raw));
        profile.private_subnets = capture(&PRIVATE_SUBNETS, text).map(|raw| split_list(&raw));
        profile.availability_zones =
            capture(&AVAILABILITY_ZONES, text).map(|raw| split_list(&raw));

        profile.port = capture(&PORT, text)
            .map(|raw| parse_port(profile.name(), "port", &raw, &mut advisories));
        profile.container_port = capture(&CONTAINER_PORT, text)
            .map(|raw| parse_port(profile.name(), "container_port", &raw, &mut advisories));

        Ok(Extraction {
            profile,
            advisories,
        })
    }
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Split a list body on commas, trimming quotes and whitespace and dropping empty elements
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|element| element.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace()))
        .filter(|element| !element.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_port(
    environment: &str,
    field: &str,
    raw: &str,
    advisories: &mut Vec<Advisory>,
) -> PortSetting {
    let value = raw.trim_matches('"');
    match value.parse::<u16>() {
        Ok(port) => PortSetting::Number(port),
        Err(e) => {
            let degraded = EstimationError::ParseDegraded {
                field: field.to_string(),
                raw: value.to_string(),
            };
            warn!(
                environment = environment,
                error = %degraded,
                cause = %e,
                "Keeping unparsed port value as text"
            );
            advisories.push(Advisory::from_error(environment, degraded));
            PortSetting::Raw(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnvironmentClass;

    const PRODUCTION: &str = r#"
include "root" {
  path = find_in_parent_folders()
}

terraform {
  source = "git::https://example.com/infra-modules.git//ecs-fargate?ref=v1.4.0"
}

inputs = {
  environment        = "production"
  aws_region         = "eu-west-1"
  vpc_CIDR           = "10.0.0.0/16"
  ecs_cluster_name   = "prod-cluster"
  ecr_name           = "prod-app"
  DNS                = "app.example.com"
  port               = 80
  container_port     = 8080
  public_subnets     = ["10.0.1.0/24", "10.0.2.0/24", "10.0.3.0/24"]
  private_subnets    = ["10.0.11.0/24", "10.0.12.0/24", "10.0.13.0/24"]
  availability_zones = ["eu-west-1a", "eu-west-1b", "eu-west-1c"]
}
"#;

    #[test]
    fn test_extracts_all_recognized_fields() {
        let extraction = ConfigurationExtractor::new().extract(PRODUCTION, "prod-dir").unwrap();
        let profile = extraction.profile;

        assert_eq!(profile.name(), "production");
        assert_eq!(profile.class(), EnvironmentClass::Production);
        assert_eq!(
            profile.source_module.as_deref(),
            Some("git::https://example.com/infra-modules.git//ecs-fargate?ref=v1.4.0")
        );
        assert_eq!(profile.region.as_deref(), Some("eu-west-1"));
        assert_eq!(profile.vpc_cidr.as_deref(), Some("10.0.0.0/16"));
        assert_eq!(profile.cluster_name.as_deref(), Some("prod-cluster"));
        assert_eq!(profile.registry_name.as_deref(), Some("prod-app"));
        assert_eq!(profile.dns_name.as_deref(), Some("app.example.com"));
        assert_eq!(profile.port, Some(PortSetting::Number(80)));
        assert_eq!(profile.container_port, Some(PortSetting::Number(8080)));
        assert_eq!(profile.subnet_count(), 6);
        assert_eq!(
            profile.availability_zones,
            Some(vec![
                "eu-west-1a".to_string(),
                "eu-west-1b".to_string(),
                "eu-west-1c".to_string()
            ])
        );
        assert!(extraction.advisories.is_empty());
    }

    #[test]
    fn test_missing_fields_stay_absent() {
        let text = r#"inputs = { environment = "staging" }"#;
        let profile = ConfigurationExtractor::new().extract(text, "x").unwrap().profile;

        assert_eq!(profile.name(), "staging");
        assert_eq!(profile.region, None);
        assert_eq!(profile.availability_zones, None);
        assert_eq!(profile.port, None);
        assert_eq!(profile.source_module, None);
    }

    #[test]
    fn test_fallback_name_when_environment_undeclared() {
        let text = r#"inputs = { aws_region = "us-east-1" }"#;
        let profile = ConfigurationExtractor::new().extract(text, "sandbox").unwrap().profile;

        assert_eq!(profile.name(), "sandbox");
        assert_eq!(profile.class(), EnvironmentClass::Unrecognized);
        assert_eq!(profile.region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let result = ConfigurationExtractor::new().extract("inputs = {}", "");
        assert!(matches!(result, Err(EstimationError::InvalidInput(_))));
    }

    #[test]
    fn test_unparsable_port_kept_raw() {
        let text = r#"
environment    = "development"
port           = var.http_port
container_port = "3000"
"#;
        let extraction = ConfigurationExtractor::new().extract(text, "dev").unwrap();

        assert_eq!(extraction.profile.port, Some(PortSetting::Raw("var.http_port".into())));
        assert_eq!(extraction.profile.container_port, Some(PortSetting::Number(3000)));
        assert_eq!(
            extraction.advisories,
            vec![Advisory::ParseDegraded {
                environment: "development".into(),
                field: "port".into(),
                raw: "var.http_port".into(),
            }]
        );
    }

    #[test]
    fn test_port_does_not_match_container_port() {
        let text = r#"container_port = 8080"#;
        let profile = ConfigurationExtractor::new().extract(text, "dev").unwrap().profile;

        assert_eq!(profile.port, None);
        assert_eq!(profile.container_port, Some(PortSetting::Number(8080)));
    }

    #[test]
    fn test_case_and_whitespace_tolerance() {
        let text = "ENVIRONMENT=\"staging\"\nAvailability_Zones   =   [ 'a' ,\"b\",  ]";
        let profile = ConfigurationExtractor::new().extract(text, "x").unwrap().profile;

        assert_eq!(profile.name(), "staging");
        assert_eq!(profile.availability_zones, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_multiline_lists() {
        let text = "private_subnets = [\n  \"10.0.11.0/24\",\n  \"10.0.12.0/24\"\n]";
        let profile = ConfigurationExtractor::new().extract(text, "dev").unwrap().profile;

        assert_eq!(
            profile.private_subnets,
            Some(vec!["10.0.11.0/24".to_string(), "10.0.12.0/24".to_string()])
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigurationExtractor::new()
            .extract_file(&dir.path().join("terragrunt.hcl"), "dev");

        assert!(matches!(result, Err(EstimationError::NotFound(_))));
    }

    #[test]
    fn test_extract_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terragrunt.hcl");
        std::fs::write(&path, PRODUCTION).unwrap();

        let extraction = ConfigurationExtractor::new().extract_file(&path, "prod").unwrap();
        assert_eq!(extraction.profile.name(), "production");
    }
}
