// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service configuration
//!
//! Loaded from the environment by the binary:
//!
//! | Variable       | Default     | Meaning                              |
//! |----------------|-------------|--------------------------------------|
//! | `INFRA_REGION` | `us-east-1` | AWS region written into Terraform    |
//! | `RUST_LOG`     | `info`      | `tracing-subscriber` filter directive |

use serde::{Deserialize, Serialize};

use crate::errors::{InfrastructureError, InfrastructureResult};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_LOG_FILTER: &str = "info";

pub const REGION_VAR: &str = "INFRA_REGION";
pub const LOG_FILTER_VAR: &str = "RUST_LOG";

/// Configuration for [`InfrastructureService`](crate::service::InfrastructureService)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Provider region for the Terraform projection
    pub region: String,
    /// Log filter directive
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> InfrastructureResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> InfrastructureResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(region) = lookup(REGION_VAR) {
            config = config.with_region(region);
        }
        if let Some(filter) = lookup(LOG_FILTER_VAR) {
            config = config.with_log_filter(filter);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into().trim().to_string();
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Region names are lowercase letters, digits and dashes, e.g. `eu-west-1`
    pub fn validate(&self) -> InfrastructureResult<()> {
        let well_formed = !self.region.is_empty()
            && self
                .region
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !well_formed {
            return Err(InfrastructureError::Configuration(format!(
                "invalid region '{}'",
                self.region
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("INFRA_REGION", " eu-west-1 "),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_rejects_malformed_region() {
        let result = ServiceConfig::from_lookup(lookup(&[("INFRA_REGION", "Mars Base")]));
        assert!(matches!(result, Err(InfrastructureError::Configuration(_))));
    }

    #[test]
    fn test_partial_json() {
        let config: ServiceConfig = serde_json::from_str(r#"{"region": "ap-south-1"}"#).unwrap();
        assert_eq!(config.log_filter, "info");
    }
}
