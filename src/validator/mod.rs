// Copyright (c) 2025 - Cowboy AI, Inc.
//! Architecture Validator
//!
//! Rewrites an arbitrary, possibly malformed infrastructure graph into one
//! that satisfies the topology invariants in [`invariants`], recording every
//! rewrite as a user-facing correction.
//!
//! # Passes
//!
//! Passes run in a fixed order and each one is idempotent on its own output:
//!
//! 1. `enforce_single_network`: create or merge down to one network
//! 2. `enforce_required_subnets`: ≥1 public and ≥2 private subnets
//! 3. `enforce_resource_placement`: LB public, compute private, DB private
//! 4. `enforce_network_boundaries`: repair dangling weak references
//! 5. `enforce_nat_and_flow_logs`: egress and observability resources
//!
//! Later passes rely on earlier ones (placement needs the subnets created by
//! pass 2), so the order is part of the contract.
//!
//! # Totality
//!
//! Structural defects are never errors. [`validate_and_fix`] always returns a
//! model; running it again on its own output yields zero corrections.
//!
//! Insecure-but-structural settings (an unencrypted bucket, an open SSH rule)
//! are left alone: those are reported by [`crate::security::scan`].

pub mod invariants;
mod passes;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::InfrastructureModel;

pub use invariants::{is_valid, violations, InvariantViolation};

/// Default network created when a model has none
pub const DEFAULT_NETWORK_ID: &str = "vpc-main";
pub const DEFAULT_NETWORK_NAME: &str = "main-vpc";
pub const DEFAULT_NETWORK_CIDR: &str = "10.0.0.0/16";

/// Availability zones used for synthesized subnets, in preference order
pub const AVAILABILITY_ZONES: [&str; 3] = ["us-east-1a", "us-east-1b", "us-east-1c"];

/// Name given to a synthesized NAT gateway
pub const AUTO_NAT_NAME: &str = "auto-nat-gateway";

/// Corrections applied by one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub corrections: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one rewrite
    pub fn correct(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("Correction: {}", message);
        self.corrections.push(message);
    }

    /// True when the input already satisfied every invariant
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.corrections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }
}

/// Validate a model and rewrite it until every topology invariant holds
///
/// Takes ownership; callers that need to keep the input clone it first.
pub fn validate_and_fix(mut model: InfrastructureModel) -> (InfrastructureModel, ValidationReport) {
    let mut report = ValidationReport::new();
    debug!(
        "Validating model {} ({} resources)",
        model.model_id,
        model.resource_count()
    );

    passes::enforce_single_network(&mut model, &mut report);
    passes::enforce_required_subnets(&mut model, &mut report);
    passes::enforce_resource_placement(&mut model, &mut report);
    passes::enforce_network_boundaries(&mut model, &mut report);
    passes::enforce_nat_and_flow_logs(&mut model, &mut report);

    info!(
        "Validation complete for {}: {} corrections",
        model.model_id,
        report.len()
    );
    (model, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    #[test]
    fn test_empty_model_gets_full_skeleton() {
        let (model, report) = validate_and_fix(InfrastructureModel::new());

        assert_eq!(model.networks.len(), 1);
        let network = &model.networks[0];
        assert_eq!(network.id, DEFAULT_NETWORK_ID);
        assert_eq!(network.cidr, DEFAULT_NETWORK_CIDR);

        let public = model.public_subnets();
        let private = model.private_subnets();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].cidr, "10.0.1.0/24");
        assert_eq!(private.len(), 2);
        assert_eq!(private[0].cidr, "10.0.2.0/24");
        assert_eq!(private[1].cidr, "10.0.3.0/24");
        assert_ne!(private[0].availability_zone, private[1].availability_zone);

        assert_eq!(model.nat_gateways.len(), 1);
        assert_eq!(model.nat_gateways[0].id, "nat-vpc-main");
        assert_eq!(model.nat_gateways[0].subnet_id, public[0].id);
        assert_eq!(model.flow_logs.len(), 1);
        assert_eq!(model.flow_logs[0].id, "flowlog-vpc-main");

        assert!(report.len() >= 5);
        assert!(violations(&model).is_empty());
    }

    #[test]
    fn test_second_run_is_clean() {
        let (once, _) = validate_and_fix(InfrastructureModel::new());
        let (twice, report) = validate_and_fix(once.clone());
        assert!(report.is_clean());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_public_database_moved_to_private() {
        let (mut model, _) = validate_and_fix(InfrastructureModel::new());
        let public = model.public_subnets()[0].id.clone();
        model.add_database(Database::new("rds-1", "orders", DatabaseEngine::Postgres, vec![public]));

        let (fixed, report) = validate_and_fix(model);
        let db = fixed.database("rds-1").unwrap();
        assert_eq!(db.subnet_ids, vec!["subnet-private-1", "subnet-private-2"]);
        assert!(report
            .corrections
            .iter()
            .any(|c| c.contains("Moved RDS database 'orders' to private subnets")));
    }

    #[test]
    fn test_insecure_but_valid_config_is_left_alone() {
        let (mut model, _) = validate_and_fix(InfrastructureModel::new());
        let mut open_ssh = serde_json::Map::new();
        open_ssh.insert("from_port".into(), 22.into());
        open_ssh.insert("to_port".into(), 22.into());
        open_ssh.insert("cidr_blocks".into(), serde_json::json!(["0.0.0.0/0"]));
        model.add_security_group(SecurityGroup::new("sg-ssh", "ssh", DEFAULT_NETWORK_ID).with_ingress(open_ssh));
        let mut bucket = ObjectStore::new("s3-1", "logs");
        bucket.encryption_enabled = false;
        model.add_object_store(bucket);

        let (fixed, report) = validate_and_fix(model.clone());
        assert!(report.is_clean());
        assert_eq!(fixed, model);

        let rules: Vec<_> = crate::security::scan(&fixed).into_iter().map(|w| w.rule).collect();
        assert!(rules.contains(&crate::security::SecurityRule::OpenSensitiveIngress));
        assert!(rules.contains(&crate::security::SecurityRule::UnencryptedObjectStore));
    }
}
