// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Architecture Validator
//!
//! Whatever graph goes in, the validator's output satisfies every topology
//! invariant, and validating that output again changes nothing.

use cim_infrastructure_compiler::model::SubnetVisibility;
use cim_infrastructure_compiler::validator::invariants::dangling_references;
use cim_infrastructure_compiler::validator::{is_valid, validate_and_fix, violations};
use proptest::prelude::*;

use super::strategies::arbitrary_model;

proptest! {
    /// Property: Validation is total and closes every invariant
    #[test]
    fn prop_validated_model_satisfies_invariants(model in arbitrary_model()) {
        let (fixed, _) = validate_and_fix(model);

        prop_assert!(
            is_valid(&fixed),
            "violations after validation: {:?}",
            violations(&fixed)
        );
    }

    /// Property: Validation is idempotent
    ///
    /// A second run on validated output applies zero corrections and
    /// returns an identical model.
    #[test]
    fn prop_validation_is_idempotent(model in arbitrary_model()) {
        let (once, _) = validate_and_fix(model);
        let (twice, report) = validate_and_fix(once.clone());

        prop_assert!(report.is_clean(), "second run corrected: {:?}", report.corrections);
        prop_assert_eq!(twice, once);
    }

    /// Property: Validation leaves firewall rules and encryption flags alone
    ///
    /// Insecure settings are reported by the scanner, never rewritten.
    #[test]
    fn prop_validation_keeps_security_settings(model in arbitrary_model()) {
        let (fixed, _) = validate_and_fix(model.clone());

        prop_assert_eq!(fixed.security_groups.len(), model.security_groups.len());
        for (before, after) in model.security_groups.iter().zip(&fixed.security_groups) {
            prop_assert_eq!(&after.id, &before.id);
            prop_assert_eq!(&after.ingress_rules, &before.ingress_rules);
        }
        prop_assert_eq!(&fixed.object_stores, &model.object_stores);
        for db in &model.databases {
            let kept = fixed.database(&db.id);
            prop_assert!(kept.is_some());
            prop_assert_eq!(kept.map(|d| d.storage_encrypted), Some(db.storage_encrypted));
        }
    }

    /// Property: Exactly one network survives, holding every subnet
    #[test]
    fn prop_single_network(model in arbitrary_model()) {
        let subnet_ids: Vec<String> = model
            .networks
            .iter()
            .flat_map(|n| n.subnets.iter().map(|s| s.id.clone()))
            .collect();
        let (fixed, _) = validate_and_fix(model);

        prop_assert_eq!(fixed.networks.len(), 1);
        for id in &subnet_ids {
            prop_assert!(fixed.subnet(id).is_some(), "subnet {} lost in merge", id);
        }
    }

    /// Property: No weak reference dangles after validation
    #[test]
    fn prop_no_dangling_references(model in arbitrary_model()) {
        let (fixed, _) = validate_and_fix(model);
        prop_assert!(dangling_references(&fixed).is_empty());
    }

    /// Property: Databases never keep a public subnet
    #[test]
    fn prop_databases_private(model in arbitrary_model()) {
        let (fixed, _) = validate_and_fix(model);
        for db in &fixed.databases {
            for id in &db.subnet_ids {
                prop_assert_eq!(fixed.subnet_visibility(id), Some(SubnetVisibility::Private));
            }
        }
    }
}
