// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Edit Engine
//!
//! Random operation sequences against a valid three-tier model. Individual
//! operations may be rejected; whatever is accepted must keep references
//! intact, advance the version by exactly one, and never admit a HIGH
//! severity warning.

use cim_infrastructure_compiler::edits::{move_resource, remove_resource, EditError};
use cim_infrastructure_compiler::model::*;
use cim_infrastructure_compiler::security::{first_blocking, scan};
use cim_infrastructure_compiler::validator::invariants::dangling_references;
use proptest::prelude::*;

use super::strategies::{edit_operation, edit_sequence};
use crate::fixtures::{
    three_tier, LOAD_BALANCER_ID, PRIVATE_SUBNET_A, PRIVATE_SUBNET_B, PUBLIC_SUBNET,
};

proptest! {
    /// Property: Accepted edits never leave a dangling reference
    #[test]
    fn prop_edits_preserve_references(operations in edit_sequence()) {
        let mut model = three_tier();
        for operation in &operations {
            if let Ok(outcome) = operation.apply(&model, EditSource::Diagram) {
                model = outcome.model;
            }
            prop_assert!(
                dangling_references(&model).is_empty(),
                "after {:?}: {:?}",
                operation,
                dangling_references(&model)
            );
        }
    }

    /// Property: Accepted edits never admit a HIGH warning
    #[test]
    fn prop_edits_stay_below_high(operations in edit_sequence()) {
        let mut model = three_tier();
        for operation in &operations {
            if let Ok(outcome) = operation.apply(&model, EditSource::Diagram) {
                prop_assert!(first_blocking(&outcome.warnings).is_none());
                model = outcome.model;
            }
            prop_assert!(first_blocking(&scan(&model)).is_none());
        }
    }

    /// Property: Success advances model_id by one; rejection changes nothing
    #[test]
    fn prop_version_advances_by_one(operation in edit_operation()) {
        let model = three_tier();
        let before = model.clone();

        if let Ok(outcome) = operation.apply(&model, EditSource::Iac) {
            prop_assert_eq!(Some(outcome.model.model_id), model.model_id.next());
            prop_assert_eq!(outcome.model.last_edit_source, EditSource::Iac);
        }
        prop_assert_eq!(model, before);
    }

    /// Property: No database can be moved into a public subnet
    #[test]
    fn prop_database_move_to_public_rejected(
        engine in prop::sample::select(DatabaseEngine::all().to_vec()),
        name in "[a-z]{1,12}",
        swap in any::<bool>(),
    ) {
        let mut model = three_tier();
        let pair = if swap {
            vec![PRIVATE_SUBNET_B.to_string(), PRIVATE_SUBNET_A.to_string()]
        } else {
            vec![PRIVATE_SUBNET_A.to_string(), PRIVATE_SUBNET_B.to_string()]
        };
        model.add_database(Database::new("rds-prop", name, engine, pair));

        let rejection = move_resource(&model, "rds-prop", PUBLIC_SUBNET, EditSource::Diagram)
            .expect_err("public database placement must be rejected");
        prop_assert!(matches!(rejection.error, EditError::PolicyViolation(_)));
        prop_assert!(!rejection.warnings.is_empty());
    }

    /// Property: Removing compute strips it from every load balancer
    #[test]
    fn prop_remove_compute_cascades(count in 1usize..6, victim in 0usize..6) {
        let victim = victim % count;
        let mut model = three_tier();
        let ids: Vec<String> = (0..count).map(|i| format!("vm-{i}")).collect();
        for id in &ids {
            model.add_compute(ComputeInstance::new(id.as_str(), id.as_str(), InstanceSize::T3Micro, PRIVATE_SUBNET_B));
        }
        model.add_load_balancer(LoadBalancer::new(
            "lb-prop",
            "prop",
            vec![PUBLIC_SUBNET.into()],
            ids.clone(),
        ));

        let outcome = remove_resource(&model, &ids[victim], EditSource::Diagram)
            .expect("compute removal is never gated");

        for lb in &outcome.model.load_balancers {
            prop_assert!(!lb.target_instance_ids.contains(&ids[victim]));
        }
        let remaining = &outcome.model.load_balancer("lb-prop").expect("lb kept").target_instance_ids;
        prop_assert_eq!(remaining.len(), count - 1);
        prop_assert!(outcome.model.load_balancer(LOAD_BALANCER_ID).is_some());
    }
}
