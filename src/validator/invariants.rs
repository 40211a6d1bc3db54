// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Invariants
//!
//! Pure checks for the properties [`validate_and_fix`](super::validate_and_fix)
//! guarantees on its output. Nothing here mutates; the functions only report.
//!
//! 1. Exactly one network
//! 2. ≥1 public and ≥2 private subnets
//! 3. Load balancers sit only in public subnets
//! 4. Non-bastion compute sits in a private subnet
//! 5. Databases sit only in private subnets, ≥2 distinct
//! 6. Every weak reference resolves
//! 7. Private subnets imply a NAT gateway in a public subnet
//! 8. The network has a flow log

use std::collections::HashSet;

use crate::model::{InfrastructureModel, SubnetVisibility};

/// One broken invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("expected exactly one network, found {count}")]
    NetworkCount { count: usize },

    #[error("network has no public subnet")]
    MissingPublicSubnet,

    #[error("network has {count} private subnet(s), at least 2 required")]
    InsufficientPrivateSubnets { count: usize },

    #[error("load balancer {id} is not confined to public subnets")]
    LoadBalancerPlacement { id: String },

    #[error("compute instance {id} is in a public subnet")]
    ComputePlacement { id: String },

    #[error("database {id} needs two distinct private subnets")]
    DatabasePlacement { id: String },

    #[error("{resource_id} references missing {reference}")]
    DanglingReference { resource_id: String, reference: String },

    #[error("private subnets exist but no NAT gateway sits in a public subnet")]
    MissingNatGateway,

    #[error("network has no flow logs")]
    MissingFlowLogs,
}

/// Every violated invariant, in invariant order
pub fn violations(model: &InfrastructureModel) -> Vec<InvariantViolation> {
    let mut out = Vec::new();

    if model.networks.len() != 1 {
        out.push(InvariantViolation::NetworkCount {
            count: model.networks.len(),
        });
    }

    let public_count = model.public_subnets().len();
    let private_count = model.private_subnets().len();
    if public_count == 0 {
        out.push(InvariantViolation::MissingPublicSubnet);
    }
    if private_count < 2 {
        out.push(InvariantViolation::InsufficientPrivateSubnets {
            count: private_count,
        });
    }

    let is = |id: &str, visibility: SubnetVisibility| model.subnet_visibility(id) == Some(visibility);

    for lb in &model.load_balancers {
        if lb.subnet_ids.is_empty()
            || lb.subnet_ids.iter().any(|id| is(id, SubnetVisibility::Private))
        {
            out.push(InvariantViolation::LoadBalancerPlacement { id: lb.id.clone() });
        }
    }

    for instance in &model.compute_instances {
        if !instance.is_bastion() && is(&instance.subnet_id, SubnetVisibility::Public) {
            out.push(InvariantViolation::ComputePlacement {
                id: instance.id.clone(),
            });
        }
    }

    for db in &model.databases {
        let distinct: HashSet<&String> = db.subnet_ids.iter().collect();
        if distinct.len() < 2 || db.subnet_ids.iter().any(|id| is(id, SubnetVisibility::Public)) {
            out.push(InvariantViolation::DatabasePlacement { id: db.id.clone() });
        }
    }

    out.extend(dangling_references(model));

    if private_count > 0
        && !model
            .nat_gateways
            .iter()
            .any(|nat| is(&nat.subnet_id, SubnetVisibility::Public))
    {
        out.push(InvariantViolation::MissingNatGateway);
    }

    let has_flow_logs = model
        .primary_network()
        .is_some_and(|n| model.flow_logs.iter().any(|fl| fl.network_id == n.id));
    if !has_flow_logs {
        out.push(InvariantViolation::MissingFlowLogs);
    }

    out
}

/// Weak references that do not resolve to an entity of the expected kind
pub fn dangling_references(model: &InfrastructureModel) -> Vec<InvariantViolation> {
    let mut out = Vec::new();
    let mut dangling = |resource_id: &str, reference: String| {
        out.push(InvariantViolation::DanglingReference {
            resource_id: resource_id.to_string(),
            reference,
        });
    };
    let subnet_missing = |id: &str| model.subnet(id).is_none();

    for instance in &model.compute_instances {
        if subnet_missing(&instance.subnet_id) {
            dangling(&instance.id, format!("subnet {}", instance.subnet_id));
        }
    }
    for db in &model.databases {
        for id in db.subnet_ids.iter().filter(|id| subnet_missing(id.as_str())) {
            dangling(&db.id, format!("subnet {id}"));
        }
    }
    for lb in &model.load_balancers {
        for id in lb.subnet_ids.iter().filter(|id| subnet_missing(id.as_str())) {
            dangling(&lb.id, format!("subnet {id}"));
        }
        for id in lb
            .target_instance_ids
            .iter()
            .filter(|id| model.compute(id.as_str()).is_none())
        {
            dangling(&lb.id, format!("compute target {id}"));
        }
    }
    for nat in &model.nat_gateways {
        if subnet_missing(&nat.subnet_id) {
            dangling(&nat.id, format!("subnet {}", nat.subnet_id));
        }
    }
    for sg in &model.security_groups {
        if model.network(&sg.network_id).is_none() {
            dangling(&sg.id, format!("network {}", sg.network_id));
        }
    }
    for flow_log in &model.flow_logs {
        if model.network(&flow_log.network_id).is_none() {
            dangling(&flow_log.id, format!("network {}", flow_log.network_id));
        }
    }
    out
}

/// True when every invariant holds
pub fn is_valid(model: &InfrastructureModel) -> bool {
    violations(model).is_empty()
}
