// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-infrastructure-compiler
//!
//! Deterministic models shared by the integration suites. Every fixture is
//! built by hand from fixed ids so that expectations can name them.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use cim_infrastructure_compiler::model::*;

pub const NETWORK_ID: &str = "vpc-main";
pub const PUBLIC_SUBNET: &str = "subnet-public-1";
pub const PRIVATE_SUBNET_A: &str = "subnet-private-1";
pub const PRIVATE_SUBNET_B: &str = "subnet-private-2";
pub const COMPUTE_ID: &str = "c1";
pub const DATABASE_ID: &str = "db1";
pub const LOAD_BALANCER_ID: &str = "lb1";
pub const NAT_ID: &str = "nat-1";
pub const FLOW_LOG_ID: &str = "flowlog-1";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

pub fn network() -> Network {
    Network::new(NETWORK_ID, "main-vpc", "10.0.0.0/16")
        .with_subnet(Subnet::new(
            PUBLIC_SUBNET,
            "public-subnet-1",
            "10.0.1.0/24",
            SubnetVisibility::Public,
            "us-east-1a",
        ))
        .with_subnet(Subnet::new(
            PRIVATE_SUBNET_A,
            "private-subnet-1",
            "10.0.2.0/24",
            SubnetVisibility::Private,
            "us-east-1a",
        ))
        .with_subnet(Subnet::new(
            PRIVATE_SUBNET_B,
            "private-subnet-2",
            "10.0.3.0/24",
            SubnetVisibility::Private,
            "us-east-1b",
        ))
}

/// A model that already satisfies every topology invariant:
/// `lb1 (public) -> c1 (private) -> db1 (private pair)` plus NAT and flow log
pub fn three_tier() -> InfrastructureModel {
    let mut model = InfrastructureModel::new();
    model.add_network(network());
    model.add_compute(ComputeInstance::new(
        COMPUTE_ID,
        "web-1",
        InstanceSize::T3Small,
        PRIVATE_SUBNET_A,
    ));
    model.add_database(Database::new(
        DATABASE_ID,
        "main-db",
        DatabaseEngine::Postgres,
        vec![PRIVATE_SUBNET_A.into(), PRIVATE_SUBNET_B.into()],
    ));
    model.add_load_balancer(LoadBalancer::new(
        LOAD_BALANCER_ID,
        "web-lb",
        vec![PUBLIC_SUBNET.into()],
        vec![COMPUTE_ID.into()],
    ));
    model.add_nat_gateway(NatGateway::new(NAT_ID, "nat", PUBLIC_SUBNET));
    model.add_flow_logs(FlowLogs::new(FLOW_LOG_ID, NETWORK_ID));
    model.last_edit_timestamp = Some(fixed_timestamp());
    model
}

/// The same resources with every placement wrong and no egress or logging
pub fn misplaced_three_tier() -> InfrastructureModel {
    let mut model = InfrastructureModel::new();
    model.add_network(network());
    model.add_compute(ComputeInstance::new(
        COMPUTE_ID,
        "web-1",
        InstanceSize::T3Small,
        PUBLIC_SUBNET,
    ));
    model.add_database(Database::new(
        DATABASE_ID,
        "main-db",
        DatabaseEngine::Postgres,
        vec![PUBLIC_SUBNET.into()],
    ));
    model.add_load_balancer(LoadBalancer::new(
        LOAD_BALANCER_ID,
        "web-lb",
        vec![PRIVATE_SUBNET_A.into()],
        vec![COMPUTE_ID.into(), "ghost".into()],
    ));
    model
}

/// JSON object literal to a property map
pub fn props(value: Value) -> Map<String, Value> {
    value
        .as_object()
        .cloned()
        .expect("fixture properties must be a JSON object")
}
