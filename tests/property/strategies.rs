// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property Test Strategies
//!
//! Arbitrary infrastructure graphs and edit operations. Ids are unique per
//! kind and drawn from disjoint prefixes (`net-`, `sn-`, `vm-`, `db-`, `lb-`,
//! `nat-`, `fl-`, `sg-`, `s3-`), while references are drawn from a wider pool
//! so that some of them dangle. Security groups, buckets and databases also
//! carry insecure settings the validator must not touch.

use proptest::prelude::*;
use serde_json::{json, Value};

use cim_infrastructure_compiler::edits::EditOperation;
use cim_infrastructure_compiler::model::*;

use crate::fixtures::{
    COMPUTE_ID, DATABASE_ID, LOAD_BALANCER_ID, NAT_ID, PRIVATE_SUBNET_A, PRIVATE_SUBNET_B,
    PUBLIC_SUBNET,
};

const NETWORK_CIDRS: &[&str] = &["10.0.0.0/16", "172.16.0.0/16", "192.168.0.0/24", "not-a-cidr"];
const ZONES: &[&str] = &["us-east-1a", "us-east-1b", "us-east-1c"];

/// Subnet reference; ids above the generated count dangle
fn subnet_ref() -> impl Strategy<Value = String> {
    (0usize..10).prop_map(|i| format!("sn-{i}"))
}

fn compute_ref() -> impl Strategy<Value = String> {
    (0usize..6).prop_map(|i| format!("vm-{i}"))
}

fn network_ref() -> impl Strategy<Value = String> {
    (0usize..4).prop_map(|i| format!("net-{i}"))
}

fn instance_size() -> impl Strategy<Value = InstanceSize> {
    prop::sample::select(InstanceSize::all().to_vec())
}

fn engine() -> impl Strategy<Value = DatabaseEngine> {
    prop::sample::select(DatabaseEngine::all().to_vec())
}

/// (cidr, [(public?, zone)]) per network
fn network_shapes() -> impl Strategy<Value = Vec<(usize, Vec<(bool, usize)>)>> {
    prop::collection::vec(
        (
            0..NETWORK_CIDRS.len(),
            prop::collection::vec((any::<bool>(), 0..ZONES.len()), 0..4),
        ),
        0..3,
    )
}

fn networks() -> impl Strategy<Value = Vec<Network>> {
    network_shapes().prop_map(|shapes| {
        let mut next_subnet = 0usize;
        shapes
            .into_iter()
            .enumerate()
            .map(|(n, (cidr, subnets))| {
                let mut network = Network::new(format!("net-{n}"), format!("network-{n}"), NETWORK_CIDRS[cidr]);
                for (public, zone) in subnets {
                    let visibility = if public {
                        SubnetVisibility::Public
                    } else {
                        SubnetVisibility::Private
                    };
                    network.add_subnet(Subnet::new(
                        format!("sn-{next_subnet}"),
                        format!("subnet-{next_subnet}"),
                        format!("10.0.{}.0/24", 100 + next_subnet),
                        visibility,
                        ZONES[zone],
                    ));
                    next_subnet += 1;
                }
                network
            })
            .collect()
    })
}

fn compute_instances() -> impl Strategy<Value = Vec<ComputeInstance>> {
    prop::collection::vec((instance_size(), any::<bool>(), subnet_ref()), 0..5).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (size, bastion, subnet))| {
                let name = if bastion {
                    format!("bastion-{i}")
                } else {
                    format!("web-{i}")
                };
                ComputeInstance::new(format!("vm-{i}"), name, size, subnet)
            })
            .collect()
    })
}

fn databases() -> impl Strategy<Value = Vec<Database>> {
    prop::collection::vec(
        (engine(), prop::collection::vec(subnet_ref(), 0..3), any::<bool>()),
        0..3,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (engine, subnets, encrypted))| {
                let mut db = Database::new(format!("db-{i}"), format!("database-{i}"), engine, subnets);
                db.storage_encrypted = encrypted;
                db
            })
            .collect()
    })
}

fn object_stores() -> impl Strategy<Value = Vec<ObjectStore>> {
    prop::collection::vec(any::<bool>(), 0..3).prop_map(|flags| {
        flags
            .into_iter()
            .enumerate()
            .map(|(i, encrypted)| {
                let mut bucket = ObjectStore::new(format!("s3-{i}"), format!("bucket-{i}"));
                bucket.encryption_enabled = encrypted;
                bucket
            })
            .collect()
    })
}

/// An ingress rule on a sensitive or ordinary port, open to the world or not
fn ingress_rule() -> impl Strategy<Value = FirewallRule> {
    (
        prop::sample::select(vec![22u16, 443, 3389, 5432]),
        prop::sample::select(vec!["0.0.0.0/0", "::/0", "10.0.0.0/16"]),
    )
        .prop_map(|(port, source)| {
            let key = if source.contains(':') {
                "ipv6_cidr_blocks"
            } else {
                "cidr_blocks"
            };
            let mut rule = FirewallRule::new();
            rule.insert("from_port".into(), json!(port));
            rule.insert("to_port".into(), json!(port));
            rule.insert(key.into(), json!([source]));
            rule
        })
}

fn security_groups() -> impl Strategy<Value = Vec<SecurityGroup>> {
    prop::collection::vec((network_ref(), prop::collection::vec(ingress_rule(), 0..3)), 0..3).prop_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (network, rules))| {
                    let mut group = SecurityGroup::new(format!("sg-{i}"), format!("group-{i}"), network);
                    group.ingress_rules = rules;
                    group
                })
                .collect()
        },
    )
}

fn load_balancers() -> impl Strategy<Value = Vec<LoadBalancer>> {
    prop::collection::vec(
        (
            prop::collection::vec(subnet_ref(), 0..3),
            prop::collection::vec(compute_ref(), 0..3),
        ),
        0..3,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (subnets, targets))| {
                LoadBalancer::new(format!("lb-{i}"), format!("balancer-{i}"), subnets, targets)
            })
            .collect()
    })
}

/// A graph with arbitrary shape and defects: zero or several networks,
/// misplaced resources, dangling subnet, target and network references
pub fn arbitrary_model() -> impl Strategy<Value = InfrastructureModel> {
    (
        networks(),
        compute_instances(),
        databases(),
        load_balancers(),
        prop::collection::vec(subnet_ref(), 0..3),
        prop::collection::vec(network_ref(), 0..3),
        security_groups(),
        object_stores(),
    )
        .prop_map(|(networks, compute, databases, lbs, nats, flow_logs, groups, buckets)| {
            let mut model = InfrastructureModel::new();
            networks.into_iter().for_each(|n| model.add_network(n));
            compute.into_iter().for_each(|c| model.add_compute(c));
            databases.into_iter().for_each(|d| model.add_database(d));
            lbs.into_iter().for_each(|lb| model.add_load_balancer(lb));
            for (i, subnet) in nats.into_iter().enumerate() {
                model.add_nat_gateway(NatGateway::new(format!("nat-{i}"), format!("nat-{i}"), subnet));
            }
            for (i, network) in flow_logs.into_iter().enumerate() {
                model.add_flow_logs(FlowLogs::new(format!("fl-{i}"), network));
            }
            groups.into_iter().for_each(|sg| model.add_security_group(sg));
            buckets.into_iter().for_each(|b| model.add_object_store(b));
            model
        })
}

// ============================================================================
// Edit operations against the three-tier fixture
// ============================================================================

fn fixture_subnet() -> impl Strategy<Value = String> {
    prop::sample::select(vec![PUBLIC_SUBNET, PRIVATE_SUBNET_A, PRIVATE_SUBNET_B, "sn-ghost"])
        .prop_map(String::from)
}

fn fixture_compute() -> impl Strategy<Value = String> {
    prop::sample::select(vec![COMPUTE_ID, "ec2-1", "ec2-2", "vm-ghost"]).prop_map(String::from)
}

fn fixture_resource() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        COMPUTE_ID,
        "ec2-1",
        "ec2-2",
        DATABASE_ID,
        "rds-1",
        LOAD_BALANCER_ID,
        "lb-1",
        "s3-1",
        NAT_ID,
        PUBLIC_SUBNET,
        "ghost",
    ])
    .prop_map(String::from)
}

fn add(kind: &str, properties: Value) -> EditOperation {
    EditOperation::Add {
        resource_type: kind.to_string(),
        properties: properties.as_object().cloned().unwrap_or_default(),
    }
}

/// Any operation the diagram surface could submit, valid or not
pub fn edit_operation() -> impl Strategy<Value = EditOperation> {
    prop_oneof![
        (fixture_subnet(), instance_size()).prop_map(|(subnet, size)| add(
            "ec2",
            json!({"subnet_id": subnet, "instance_type": size.as_str()})
        )),
        (fixture_subnet(), fixture_subnet())
            .prop_map(|(a, b)| add("rds", json!({"subnet_ids": [a, b]}))),
        (fixture_subnet(), fixture_compute()).prop_map(|(subnet, target)| add(
            "load_balancer",
            json!({"subnet_ids": [subnet], "target_instance_ids": [target]})
        )),
        any::<bool>().prop_map(|encrypted| add("s3", json!({"encryption_enabled": encrypted}))),
        fixture_resource().prop_map(|resource_id| EditOperation::Remove { resource_id }),
        (fixture_resource(), fixture_subnet()).prop_map(|(resource_id, target_subnet_id)| {
            EditOperation::Move {
                resource_id,
                target_subnet_id,
            }
        }),
        (fixture_resource(), prop::collection::vec(fixture_compute(), 0..3)).prop_map(
            |(resource_id, targets)| EditOperation::Update {
                resource_id,
                property_name: "target_instance_ids".into(),
                value: json!(targets),
            }
        ),
        (fixture_resource(), instance_size()).prop_map(|(resource_id, size)| {
            EditOperation::Update {
                resource_id,
                property_name: "instance_type".into(),
                value: json!(size.as_str()),
            }
        }),
    ]
}

pub fn edit_sequence() -> impl Strategy<Value = Vec<EditOperation>> {
    prop::collection::vec(edit_operation(), 1..20)
}
