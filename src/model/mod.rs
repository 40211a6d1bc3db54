// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure Graph Model
//!
//! The canonical in-memory graph every other component reads from. Diagrams,
//! Terraform and reports are projections of this value; they are never
//! produced from text directly.
//!
//! The model is a pure data container:
//!
//! - Append methods (`add_*`) push into collections and check nothing
//! - Lookup helpers are linear scans returning `Option`
//! - Invariants are the validator's and the edit engine's business
//!
//! # Example
//!
//! ```rust
//! use cim_infrastructure_compiler::model::*;
//!
//! let mut model = InfrastructureModel::new();
//! model.add_network(
//!     Network::new("vpc-main", "main-vpc", "10.0.0.0/16").with_subnet(Subnet::new(
//!         "subnet-public-1",
//!         "public-subnet-1",
//!         "10.0.1.0/24",
//!         SubnetVisibility::Public,
//!         "us-east-1a",
//!     )),
//! );
//!
//! assert!(model.subnet("subnet-public-1").unwrap().is_public());
//! assert_eq!(model.network_of_subnet("subnet-public-1").unwrap().id, "vpc-main");
//! ```

pub mod cidr;
pub mod entities;
pub mod resource_kind;
pub mod vocabulary;

pub use cidr::{CidrBlock, CidrError};
pub use entities::{
    ComputeInstance, Database, FirewallRule, FlowLogs, LoadBalancer, NatGateway, Network,
    ObjectStore, SecurityGroup, Subnet,
};
pub use resource_kind::ResourceKind;
pub use vocabulary::{
    DatabaseEngine, EditSource, InstanceSize, LogDestination, ModelVersion,
    ParseVocabularyError, SubnetVisibility, TrafficType, VersionExhausted,
};

use chrono::{DateTime, Utc};

/// Identifier-safe form of an id: every character outside `[A-Za-z0-9_]`
/// becomes `_`. Distinct ids can share a local name (`ec2-1`, `ec2_1`).
pub fn local_name(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root of the infrastructure graph; owns every entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InfrastructureModel {
    #[serde(default, alias = "vpcs")]
    pub networks: Vec<Network>,
    #[serde(default, alias = "ec2_instances")]
    pub compute_instances: Vec<ComputeInstance>,
    #[serde(default, alias = "rds_databases")]
    pub databases: Vec<Database>,
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancer>,
    #[serde(default, alias = "s3_buckets")]
    pub object_stores: Vec<ObjectStore>,
    #[serde(default)]
    pub security_groups: Vec<SecurityGroup>,
    #[serde(default)]
    pub nat_gateways: Vec<NatGateway>,
    #[serde(default)]
    pub flow_logs: Vec<FlowLogs>,

    /// Provenance of the latest change
    #[serde(default)]
    pub last_edit_source: EditSource,
    #[serde(default)]
    pub last_edit_timestamp: Option<DateTime<Utc>>,
    /// Version string, incremented on every successful edit
    #[serde(default)]
    pub model_id: ModelVersion,
}

impl InfrastructureModel {
    /// Empty model at `model-v1` with `initial` provenance
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Appends
    // ========================================================================

    pub fn add_network(&mut self, network: Network) {
        self.networks.push(network);
    }

    pub fn add_compute(&mut self, instance: ComputeInstance) {
        self.compute_instances.push(instance);
    }

    pub fn add_database(&mut self, database: Database) {
        self.databases.push(database);
    }

    pub fn add_load_balancer(&mut self, lb: LoadBalancer) {
        self.load_balancers.push(lb);
    }

    pub fn add_object_store(&mut self, bucket: ObjectStore) {
        self.object_stores.push(bucket);
    }

    pub fn add_security_group(&mut self, sg: SecurityGroup) {
        self.security_groups.push(sg);
    }

    pub fn add_nat_gateway(&mut self, nat: NatGateway) {
        self.nat_gateways.push(nat);
    }

    pub fn add_flow_logs(&mut self, flow_logs: FlowLogs) {
        self.flow_logs.push(flow_logs);
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// The first network; after validation, the only one
    pub fn primary_network(&self) -> Option<&Network> {
        self.networks.first()
    }

    pub fn primary_network_mut(&mut self) -> Option<&mut Network> {
        self.networks.first_mut()
    }

    pub fn network(&self, id: &str) -> Option<&Network> {
        self.networks.iter().find(|n| n.id == id)
    }

    /// Find a subnet by id across all networks
    pub fn subnet(&self, id: &str) -> Option<&Subnet> {
        self.networks
            .iter()
            .flat_map(|n| n.subnets.iter())
            .find(|s| s.id == id)
    }

    /// Find the network that owns a subnet
    pub fn network_of_subnet(&self, subnet_id: &str) -> Option<&Network> {
        self.networks
            .iter()
            .find(|n| n.subnets.iter().any(|s| s.id == subnet_id))
    }

    /// Visibility of a subnet, `None` when the id does not resolve
    pub fn subnet_visibility(&self, subnet_id: &str) -> Option<SubnetVisibility> {
        self.subnet(subnet_id).map(|s| s.visibility)
    }

    pub fn compute(&self, id: &str) -> Option<&ComputeInstance> {
        self.compute_instances.iter().find(|c| c.id == id)
    }

    pub fn database(&self, id: &str) -> Option<&Database> {
        self.databases.iter().find(|d| d.id == id)
    }

    pub fn load_balancer(&self, id: &str) -> Option<&LoadBalancer> {
        self.load_balancers.iter().find(|lb| lb.id == id)
    }

    /// Kind of the entity carrying `id`, searching every collection
    pub fn locate(&self, id: &str) -> Option<ResourceKind> {
        if self.networks.iter().any(|n| n.id == id) {
            Some(ResourceKind::Network)
        } else if self.subnet(id).is_some() {
            Some(ResourceKind::Subnet)
        } else if self.compute(id).is_some() {
            Some(ResourceKind::Compute)
        } else if self.database(id).is_some() {
            Some(ResourceKind::Database)
        } else if self.load_balancer(id).is_some() {
            Some(ResourceKind::LoadBalancer)
        } else if self.object_stores.iter().any(|b| b.id == id) {
            Some(ResourceKind::ObjectStore)
        } else if self.security_groups.iter().any(|sg| sg.id == id) {
            Some(ResourceKind::SecurityGroup)
        } else if self.nat_gateways.iter().any(|nat| nat.id == id) {
            Some(ResourceKind::NatGateway)
        } else if self.flow_logs.iter().any(|fl| fl.id == id) {
            Some(ResourceKind::FlowLogs)
        } else {
            None
        }
    }

    /// Every entity id, networks and subnets included, in collection order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::with_capacity(self.resource_count());
        for network in &self.networks {
            ids.push(network.id.as_str());
            ids.extend(network.subnets.iter().map(|s| s.id.as_str()));
        }
        ids.extend(self.compute_instances.iter().map(|c| c.id.as_str()));
        ids.extend(self.databases.iter().map(|d| d.id.as_str()));
        ids.extend(self.load_balancers.iter().map(|lb| lb.id.as_str()));
        ids.extend(self.object_stores.iter().map(|b| b.id.as_str()));
        ids.extend(self.security_groups.iter().map(|sg| sg.id.as_str()));
        ids.extend(self.nat_gateways.iter().map(|nat| nat.id.as_str()));
        ids.extend(self.flow_logs.iter().map(|fl| fl.id.as_str()));
        ids
    }

    /// An existing id, other than `id` itself, with the same [`local_name`]
    pub fn local_name_clash(&self, id: &str) -> Option<&str> {
        let wanted = local_name(id);
        self.ids()
            .into_iter()
            .find(|existing| *existing != id && local_name(existing) == wanted)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.locate(id).is_some()
    }

    /// First id of the form `<prefix>-<n>` (n ≥ `start`) not used anywhere
    pub fn next_free_id(&self, prefix: &str, start: usize) -> String {
        (start.max(1)..)
            .map(|n| format!("{prefix}-{n}"))
            .find(|candidate| !self.contains_id(candidate))
            .unwrap_or_else(|| format!("{prefix}-{start}"))
    }

    /// Public subnets of the primary network, in declaration order
    pub fn public_subnets(&self) -> Vec<&Subnet> {
        self.primary_network()
            .map(|n| n.public_subnets().collect())
            .unwrap_or_default()
    }

    /// Private subnets of the primary network, in declaration order
    pub fn private_subnets(&self) -> Vec<&Subnet> {
        self.primary_network()
            .map(|n| n.private_subnets().collect())
            .unwrap_or_default()
    }

    /// Total number of entities (networks and subnets included)
    pub fn resource_count(&self) -> usize {
        self.networks.len()
            + self.networks.iter().map(|n| n.subnets.len()).sum::<usize>()
            + self.compute_instances.len()
            + self.databases.len()
            + self.load_balancers.len()
            + self.object_stores.len()
            + self.security_groups.len()
            + self.nat_gateways.len()
            + self.flow_logs.len()
    }

    // ========================================================================
    // Provenance
    // ========================================================================

    /// Record a successful change: provenance, timestamp and next version
    ///
    /// Leaves the model untouched when the version cannot advance.
    pub fn stamp(&mut self, source: EditSource) -> Result<(), VersionExhausted> {
        let next = self.model_id.next().ok_or(VersionExhausted(self.model_id))?;
        self.last_edit_source = source;
        self.last_edit_timestamp = Some(Utc::now());
        self.model_id = next;
        Ok(())
    }

    // ========================================================================
    // Nested-mapping form
    // ========================================================================

    /// Plain nested JSON form consumed by projections and persistence
    pub fn to_value(&self) -> Value {
        // Every field is a string, number, bool, list or map; cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
