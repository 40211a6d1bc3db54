// Copyright (c) 2025 - Cowboy AI, Inc.
//! Graph Entities
//!
//! Plain data records. Cross-entity links (`subnet_id`, `subnet_ids`,
//! `target_instance_ids`, `network_id`) are *weak references*: logical
//! foreign keys resolved through [`InfrastructureModel`] lookups, with no
//! integrity enforced here.
//!
//! [`InfrastructureModel`]: super::InfrastructureModel

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::vocabulary::{
    DatabaseEngine, InstanceSize, LogDestination, SubnetVisibility, TrafficType,
};

pub const DEFAULT_AVAILABILITY_ZONE: &str = "us-east-1a";
pub const DEFAULT_AMI: &str = "ami-0c55b159cbfafe1f0";
pub const DEFAULT_DB_INSTANCE_CLASS: &str = "db.t3.micro";
pub const DEFAULT_ALLOCATED_STORAGE: u32 = 20;
pub const DEFAULT_SECURITY_GROUP_DESCRIPTION: &str = "Security group";

fn default_availability_zone() -> String {
    DEFAULT_AVAILABILITY_ZONE.to_string()
}

fn default_ami() -> String {
    DEFAULT_AMI.to_string()
}

fn default_instance_class() -> String {
    DEFAULT_DB_INSTANCE_CLASS.to_string()
}

fn default_allocated_storage() -> u32 {
    DEFAULT_ALLOCATED_STORAGE
}

fn default_description() -> String {
    DEFAULT_SECURITY_GROUP_DESCRIPTION.to_string()
}

fn enabled() -> bool {
    true
}

/// Opaque firewall rule record (`from_port`, `to_port`, `protocol`,
/// `cidr_blocks`, ... as supplied by the caller)
pub type FirewallRule = Map<String, Value>;

/// Virtual private network; owns its subnets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub cidr: String,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
}

impl Network {
    pub fn new(id: impl Into<String>, name: impl Into<String>, cidr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cidr: cidr.into(),
            subnets: Vec::new(),
        }
    }

    pub fn add_subnet(&mut self, subnet: Subnet) {
        self.subnets.push(subnet);
    }

    pub fn with_subnet(mut self, subnet: Subnet) -> Self {
        self.subnets.push(subnet);
        self
    }

    pub fn public_subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(|s| s.is_public())
    }

    pub fn private_subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(|s| !s.is_public())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub cidr: String,
    #[serde(alias = "subnet_type", alias = "type")]
    pub visibility: SubnetVisibility,
    #[serde(default = "default_availability_zone", alias = "az")]
    pub availability_zone: String,
}

impl Subnet {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        cidr: impl Into<String>,
        visibility: SubnetVisibility,
        availability_zone: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cidr: cidr.into(),
            visibility,
            availability_zone: availability_zone.into(),
        }
    }

    pub fn is_public(&self) -> bool {
        self.visibility == SubnetVisibility::Public
    }
}

/// EC2-like compute instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeInstance {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub instance_type: InstanceSize,
    pub subnet_id: String,
    #[serde(default = "default_ami")]
    pub ami: String,
}

impl ComputeInstance {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        instance_type: InstanceSize,
        subnet_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instance_type,
            subnet_id: subnet_id.into(),
            ami: default_ami(),
        }
    }

    /// Bastion / jump hosts are the only compute allowed in public subnets
    pub fn is_bastion(&self) -> bool {
        let name = self.name.to_lowercase();
        name.contains("bastion") || name.contains("jump")
    }
}

/// RDS-like managed database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub engine: DatabaseEngine,
    #[serde(default = "default_instance_class")]
    pub instance_class: String,
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    #[serde(default = "default_allocated_storage")]
    pub allocated_storage: u32,
    #[serde(default = "enabled")]
    pub storage_encrypted: bool,
}

impl Database {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        engine: DatabaseEngine,
        subnet_ids: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            engine,
            instance_class: default_instance_class(),
            subnet_ids,
            allocated_storage: DEFAULT_ALLOCATED_STORAGE,
            storage_encrypted: true,
        }
    }
}

/// Application load balancer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    #[serde(default)]
    pub target_instance_ids: Vec<String>,
}

impl LoadBalancer {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        subnet_ids: Vec<String>,
        target_instance_ids: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subnet_ids,
            target_instance_ids,
        }
    }
}

/// S3-like bucket; global, not tied to the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectStore {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub versioning_enabled: bool,
    #[serde(default = "enabled")]
    pub encryption_enabled: bool,
}

impl ObjectStore {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            versioning_enabled: false,
            encryption_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    #[serde(alias = "vpc_id")]
    pub network_id: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub ingress_rules: Vec<FirewallRule>,
    #[serde(default)]
    pub egress_rules: Vec<FirewallRule>,
}

impl SecurityGroup {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        network_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            network_id: network_id.into(),
            description: default_description(),
            ingress_rules: Vec::new(),
            egress_rules: Vec::new(),
        }
    }

    pub fn with_ingress(mut self, rule: FirewallRule) -> Self {
        self.ingress_rules.push(rule);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatGateway {
    pub id: String,
    pub name: String,
    pub subnet_id: String,
    #[serde(default)]
    pub elastic_ip: Option<String>,
}

impl NatGateway {
    pub fn new(id: impl Into<String>, name: impl Into<String>, subnet_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subnet_id: subnet_id.into(),
            elastic_ip: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLogs {
    pub id: String,
    #[serde(alias = "vpc_id")]
    pub network_id: String,
    #[serde(default)]
    pub log_destination_type: LogDestination,
    #[serde(default)]
    pub traffic_type: TrafficType,
    #[serde(default)]
    pub log_group_name: Option<String>,
}

impl FlowLogs {
    pub fn new(id: impl Into<String>, network_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            network_id: network_id.into(),
            log_destination_type: LogDestination::default(),
            traffic_type: TrafficType::default(),
            log_group_name: None,
        }
    }
}
