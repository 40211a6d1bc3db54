// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Kind Vocabulary
//!
//! The fixed set of entity kinds an infrastructure model can hold. External
//! callers address kinds with the canonical strings below; a handful of
//! provider-flavoured aliases (`ec2`, `rds`, `elb`, `s3`) are accepted at the
//! parsing boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::vocabulary::ParseVocabularyError;

/// Entity kind taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Virtual private network (VPC)
    Network,
    /// Subnet inside the network
    Subnet,
    /// Compute instance (EC2-like)
    Compute,
    /// Managed relational database (RDS-like)
    Database,
    /// Application load balancer
    LoadBalancer,
    /// Object storage bucket (S3-like)
    ObjectStore,
    /// Firewall rule set
    SecurityGroup,
    /// NAT gateway for private egress
    NatGateway,
    /// Network flow log capture
    FlowLogs,
}

impl ResourceKind {
    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Subnet => "subnet",
            Self::Compute => "compute",
            Self::Database => "database",
            Self::LoadBalancer => "load_balancer",
            Self::ObjectStore => "object_store",
            Self::SecurityGroup => "security_group",
            Self::NatGateway => "nat_gateway",
            Self::FlowLogs => "flow_logs",
        }
    }

    /// Human-readable name used in corrections and error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Network => "VPC",
            Self::Subnet => "subnet",
            Self::Compute => "EC2 instance",
            Self::Database => "RDS database",
            Self::LoadBalancer => "load balancer",
            Self::ObjectStore => "S3 bucket",
            Self::SecurityGroup => "security group",
            Self::NatGateway => "NAT gateway",
            Self::FlowLogs => "flow log",
        }
    }

    /// Prefix for generated identifiers
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Network => "vpc",
            Self::Subnet => "subnet",
            Self::Compute => "ec2",
            Self::Database => "rds",
            Self::LoadBalancer => "lb",
            Self::ObjectStore => "s3",
            Self::SecurityGroup => "sg",
            Self::NatGateway => "nat",
            Self::FlowLogs => "flowlog",
        }
    }

    /// Structural kinds are owned by the validator's invariants: the network
    /// skeleton, its egress path and its observability record.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Network | Self::Subnet | Self::NatGateway | Self::FlowLogs
        )
    }

    /// All kinds in vocabulary order
    pub fn all() -> &'static [ResourceKind] {
        &[
            Self::Network,
            Self::Subnet,
            Self::Compute,
            Self::Database,
            Self::LoadBalancer,
            Self::ObjectStore,
            Self::SecurityGroup,
            Self::NatGateway,
            Self::FlowLogs,
        ]
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ParseVocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "network" | "vpc" => Ok(Self::Network),
            "subnet" => Ok(Self::Subnet),
            "compute" | "ec2" | "instance" => Ok(Self::Compute),
            "database" | "rds" => Ok(Self::Database),
            "load_balancer" | "elb" | "alb" => Ok(Self::LoadBalancer),
            "object_store" | "s3" | "bucket" => Ok(Self::ObjectStore),
            "security_group" | "sg" => Ok(Self::SecurityGroup),
            "nat_gateway" | "nat" => Ok(Self::NatGateway),
            "flow_logs" | "flow_log" => Ok(Self::FlowLogs),
            other => Err(ParseVocabularyError {
                vocabulary: "resource kind",
                value: other.to_string(),
            }),
        }
    }
}
