// Copyright (c) 2025 - Cowboy AI, Inc.
//! Text to Model
//!
//! A deterministic keyword extractor. It produces the *raw* model implied by
//! the description; placement mistakes and missing structure are left for
//! the validator to correct, so the parser never has to be clever.
//!
//! Input that looks like a JSON object is treated as a structured intent
//! document (the nested mapping form of a model, legacy field names
//! accepted) and deserialized directly.

use chrono::Utc;
use tracing::{debug, warn};

use crate::errors::{InfrastructureError, InfrastructureResult};
use crate::model::{
    CidrBlock, ComputeInstance, Database, DatabaseEngine, EditSource, InfrastructureModel,
    InstanceSize, LoadBalancer, Network, ObjectStore, Subnet, SubnetVisibility,
};

const INFRASTRUCTURE_KEYWORDS: &[&str] = &[
    "ec2",
    "instance",
    "server",
    "rds",
    "database",
    "load balancer",
    "alb",
    "elb",
    "web",
    "application",
    "infrastructure",
];
const PUBLIC_KEYWORDS: &[&str] = &["public", "load balancer", "alb", "elb", "internet-facing", "web"];
const PRIVATE_KEYWORDS: &[&str] = &["private", "database", "rds", "internal", "backend"];
const COMPUTE_KEYWORDS: &[&str] = &["ec2", "instance", "server", "web"];
const DATABASE_KEYWORDS: &[&str] = &["rds", "database", "postgres", "mysql", "mariadb"];
const LOAD_BALANCER_KEYWORDS: &[&str] = &["load balancer", "alb", "elb"];
const OBJECT_STORE_KEYWORDS: &[&str] = &["s3", "bucket", "object storage", "object store"];

pub const PARSED_NETWORK_ID: &str = "vpc-main";
pub const PARSED_COMPUTE_ID: &str = "ec2-web-1";
pub const PARSED_DATABASE_ID: &str = "rds-main";
pub const PARSED_LOAD_BALANCER_ID: &str = "lb-main";
pub const PARSED_OBJECT_STORE_ID: &str = "s3-main";

fn mentions(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// First token of the text that parses as a CIDR block
fn first_cidr(text: &str) -> Option<CidrBlock> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '/'))
        .filter(|token| token.contains('/'))
        .find_map(|token| CidrBlock::new(token.trim_matches('.')).ok())
}

fn instance_size(text: &str) -> InstanceSize {
    InstanceSize::all()
        .iter()
        .copied()
        .find(|size| text.contains(size.as_str()))
        .unwrap_or(if text.contains("t3") {
            InstanceSize::T3Small
        } else {
            InstanceSize::default()
        })
}

fn database_engine(text: &str) -> DatabaseEngine {
    if text.contains("mysql") {
        DatabaseEngine::Mysql
    } else if text.contains("mariadb") {
        DatabaseEngine::Mariadb
    } else {
        DatabaseEngine::Postgres
    }
}

fn subnet_cidr(network: &CidrBlock, c: u8) -> String {
    network
        .nth_slash24(c)
        .unwrap_or_else(|| CidrBlock::slash24(10, 0, c))
        .as_cidr()
}

/// Parse a description into a raw, unvalidated model
pub fn parse_text(text: &str) -> InfrastructureModel {
    if text.trim_start().starts_with('{') {
        match parse_intent(text) {
            Ok(model) => return model,
            Err(e) => warn!("Structured intent rejected, falling back to keywords: {}", e),
        }
    }

    let lower = text.to_lowercase();
    let mut model = InfrastructureModel::new();

    if mentions(&lower, INFRASTRUCTURE_KEYWORDS) {
        let block = first_cidr(&lower)
            .unwrap_or_else(|| CidrBlock::new("10.0.0.0/16").unwrap_or(CidrBlock::slash24(10, 0, 0)));
        let mut network = Network::new(PARSED_NETWORK_ID, "main-vpc", block.as_cidr());

        let mut needs_public = mentions(&lower, PUBLIC_KEYWORDS);
        let mut needs_private = mentions(&lower, PRIVATE_KEYWORDS);
        if !needs_public && !needs_private {
            needs_public = true;
            needs_private = true;
        }

        if needs_public {
            network.add_subnet(Subnet::new(
                "subnet-public-1",
                "public-subnet-1",
                subnet_cidr(&block, 1),
                SubnetVisibility::Public,
                "us-east-1a",
            ));
        }
        if needs_private {
            network.add_subnet(Subnet::new(
                "subnet-private-1",
                "private-subnet-1",
                subnet_cidr(&block, 2),
                SubnetVisibility::Private,
                "us-east-1a",
            ));
            network.add_subnet(Subnet::new(
                "subnet-private-2",
                "private-subnet-2",
                subnet_cidr(&block, 3),
                SubnetVisibility::Private,
                "us-east-1b",
            ));
        }
        model.add_network(network);
    }

    if mentions(&lower, COMPUTE_KEYWORDS) {
        let bastion = lower.contains("bastion") || lower.contains("jump");
        let public = lower.contains("public") && (lower.contains("ec2") || bastion);
        let subnet_id = if public { "subnet-public-1" } else { "subnet-private-1" };
        let name = if bastion { "bastion-host-1" } else { "web-server-1" };
        model.add_compute(ComputeInstance::new(
            PARSED_COMPUTE_ID,
            name,
            instance_size(&lower),
            subnet_id,
        ));
    }

    if mentions(&lower, DATABASE_KEYWORDS) {
        model.add_database(Database::new(
            PARSED_DATABASE_ID,
            "main-database",
            database_engine(&lower),
            vec!["subnet-private-1".into(), "subnet-private-2".into()],
        ));
    }

    if mentions(&lower, LOAD_BALANCER_KEYWORDS)
        || (lower.contains("web") && lower.contains("application"))
    {
        let targets = model
            .compute(PARSED_COMPUTE_ID)
            .map(|c| vec![c.id.clone()])
            .unwrap_or_default();
        model.add_load_balancer(LoadBalancer::new(
            PARSED_LOAD_BALANCER_ID,
            "main-load-balancer",
            vec!["subnet-public-1".into()],
            targets,
        ));
    }

    if mentions(&lower, OBJECT_STORE_KEYWORDS) {
        model.add_object_store(ObjectStore::new(PARSED_OBJECT_STORE_ID, "main-bucket"));
    }

    model.last_edit_source = EditSource::Text;
    model.last_edit_timestamp = Some(Utc::now());
    debug!("Parsed {} resources from text", model.resource_count());
    model
}

/// Deserialize a structured intent document
pub fn parse_intent(document: &str) -> InfrastructureResult<InfrastructureModel> {
    let mut model: InfrastructureModel = serde_json::from_str(document)
        .map_err(|e| InfrastructureError::InvalidIntent(e.to_string()))?;
    model.last_edit_source = EditSource::Text;
    model.last_edit_timestamp = Some(Utc::now());
    Ok(model)
}
