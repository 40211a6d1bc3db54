// Copyright (c) 2025 - Cowboy AI, Inc.
//! Mermaid Diagram Projection
//!
//! Draws the network as nested subgraphs (VPC, then public subnets before
//! private ones) with resources inside the subnet that hosts them, object
//! stores outside every VPC, and directional flows:
//!
//! ```text
//! Internet ===> Internet Gateway ===> Load Balancer --> Compute -.-> Database
//!                                                          └─-.-> Object Store
//! ```

use super::Projection;
use crate::model::{InfrastructureModel, Network, Subnet};

const PUBLIC_SUBNET_STYLE: &str = "fill:#d4edda,stroke:#28a745,stroke-width:2px";
const PRIVATE_SUBNET_STYLE: &str = "fill:#f8d7da,stroke:#dc3545,stroke-width:2px";
const VPC_STYLE: &str = "fill:#d1ecf1,stroke:#0c5460,stroke-width:3px";
const GATEWAY_STYLE: &str = "fill:#c8e6c9,stroke:#388e3c,stroke-width:2px";
const BUCKET_STYLE: &str = "fill:#fff3cd,stroke:#856404,stroke-width:2px";

/// Mermaid node id for a model id
fn node(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn label(parts: &[&str]) -> String {
    let escaped: Vec<String> = parts.iter().map(|p| p.replace('"', "#quot;")).collect();
    format!("[\"{}\"]", escaped.join("<br/>"))
}

fn gateway_node(network: &Network) -> String {
    format!("igw_{}", node(&network.id))
}

/// Model to Mermaid `graph TB` renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MermaidDiagram;

impl Projection for MermaidDiagram {
    type Output = String;

    fn project(&self, model: &InfrastructureModel) -> String {
        let mut lines = vec![
            "graph TB".to_string(),
            "    %% Cloud infrastructure diagram".to_string(),
            String::new(),
            "    Internet([\"Internet\"])".to_string(),
            "    style Internet fill:#e3f2fd,stroke:#1976d2,stroke-width:3px".to_string(),
            String::new(),
        ];

        for network in &model.networks {
            render_network(&mut lines, model, network);
        }

        if !model.object_stores.is_empty() {
            lines.push("    %% Object stores (regional service, outside the VPC)".into());
            for bucket in &model.object_stores {
                let id = node(&bucket.id);
                let encryption = if bucket.encryption_enabled {
                    "Encrypted"
                } else {
                    "UNENCRYPTED"
                };
                let versioning = if bucket.versioning_enabled {
                    "Versioned"
                } else {
                    "No Versioning"
                };
                lines.push(format!(
                    "    {id}{}",
                    label(&["S3 Bucket", &bucket.name, &format!("ID: {}", bucket.id), encryption, versioning])
                ));
                lines.push(format!("    style {id} {BUCKET_STYLE}"));
            }
            lines.push(String::new());
        }

        render_flows(&mut lines, model);

        lines.push(String::new());
        lines.push("    %% Legend".into());
        lines.push("    classDef publicSubnet fill:#d4edda,stroke:#28a745".into());
        lines.push("    classDef privateSubnet fill:#f8d7da,stroke:#dc3545".into());
        lines.push("    classDef vpc fill:#d1ecf1,stroke:#0c5460".into());
        lines.join("\n")
    }
}

fn render_network(lines: &mut Vec<String>, model: &InfrastructureModel, network: &Network) {
    let vpc = node(&network.id);
    let igw = gateway_node(network);

    lines.push(format!(
        "    subgraph {vpc}{}",
        label(&[&format!("VPC: {}", network.name), &network.cidr])
    ));
    lines.push("        direction TB".into());
    lines.push(String::new());
    lines.push(format!("        {igw}[\"Internet Gateway\"]"));
    lines.push(format!("        style {igw} {GATEWAY_STYLE}"));
    lines.push(String::new());

    for subnet in network.public_subnets() {
        render_subnet(lines, model, subnet, "PUBLIC SUBNET", PUBLIC_SUBNET_STYLE);
    }
    for subnet in network.private_subnets() {
        render_subnet(lines, model, subnet, "PRIVATE SUBNET", PRIVATE_SUBNET_STYLE);
    }

    lines.push("    end".into());
    lines.push(format!("    style {vpc} {VPC_STYLE}"));
    lines.push(String::new());
}

fn render_subnet(
    lines: &mut Vec<String>,
    model: &InfrastructureModel,
    subnet: &Subnet,
    heading: &str,
    style: &str,
) {
    let id = node(&subnet.id);
    lines.push(format!(
        "        subgraph {id}{}",
        label(&[
            heading,
            &subnet.name,
            &subnet.cidr,
            &format!("AZ: {}", subnet.availability_zone),
        ])
    ));
    lines.push("            direction TB".into());

    let exposure = if subnet.is_public() { "PUBLIC" } else { "PRIVATE" };

    for lb in model
        .load_balancers
        .iter()
        .filter(|lb| lb.subnet_ids.first() == Some(&subnet.id))
    {
        lines.push(format!(
            "            {}{}",
            node(&lb.id),
            label(&["Load Balancer", &lb.name, &format!("ID: {}", lb.id), "Application LB"])
        ));
    }
    for instance in model
        .compute_instances
        .iter()
        .filter(|c| c.subnet_id == subnet.id)
    {
        lines.push(format!(
            "            {}{}",
            node(&instance.id),
            label(&[
                "EC2 Instance",
                &instance.name,
                &format!("ID: {}", instance.id),
                instance.instance_type.as_str(),
                exposure,
            ])
        ));
    }
    // A database is drawn once, in its primary subnet.
    for database in model
        .databases
        .iter()
        .filter(|db| db.subnet_ids.first() == Some(&subnet.id))
    {
        lines.push(format!(
            "            {}{}",
            node(&database.id),
            label(&[
                "RDS Database",
                &database.name,
                &format!("ID: {}", database.id),
                database.engine.as_str(),
                &database.instance_class,
                exposure,
            ])
        ));
    }

    lines.push("        end".into());
    lines.push(format!("        style {id} {style}"));
    lines.push(String::new());
}

fn render_flows(lines: &mut Vec<String>, model: &InfrastructureModel) {
    lines.push("    %% Network flow".into());

    let Some(network) = model.primary_network() else {
        return;
    };
    let igw = gateway_node(network);
    lines.push(format!("    Internet ===> {igw}"));

    for lb in &model.load_balancers {
        lines.push(format!("    {igw} ===> {}", node(&lb.id)));
    }
    for lb in &model.load_balancers {
        for target in &lb.target_instance_ids {
            lines.push(format!("    {} --> {}", node(&lb.id), node(target)));
        }
    }
    for instance in &model.compute_instances {
        if model.subnet(&instance.subnet_id).is_some_and(|s| !s.is_public()) {
            for database in &model.databases {
                lines.push(format!(
                    "    {} -.->|Database Query| {}",
                    node(&instance.id),
                    node(&database.id)
                ));
            }
        }
        for bucket in &model.object_stores {
            lines.push(format!(
                "    {} -.->|S3 API| {}",
                node(&instance.id),
                node(&bucket.id)
            ));
        }
    }
}

fn counted(count: usize, noun: &str) -> Option<String> {
    (count > 0).then(|| format!("{count} {noun}(s)"))
}

/// One-line human-readable summary of the model
///
/// ```rust
/// use cim_infrastructure_compiler::model::*;
/// use cim_infrastructure_compiler::projection::describe;
///
/// let mut model = InfrastructureModel::new();
/// model.add_network(Network::new("vpc-main", "main-vpc", "10.0.0.0/16"));
/// model.add_object_store(ObjectStore::new("s3-main", "logs"));
/// assert_eq!(
///     describe(&model),
///     "VPC 'main-vpc' (10.0.0.0/16) with 0 subnet(s), 1 S3 bucket(s)"
/// );
/// ```
pub fn describe(model: &InfrastructureModel) -> String {
    let mut parts: Vec<String> = model
        .networks
        .iter()
        .map(|n| format!("VPC '{}' ({}) with {} subnet(s)", n.name, n.cidr, n.subnets.len()))
        .collect();
    parts.extend(
        [
            counted(model.compute_instances.len(), "EC2 instance"),
            counted(model.databases.len(), "RDS database"),
            counted(model.load_balancers.len(), "load balancer"),
            counted(model.object_stores.len(), "S3 bucket"),
        ]
        .into_iter()
        .flatten(),
    );

    if parts.is_empty() {
        "Empty infrastructure".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ComputeInstance, Database, DatabaseEngine, InstanceSize, LoadBalancer, ObjectStore,
        SubnetVisibility,
    };

    fn three_tier() -> InfrastructureModel {
        let mut model = InfrastructureModel::new();
        model.add_network(
            Network::new("vpc-main", "main-vpc", "10.0.0.0/16")
                .with_subnet(Subnet::new(
                    "subnet-public-1",
                    "public-subnet-1",
                    "10.0.1.0/24",
                    SubnetVisibility::Public,
                    "us-east-1a",
                ))
                .with_subnet(Subnet::new(
                    "subnet-private-1",
                    "private-subnet-1",
                    "10.0.2.0/24",
                    SubnetVisibility::Private,
                    "us-east-1a",
                )),
        );
        model.add_compute(ComputeInstance::new(
            "ec2-web-1",
            "web",
            InstanceSize::T2Micro,
            "subnet-private-1",
        ));
        model.add_database(Database::new(
            "rds-main",
            "db",
            DatabaseEngine::Postgres,
            vec!["subnet-private-1".into()],
        ));
        model.add_load_balancer(LoadBalancer::new(
            "lb-main",
            "lb",
            vec!["subnet-public-1".into()],
            vec!["ec2-web-1".into()],
        ));
        model
    }

    #[test]
    fn test_public_subnets_drawn_first() {
        let diagram = MermaidDiagram.project(&three_tier());
        let public = diagram.find("subgraph subnet_public_1").unwrap();
        let private = diagram.find("subgraph subnet_private_1").unwrap();
        assert!(public < private);
    }

    #[test]
    fn test_flows() {
        let diagram = MermaidDiagram.project(&three_tier());
        assert!(diagram.contains("Internet ===> igw_vpc_main"));
        assert!(diagram.contains("igw_vpc_main ===> lb_main"));
        assert!(diagram.contains("lb_main --> ec2_web_1"));
        assert!(diagram.contains("ec2_web_1 -.->|Database Query| rds_main"));
    }

    #[test]
    fn test_bucket_outside_vpc() {
        let mut model = InfrastructureModel::new();
        let mut bucket = ObjectStore::new("s3-main", "say \"hi\"");
        bucket.encryption_enabled = false;
        model.add_object_store(bucket);

        let diagram = MermaidDiagram.project(&model);
        assert!(diagram.contains("UNENCRYPTED"));
        assert!(diagram.contains("#quot;hi#quot;"));
        assert!(!diagram.contains("Internet ==="));
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&InfrastructureModel::new()), "Empty infrastructure");
        assert_eq!(
            describe(&three_tier()),
            "VPC 'main-vpc' (10.0.0.0/16) with 2 subnet(s), 1 EC2 instance(s), \
             1 RDS database(s), 1 load balancer(s)"
        );
    }
}
