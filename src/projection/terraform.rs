// Copyright (c) 2025 - Cowboy AI, Inc.
//! Terraform Projection
//!
//! Renders the model as HCL for the AWS provider. Resources that map back to
//! a model entity carry two kinds of marker comment so that an edited copy of
//! the output can be diffed into edit operations (see
//! [`ingest::terraform`](crate::ingest::terraform)):
//!
//! ```text
//! # infra_id: ec2-web-1            <- the line before a resource header
//! resource "aws_instance" "ec2_web_1" {
//!   # editable: instance_type      <- the line before an editable attribute
//!   instance_type = "t3.small"
//! ```
//!
//! Terraform names are model ids with every character outside
//! `[A-Za-z0-9_]` replaced by `_` (see [`resource_name`]).

use serde_json::Value;

use super::Projection;
use crate::config::DEFAULT_REGION;
use crate::model::{
    FirewallRule, InfrastructureModel, NatGateway, Network, SubnetVisibility,
};

pub const INFRA_ID_MARKER: &str = "# infra_id:";
pub const EDITABLE_MARKER: &str = "# editable:";

/// Shared security group attached to every compute instance
const INSTANCE_SECURITY_GROUP: &str = "ec2_sg";

/// Terraform-safe local name for a model id
pub fn resource_name(id: &str) -> String {
    crate::model::local_name(id)
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn subnet_ref(subnet_id: &str) -> String {
    format!("aws_subnet.{}.id", resource_name(subnet_id))
}

fn subnet_refs(subnet_ids: &[String]) -> String {
    let refs: Vec<String> = subnet_ids.iter().map(|id| subnet_ref(id)).collect();
    format!("[{}]", refs.join(", "))
}

fn vpc_ref(network_id: &str) -> String {
    format!("aws_vpc.{}.id", resource_name(network_id))
}

/// HCL output buffer
#[derive(Default)]
struct Hcl {
    lines: Vec<String>,
}

impl Hcl {
    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn infra_id(&mut self, id: &str) {
        self.line(format!("{INFRA_ID_MARKER} {id}"));
    }

    fn editable(&mut self, property: &str) {
        self.line(format!("  {EDITABLE_MARKER} {property}"));
    }

    fn open(&mut self, kind: &str, name: &str) {
        self.line(format!("resource \"{kind}\" \"{name}\" {{"));
    }

    fn close(&mut self) {
        self.line("}");
        self.blank();
    }

    fn tags(&mut self, pairs: &[(&str, &str)]) {
        self.blank();
        self.line("  tags = {");
        for (key, value) in pairs {
            self.line(format!("    {key} = {}", quoted(value)));
        }
        self.line("  }");
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }
}

/// Model to HCL renderer
///
/// # Example
///
/// ```rust
/// use cim_infrastructure_compiler::model::*;
/// use cim_infrastructure_compiler::projection::{Projection, TerraformRenderer};
///
/// let mut model = InfrastructureModel::new();
/// model.add_network(Network::new("vpc-main", "main-vpc", "10.0.0.0/16"));
///
/// let hcl = TerraformRenderer::new("eu-west-1").project(&model);
/// assert!(hcl.contains("region = \"eu-west-1\""));
/// assert!(hcl.contains("resource \"aws_vpc\" \"vpc_main\""));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerraformRenderer {
    region: String,
}

impl TerraformRenderer {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn header(&self, out: &mut Hcl, model: &InfrastructureModel) {
        out.line("# Terraform Infrastructure as Code");
        out.line("# Generated from Infrastructure Model");
        out.line(format!("# Model ID: {}", model.model_id));
        out.line(format!("# Last Edit Source: {}", model.last_edit_source));
        out.line("#");
        out.line("# METADATA NOTES:");
        out.line("#   infra_id: <id>  - Maps resource to model (DO NOT MODIFY)");
        out.line("#   editable: <prop> - Safe to edit this property");
        out.blank();
        out.line("terraform {");
        out.line("  required_providers {");
        out.line("    aws = {");
        out.line("      source  = \"hashicorp/aws\"");
        out.line("      version = \"~> 5.0\"");
        out.line("    }");
        out.line("  }");
        out.line("}");
        out.blank();
        out.line("provider \"aws\" {");
        out.line(format!("  region = {}", quoted(&self.region)));
        out.line("}");
        out.blank();
    }
}

impl Default for TerraformRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl Projection for TerraformRenderer {
    type Output = String;

    fn project(&self, model: &InfrastructureModel) -> String {
        let mut out = Hcl::default();
        self.header(&mut out, model);

        for network in &model.networks {
            render_network(&mut out, network);
        }
        for nat in &model.nat_gateways {
            render_nat_gateway(&mut out, nat);
        }
        for network in &model.networks {
            render_private_routes(&mut out, model, network);
        }
        render_flow_logs(&mut out, model);
        render_security_groups(&mut out, model);
        render_compute(&mut out, model);
        render_databases(&mut out, model);
        render_object_stores(&mut out, model);
        render_load_balancers(&mut out, model);

        out.finish()
    }
}

fn render_network(out: &mut Hcl, network: &Network) {
    let vpc = resource_name(&network.id);

    out.infra_id(&network.id);
    out.open("aws_vpc", &vpc);
    out.line(format!("  cidr_block           = {}", quoted(&network.cidr)));
    out.line("  enable_dns_hostnames = true");
    out.line("  enable_dns_support   = true");
    out.tags(&[("Name", &network.name)]);
    out.close();

    let has_public = network.public_subnets().next().is_some();
    if has_public {
        out.line(format!("# Internet Gateway for {}", network.id));
        out.open("aws_internet_gateway", &format!("{vpc}_igw"));
        out.line(format!("  vpc_id = {}", vpc_ref(&network.id)));
        out.tags(&[("Name", &format!("{}-igw", network.name))]);
        out.close();
    }

    for subnet in &network.subnets {
        let name = resource_name(&subnet.id);
        out.infra_id(&subnet.id);
        out.open("aws_subnet", &name);
        out.line(format!("  vpc_id            = {}", vpc_ref(&network.id)));
        out.line(format!("  cidr_block        = {}", quoted(&subnet.cidr)));
        out.line(format!(
            "  availability_zone = {}",
            quoted(&subnet.availability_zone)
        ));
        if subnet.visibility == SubnetVisibility::Public {
            out.line("  map_public_ip_on_launch = true");
        }
        out.tags(&[("Name", &subnet.name), ("Type", subnet.visibility.as_str())]);
        out.close();

        if subnet.is_public() {
            out.line(format!("# Route Table for {}", subnet.id));
            out.open("aws_route_table", &format!("{name}_rt"));
            out.line(format!("  vpc_id = {}", vpc_ref(&network.id)));
            out.blank();
            out.line("  route {");
            out.line("    cidr_block = \"0.0.0.0/0\"");
            out.line(format!("    gateway_id = aws_internet_gateway.{vpc}_igw.id"));
            out.line("  }");
            out.tags(&[("Name", &format!("{}-rt", subnet.name))]);
            out.close();
            render_route_association(out, &name);
        }
    }
}

fn render_route_association(out: &mut Hcl, subnet_name: &str) {
    out.open("aws_route_table_association", &format!("{subnet_name}_rta"));
    out.line(format!("  subnet_id      = aws_subnet.{subnet_name}.id"));
    out.line(format!("  route_table_id = aws_route_table.{subnet_name}_rt.id"));
    out.close();
}

fn render_nat_gateway(out: &mut Hcl, nat: &NatGateway) {
    let name = resource_name(&nat.id);
    let allocation = match &nat.elastic_ip {
        Some(ip) => quoted(ip),
        None => {
            out.line(format!("# Elastic IP for NAT {}", nat.id));
            out.open("aws_eip", &format!("{name}_eip"));
            out.line("  domain = \"vpc\"");
            out.close();
            format!("aws_eip.{name}_eip.id")
        }
    };

    out.infra_id(&nat.id);
    out.open("aws_nat_gateway", &name);
    out.line(format!("  allocation_id = {allocation}"));
    out.line(format!("  subnet_id     = {}", subnet_ref(&nat.subnet_id)));
    out.tags(&[("Name", &nat.name)]);
    out.close();
}

/// Default routes for a network's private subnets through its first NAT
/// gateway that sits in one of its public subnets
fn render_private_routes(out: &mut Hcl, model: &InfrastructureModel, network: &Network) {
    let Some(nat) = model.nat_gateways.iter().find(|nat| {
        network
            .public_subnets()
            .any(|subnet| subnet.id == nat.subnet_id)
    }) else {
        return;
    };

    for subnet in network.private_subnets() {
        let name = resource_name(&subnet.id);
        out.line(format!("# Private route via NAT for {}", subnet.id));
        out.open("aws_route_table", &format!("{name}_rt"));
        out.line(format!("  vpc_id = {}", vpc_ref(&network.id)));
        out.blank();
        out.line("  route {");
        out.line("    cidr_block     = \"0.0.0.0/0\"");
        out.line(format!(
            "    nat_gateway_id = aws_nat_gateway.{}.id",
            resource_name(&nat.id)
        ));
        out.line("  }");
        out.tags(&[("Name", &format!("{}-rt", subnet.name))]);
        out.close();
        render_route_association(out, &name);
    }
}

fn render_flow_logs(out: &mut Hcl, model: &InfrastructureModel) {
    for flow_logs in &model.flow_logs {
        let log_group = flow_logs
            .log_group_name
            .clone()
            .unwrap_or_else(|| flow_logs.id.clone());
        out.infra_id(&flow_logs.id);
        out.open("aws_flow_log", &resource_name(&flow_logs.id));
        out.line(format!("  log_group_name       = {}", quoted(&log_group)));
        out.line(format!(
            "  traffic_type         = {}",
            quoted(flow_logs.traffic_type.as_str())
        ));
        out.line(format!("  vpc_id               = {}", vpc_ref(&flow_logs.network_id)));
        out.line(format!(
            "  log_destination_type = {}",
            quoted(flow_logs.log_destination_type.as_str())
        ));
        out.tags(&[("Name", &flow_logs.id)]);
        out.close();
    }
}

fn hcl_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => quoted(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => quoted(&other.to_string()),
    }
}

/// IPv4 and IPv6 sources of a rule, each in the order the caller listed them
fn rule_sources(rule: &FirewallRule) -> (Vec<String>, Vec<String>) {
    let mut ipv4 = Vec::new();
    let mut ipv6 = Vec::new();
    for (key, target) in [("cidr_blocks", &mut ipv4), ("ipv6_cidr_blocks", &mut ipv6)] {
        if let Some(Value::Array(items)) = rule.get(key) {
            target.extend(items.iter().map(hcl_scalar));
        }
    }
    for key in ["cidr_block", "cidr", "source"] {
        if let Some(value) = rule.get(key) {
            let is_v6 = value.as_str().is_some_and(|s| s.contains(':'));
            if is_v6 {
                ipv6.push(hcl_scalar(value));
            } else {
                ipv4.push(hcl_scalar(value));
            }
        }
    }
    (ipv4, ipv6)
}

fn render_rule(out: &mut Hcl, direction: &str, rule: &FirewallRule) {
    let port = rule.get("port");
    let from = rule.get("from_port").or(port);
    let to = rule.get("to_port").or(port).or(from);

    // Named ports without a protocol mean TCP; "-1" is only valid with 0/0.
    let protocol = match (rule.get("protocol"), from) {
        (Some(p), _) => hcl_scalar(p),
        (None, Some(_)) => quoted("tcp"),
        (None, None) => quoted("-1"),
    };
    let all_traffic = matches!(protocol.as_str(), "\"-1\"" | "\"all\"");
    let (from, to) = if all_traffic {
        ("0".to_string(), "0".to_string())
    } else {
        (
            from.map(hcl_scalar).unwrap_or_else(|| "0".into()),
            to.map(hcl_scalar).unwrap_or_else(|| "0".into()),
        )
    };
    let (ipv4, ipv6) = rule_sources(rule);

    out.blank();
    out.line(format!("  {direction} {{"));
    out.line(format!("    from_port   = {from}"));
    out.line(format!("    to_port     = {to}"));
    out.line(format!("    protocol    = {protocol}"));
    if !ipv4.is_empty() || ipv6.is_empty() {
        out.line(format!("    cidr_blocks = [{}]", ipv4.join(", ")));
    }
    if !ipv6.is_empty() {
        out.line(format!("    ipv6_cidr_blocks = [{}]", ipv6.join(", ")));
    }
    out.line("  }");
}

fn render_security_groups(out: &mut Hcl, model: &InfrastructureModel) {
    for group in &model.security_groups {
        out.infra_id(&group.id);
        out.open("aws_security_group", &resource_name(&group.id));
        out.line(format!("  name        = {}", quoted(&group.name)));
        out.line(format!("  description = {}", quoted(&group.description)));
        out.line(format!("  vpc_id      = {}", vpc_ref(&group.network_id)));
        for rule in &group.ingress_rules {
            render_rule(out, "ingress", rule);
        }
        for rule in &group.egress_rules {
            render_rule(out, "egress", rule);
        }
        out.tags(&[("Name", &group.name)]);
        out.close();
    }

    if model.compute_instances.is_empty() && model.databases.is_empty() {
        return;
    }

    out.line("# Security Group for EC2 instances");
    out.open("aws_security_group", INSTANCE_SECURITY_GROUP);
    out.line("  name        = \"ec2-security-group\"");
    out.line("  description = \"Security group for EC2 instances\"");
    if let Some(network) = model.primary_network() {
        out.line(format!("  vpc_id      = {}", vpc_ref(&network.id)));
    }
    for port in [80, 443] {
        out.blank();
        out.line("  ingress {");
        out.line(format!("    from_port   = {port}"));
        out.line(format!("    to_port     = {port}"));
        out.line("    protocol    = \"tcp\"");
        out.line("    cidr_blocks = [\"0.0.0.0/0\"]");
        out.line("  }");
    }
    out.blank();
    out.line("  egress {");
    out.line("    from_port   = 0");
    out.line("    to_port     = 0");
    out.line("    protocol    = \"-1\"");
    out.line("    cidr_blocks = [\"0.0.0.0/0\"]");
    out.line("  }");
    out.close();
}

fn render_compute(out: &mut Hcl, model: &InfrastructureModel) {
    for instance in &model.compute_instances {
        out.infra_id(&instance.id);
        out.open("aws_instance", &resource_name(&instance.id));
        out.line(format!("  ami           = {}", quoted(&instance.ami)));
        out.editable("instance_type");
        out.line(format!(
            "  instance_type = {}",
            quoted(instance.instance_type.as_str())
        ));
        out.editable("subnet_id");
        out.line(format!("  subnet_id     = {}", subnet_ref(&instance.subnet_id)));
        out.line(format!(
            "  vpc_security_group_ids = [aws_security_group.{INSTANCE_SECURITY_GROUP}.id]"
        ));
        out.tags(&[("Name", &instance.name)]);
        out.close();
    }
}

fn render_databases(out: &mut Hcl, model: &InfrastructureModel) {
    for database in &model.databases {
        let name = resource_name(&database.id);
        let group_name = format!("{}-subnet-group", database.name);

        out.line(format!("# DB Subnet Group for {}", database.id));
        out.open("aws_db_subnet_group", &format!("{name}_subnet_group"));
        out.line(format!("  name       = {}", quoted(&group_name)));
        out.line(format!("  subnet_ids = {}", subnet_refs(&database.subnet_ids)));
        out.tags(&[("Name", &group_name)]);
        out.close();

        out.infra_id(&database.id);
        out.open("aws_db_instance", &name);
        out.line(format!("  identifier           = {}", quoted(&database.name)));
        out.line(format!(
            "  engine               = {}",
            quoted(database.engine.as_str())
        ));
        out.editable("instance_class");
        out.line(format!(
            "  instance_class       = {}",
            quoted(&database.instance_class)
        ));
        out.editable("allocated_storage");
        out.line(format!("  allocated_storage    = {}", database.allocated_storage));
        out.line(format!("  storage_encrypted    = {}", database.storage_encrypted));
        out.line(format!(
            "  db_subnet_group_name = aws_db_subnet_group.{name}_subnet_group.name"
        ));
        out.line("  skip_final_snapshot  = true");
        out.blank();
        out.line("  # Credentials belong in a secrets manager");
        out.line("  username = \"admin\"");
        out.line("  manage_master_user_password = true");
        out.tags(&[("Name", &database.name)]);
        out.close();
    }
}

fn render_object_stores(out: &mut Hcl, model: &InfrastructureModel) {
    for bucket in &model.object_stores {
        let name = resource_name(&bucket.id);

        out.infra_id(&bucket.id);
        out.open("aws_s3_bucket", &name);
        out.line(format!("  bucket = {}", quoted(&bucket.name)));
        out.tags(&[("Name", &bucket.name)]);
        out.close();

        out.open("aws_s3_bucket_versioning", &format!("{name}_versioning"));
        out.line(format!("  bucket = aws_s3_bucket.{name}.id"));
        out.blank();
        out.line("  versioning_configuration {");
        out.line(format!(
            "    status = {}",
            quoted(if bucket.versioning_enabled { "Enabled" } else { "Suspended" })
        ));
        out.line("  }");
        out.close();

        if bucket.encryption_enabled {
            out.open(
                "aws_s3_bucket_server_side_encryption_configuration",
                &format!("{name}_encryption"),
            );
            out.line(format!("  bucket = aws_s3_bucket.{name}.id"));
            out.blank();
            out.line("  rule {");
            out.line("    apply_server_side_encryption_by_default {");
            out.line("      sse_algorithm = \"AES256\"");
            out.line("    }");
            out.line("  }");
            out.close();
        }
    }
}

fn render_load_balancers(out: &mut Hcl, model: &InfrastructureModel) {
    for lb in &model.load_balancers {
        let name = resource_name(&lb.id);

        out.infra_id(&lb.id);
        out.open("aws_lb", &name);
        out.line(format!("  name               = {}", quoted(&lb.name)));
        out.line("  internal           = false");
        out.line("  load_balancer_type = \"application\"");
        out.line(format!("  subnets            = {}", subnet_refs(&lb.subnet_ids)));
        out.tags(&[("Name", &lb.name)]);
        out.close();

        if lb.target_instance_ids.is_empty() {
            continue;
        }

        out.line(format!("# Target Group for {}", lb.id));
        out.open("aws_lb_target_group", &format!("{name}_tg"));
        out.line(format!("  name     = {}", quoted(&format!("{}-tg", lb.name))));
        out.line("  port     = 80");
        out.line("  protocol = \"HTTP\"");
        if let Some(network) = model.primary_network() {
            out.line(format!("  vpc_id   = {}", vpc_ref(&network.id)));
        }
        out.close();

        for target in &lb.target_instance_ids {
            let target_name = resource_name(target);
            out.open(
                "aws_lb_target_group_attachment",
                &format!("{name}_{target_name}"),
            );
            out.line(format!("  target_group_arn = aws_lb_target_group.{name}_tg.arn"));
            out.line(format!("  target_id        = aws_instance.{target_name}.id"));
            out.line("  port             = 80");
            out.close();
        }
    }
}
