// Copyright (c) 2025 - Cowboy AI, Inc.
//! Decision Intelligence Projection
//!
//! Explains the architecture rather than drawing it: one decision card per
//! recognisable choice in the model (why it was made, what risk it reduces,
//! what it costs), a rough monthly cost estimate and a complexity grade.
//! Entirely rule-based; the same model always yields the same report.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Projection;
use crate::model::{InfrastructureModel, InstanceSize};

const DATABASE_MONTHLY_COST: f64 = 50.0;
const LOAD_BALANCER_MONTHLY_COST: f64 = 18.0;
const NAT_GATEWAY_MONTHLY_COST: f64 = 32.0;
const FLOW_LOGS_MONTHLY_COST: f64 = 7.0;
const BUCKET_MONTHLY_COST: f64 = 5.0;

/// US East on-demand estimate per instance size
fn instance_monthly_cost(size: InstanceSize) -> f64 {
    match size {
        InstanceSize::T2Micro => 8.50,
        InstanceSize::T2Small => 17.00,
        InstanceSize::T2Medium => 34.00,
        InstanceSize::T3Micro => 7.50,
        InstanceSize::T3Small => 15.00,
        InstanceSize::T3Medium => 30.00,
        InstanceSize::T3Large => 60.00,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Grade by count of networks, workloads, buckets and NAT gateways
    pub fn of(model: &InfrastructureModel) -> Self {
        let count = model.networks.len()
            + model.compute_instances.len()
            + model.databases.len()
            + model.load_balancers.len()
            + model.object_stores.len()
            + model.nat_gateways.len();
        match count {
            0..=3 => Self::Simple,
            4..=8 => Self::Moderate,
            _ => Self::Complex,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Simple => "Simple",
            Self::Moderate => "Moderate",
            Self::Complex => "Complex",
        };
        f.write_str(text)
    }
}

/// One architectural decision and its rationale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionCard {
    pub id: String,
    pub title: String,
    pub why: String,
    pub risk_reduced: String,
    pub risk_level: RiskLevel,
    pub tradeoff: String,
    pub cost_impact: String,
    pub confidence: String,
}

impl DecisionCard {
    #[allow(clippy::too_many_arguments)]
    fn new(
        id: &str,
        title: impl Into<String>,
        why: &str,
        risk_reduced: &str,
        risk_level: RiskLevel,
        tradeoff: &str,
        cost_impact: impl Into<String>,
        confidence: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.into(),
            why: why.to_string(),
            risk_reduced: risk_reduced.to_string(),
            risk_level,
            tradeoff: tradeoff.to_string(),
            cost_impact: cost_impact.into(),
            confidence: confidence.to_string(),
        }
    }
}

/// Decision cards, cost estimate and complexity grade for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionReport {
    pub decisions: Vec<DecisionCard>,
    pub monthly_cost: f64,
    pub total_monthly_cost_estimate: String,
    pub cost_breakdown: Vec<String>,
    pub architecture_complexity: Complexity,
}

impl DecisionReport {
    pub fn decision(&self, id: &str) -> Option<&DecisionCard> {
        self.decisions.iter().find(|d| d.id == id)
    }
}

/// Model to [`DecisionReport`] analyzer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionAnalyzer;

impl Projection for DecisionAnalyzer {
    type Output = DecisionReport;

    fn project(&self, model: &InfrastructureModel) -> DecisionReport {
        let decisions = detect_decisions(model);
        let (monthly_cost, cost_breakdown) = estimate_monthly_cost(model);
        debug!("Generated {} decision cards", decisions.len());

        DecisionReport {
            decisions,
            monthly_cost,
            total_monthly_cost_estimate: format!("${monthly_cost:.2}/month"),
            cost_breakdown,
            architecture_complexity: Complexity::of(model),
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}

fn detect_decisions(model: &InfrastructureModel) -> Vec<DecisionCard> {
    let is_private = |subnet_id: &str| model.subnet(subnet_id).is_some_and(|s| !s.is_public());
    let mut cards = Vec::new();

    if model.compute_instances.iter().any(|c| is_private(&c.subnet_id)) {
        cards.push(DecisionCard::new(
            "private-subnet-ec2",
            "EC2 Instances in Private Subnet",
            "Reduces public attack surface by isolating compute resources from direct internet access. Only the load balancer is exposed publicly.",
            "Prevents direct exploitation of application vulnerabilities and unauthorized access to compute instances",
            RiskLevel::High,
            "Requires NAT Gateway for outbound internet access (updates, external APIs)",
            "+$32/month (NAT Gateway)",
            "High (industry best practice)",
        ));
    }

    let lb_count = model.load_balancers.len();
    if lb_count > 0 {
        cards.push(DecisionCard::new(
            "load-balancer",
            format!("Application Load Balancer{} Added", plural(lb_count)),
            "Enables horizontal scalability, fault tolerance, SSL termination, and distributes traffic across multiple instances",
            "Improves availability and prevents single point of failure",
            RiskLevel::Medium,
            "Increased complexity and additional component to manage",
            format!("+${}/month (ALB base cost)", lb_count * 18),
            "High",
        ));
    }

    if model
        .databases
        .iter()
        .any(|db| !db.subnet_ids.is_empty() && db.subnet_ids.iter().all(|s| is_private(s)))
    {
        cards.push(DecisionCard::new(
            "database-isolation",
            "Database in Isolated Private Subnet",
            "Prevents direct database access from the internet. Only application servers within the VPC can connect.",
            "Eliminates risk of unauthorized database connections and data breaches",
            RiskLevel::High,
            "Requires application servers in VPC to access database (cannot connect from local machine without VPN)",
            "$0 (no additional cost)",
            "High (security requirement)",
        ));
    }

    let spans_zones = model.databases.iter().any(|db| {
        db.subnet_ids
            .iter()
            .filter_map(|id| model.subnet(id))
            .map(|s| s.availability_zone.as_str())
            .collect::<HashSet<_>>()
            .len()
            >= 2
    });
    if spans_zones {
        cards.push(DecisionCard::new(
            "database-subnet-group-az",
            "Database Subnet Group Across Availability Zones",
            "A subnet group spanning two availability zones lets the database fail over or be promoted to Multi-AZ without re-addressing",
            "Removes the single-zone dependency of the database network",
            RiskLevel::Medium,
            "Requires a second private subnet that is otherwise lightly used",
            "$0 (subnets are free)",
            "High",
        ));
    }

    let nat_count = model.nat_gateways.len();
    if nat_count > 0 {
        cards.push(DecisionCard::new(
            "nat-gateway",
            format!("NAT Gateway{} for Outbound Access", plural(nat_count)),
            "Allows private subnet resources to access internet for updates, patches, and external API calls while remaining private",
            "Maintains security posture while enabling necessary outbound connectivity",
            RiskLevel::Low,
            "Additional monthly cost and potential single point of failure for outbound traffic",
            format!("+${}/month per NAT Gateway", nat_count * 32),
            "High",
        ));
    }

    if !model.flow_logs.is_empty() {
        cards.push(DecisionCard::new(
            "flow-logs",
            "VPC Flow Logs Enabled",
            "Captures network traffic metadata for security analysis, troubleshooting, and compliance auditing",
            "Enables detection of anomalous traffic patterns and security incidents",
            RiskLevel::Low,
            "Additional storage costs for log data and requires log analysis tools",
            "+$5-10/month (varies by traffic volume)",
            "Medium",
        ));
    }

    if model.databases.iter().any(|db| db.storage_encrypted) {
        cards.push(DecisionCard::new(
            "database-encryption",
            "Database Encryption at Rest",
            "Protects sensitive data from unauthorized access to underlying storage volumes",
            "Compliance with data protection regulations (GDPR, HIPAA, PCI-DSS)",
            RiskLevel::High,
            "Minimal performance impact, cannot disable encryption after database creation",
            "$0 (included in RDS)",
            "High",
        ));
    }

    if let Some(network) = model.primary_network() {
        cards.push(DecisionCard::new(
            "vpc-isolation",
            "Dedicated VPC for Network Isolation",
            "Creates isolated network environment with full control over IP addressing, routing, and security",
            "Prevents resource exposure to shared infrastructure",
            RiskLevel::Medium,
            "Requires network configuration and subnet planning",
            "$0 (VPC is free)",
            "High",
        ));

        let has_public = network.public_subnets().next().is_some();
        let has_private = network.private_subnets().next().is_some();
        if has_public && has_private {
            cards.push(DecisionCard::new(
                "subnet-segmentation",
                "Public and Private Subnet Segmentation",
                "Separates internet-facing resources from internal resources for defense in depth",
                "Limits blast radius of security incidents",
                RiskLevel::High,
                "Increased network complexity and routing configuration",
                "$0 (subnets are free)",
                "High",
            ));
        }
    }

    cards
}

/// Total and per-line breakdown, in USD per month
fn estimate_monthly_cost(model: &InfrastructureModel) -> (f64, Vec<String>) {
    let mut total = 0.0;
    let mut breakdown = Vec::new();

    for instance in &model.compute_instances {
        let cost = instance_monthly_cost(instance.instance_type);
        total += cost;
        breakdown.push(format!("EC2 {}: ${cost:.2}", instance.instance_type));
    }

    for database in &model.databases {
        total += DATABASE_MONTHLY_COST;
        breakdown.push(format!("RDS {}: ${DATABASE_MONTHLY_COST:.2}", database.engine));
    }

    let lbs = model.load_balancers.len();
    if lbs > 0 {
        let cost = lbs as f64 * LOAD_BALANCER_MONTHLY_COST;
        total += cost;
        breakdown.push(format!("ALB ({lbs}): ${cost:.2}"));
    }

    let nats = model.nat_gateways.len();
    if nats > 0 {
        let cost = nats as f64 * NAT_GATEWAY_MONTHLY_COST;
        total += cost;
        breakdown.push(format!("NAT Gateway ({nats}): ${cost:.2}"));
    }

    if !model.flow_logs.is_empty() {
        total += FLOW_LOGS_MONTHLY_COST;
        breakdown.push(format!("VPC Flow Logs: ${FLOW_LOGS_MONTHLY_COST:.2}"));
    }

    let buckets = model.object_stores.len();
    if buckets > 0 {
        let cost = buckets as f64 * BUCKET_MONTHLY_COST;
        total += cost;
        breakdown.push(format!("S3 Storage ({buckets} buckets): ${cost:.2}"));
    }

    (total, breakdown)
}
