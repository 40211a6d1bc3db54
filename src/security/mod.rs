// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security Rule Engine
//!
//! A fixed, ordered list of hand-written rules scanned over the model. The
//! scan is stateless, deterministic and total: every rule inspects the whole
//! model independently and the complete warning list is always returned, even
//! when some of those warnings will later gate an edit.
//!
//! | Order | Rule | Severity |
//! |---|---|---|
//! | 1 | Database reachable from a public subnet | HIGH |
//! | 2 | Load balancer with no targets | MEDIUM |
//! | 3 | Non-bastion compute in a public subnet | MEDIUM |
//! | 4 | Unencrypted object store | MEDIUM |
//! | 5 | Database without storage encryption | HIGH |
//! | 6 | Ingress open to the world on 22/3389/5432/3306 | HIGH |
//!
//! The validator also moves public databases into private subnets. That
//! overlap is intentional: the validator repairs structure, this engine
//! reports, and only this engine gates edits.

pub mod ingress;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

use crate::model::{InfrastructureModel, SubnetVisibility};
use ingress::IngressView;

/// Warning severity; ordered LOW < MEDIUM < HIGH
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule produced a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityRule {
    PublicDatabase,
    LoadBalancerWithoutTargets,
    PublicCompute,
    UnencryptedObjectStore,
    UnencryptedDatabase,
    OpenSensitiveIngress,
}

impl SecurityRule {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PublicDatabase => "public-database",
            Self::LoadBalancerWithoutTargets => "empty-load-balancer",
            Self::PublicCompute => "public-compute",
            Self::UnencryptedObjectStore => "unencrypted-bucket",
            Self::UnencryptedDatabase => "unencrypted-database",
            Self::OpenSensitiveIngress => "open-sensitive-port",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::PublicDatabase | Self::UnencryptedDatabase | Self::OpenSensitiveIngress => {
                Severity::High
            }
            Self::LoadBalancerWithoutTargets
            | Self::PublicCompute
            | Self::UnencryptedObjectStore => Severity::Medium,
        }
    }
}

/// A security advisory about one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityWarning {
    /// Stable identifier: `<rule-code>:<resource-id>[:<detail>]`
    pub id: String,
    pub rule: SecurityRule,
    pub resource_id: String,
    pub message: String,
    pub severity: Severity,
}

impl SecurityWarning {
    fn new(rule: SecurityRule, resource_id: &str, message: String) -> Self {
        Self {
            id: format!("{}:{}", rule.code(), resource_id),
            rule,
            resource_id: resource_id.to_string(),
            message,
            severity: rule.severity(),
        }
    }

    fn with_detail(mut self, detail: impl fmt::Display) -> Self {
        self.id = format!("{}:{}", self.id, detail);
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::High
    }
}

/// Run every rule, in order, over the model
pub fn scan(model: &InfrastructureModel) -> Vec<SecurityWarning> {
    let mut warnings = Vec::new();
    check_public_databases(model, &mut warnings);
    check_load_balancer_targets(model, &mut warnings);
    check_public_compute(model, &mut warnings);
    check_object_store_encryption(model, &mut warnings);
    check_database_encryption(model, &mut warnings);
    check_open_ingress(model, &mut warnings);
    warnings
}

fn check_public_databases(model: &InfrastructureModel, out: &mut Vec<SecurityWarning>) {
    for db in &model.databases {
        let public = db
            .subnet_ids
            .iter()
            .find(|sid| model.subnet_visibility(sid) == Some(SubnetVisibility::Public));
        if let Some(subnet_id) = public {
            out.push(SecurityWarning::new(
                SecurityRule::PublicDatabase,
                &db.id,
                format!(
                    "Database '{}' is placed in public subnet '{}' and is exposed to the internet",
                    db.name, subnet_id
                ),
            ));
        }
    }
}

fn check_load_balancer_targets(model: &InfrastructureModel, out: &mut Vec<SecurityWarning>) {
    for lb in model.load_balancers.iter().filter(|lb| lb.target_instance_ids.is_empty()) {
        out.push(SecurityWarning::new(
            SecurityRule::LoadBalancerWithoutTargets,
            &lb.id,
            format!(
                "Load balancer '{}' has no targets; it accepts traffic it cannot serve",
                lb.name
            ),
        ));
    }
}

fn check_public_compute(model: &InfrastructureModel, out: &mut Vec<SecurityWarning>) {
    for instance in &model.compute_instances {
        let public = model.subnet_visibility(&instance.subnet_id) == Some(SubnetVisibility::Public);
        if public && !instance.is_bastion() {
            out.push(SecurityWarning::new(
                SecurityRule::PublicCompute,
                &instance.id,
                format!(
                    "EC2 instance '{}' is in public subnet '{}' but is not a bastion or jump host",
                    instance.name, instance.subnet_id
                ),
            ));
        }
    }
}

fn check_object_store_encryption(model: &InfrastructureModel, out: &mut Vec<SecurityWarning>) {
    for bucket in model.object_stores.iter().filter(|b| !b.encryption_enabled) {
        out.push(SecurityWarning::new(
            SecurityRule::UnencryptedObjectStore,
            &bucket.id,
            format!("S3 bucket '{}' does not have encryption enabled", bucket.name),
        ));
    }
}

fn check_database_encryption(model: &InfrastructureModel, out: &mut Vec<SecurityWarning>) {
    for db in model.databases.iter().filter(|db| !db.storage_encrypted) {
        out.push(SecurityWarning::new(
            SecurityRule::UnencryptedDatabase,
            &db.id,
            format!("Database '{}' does not encrypt its storage at rest", db.name),
        ));
    }
}

fn check_open_ingress(model: &InfrastructureModel, out: &mut Vec<SecurityWarning>) {
    for sg in &model.security_groups {
        for (index, rule) in sg.ingress_rules.iter().enumerate() {
            let ports = IngressView::from_rule(rule).exposed_sensitive_ports();
            if ports.is_empty() {
                continue;
            }
            let listed = ports
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            out.push(
                SecurityWarning::new(
                    SecurityRule::OpenSensitiveIngress,
                    &sg.id,
                    format!(
                        "Security group '{}' allows traffic from anywhere on sensitive port(s) {}",
                        sg.name, listed
                    ),
                )
                .with_detail(index),
            );
        }
    }
}

/// Highest severity present, `None` for a clean scan
pub fn highest_severity(warnings: &[SecurityWarning]) -> Option<Severity> {
    warnings.iter().map(|w| w.severity).max()
}

/// First HIGH warning, if any; this is what gates edits
pub fn first_blocking(warnings: &[SecurityWarning]) -> Option<&SecurityWarning> {
    warnings.iter().find(|w| w.is_blocking())
}

/// Plain-text security report, grouped by severity (HIGH first)
pub fn render_report(warnings: &[SecurityWarning]) -> String {
    if warnings.is_empty() {
        return "Security Report\n===============\nNo security issues detected.\n".to_string();
    }

    let count = |severity: Severity| warnings.iter().filter(|w| w.severity == severity).count();
    let mut report = String::from("Security Report\n===============\n");
    let _ = writeln!(
        report,
        "Summary: {} HIGH, {} MEDIUM, {} LOW",
        count(Severity::High),
        count(Severity::Medium),
        count(Severity::Low)
    );

    for severity in [Severity::High, Severity::Medium, Severity::Low] {
        let group: Vec<_> = warnings.iter().filter(|w| w.severity == severity).collect();
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(report, "\n{severity}:");
        for warning in group {
            let _ = writeln!(report, "  - [{}] {}", warning.id, warning.message);
        }
    }
    report
}
