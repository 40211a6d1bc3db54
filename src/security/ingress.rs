// Copyright (c) 2025 - Cowboy AI, Inc.
//! Read-only interpretation of opaque ingress rule records.
//!
//! Security-group rules are stored exactly as the caller supplied them. This
//! view understands the common field spellings (`cidr_blocks`, `cidr_block`,
//! `cidr`, `source`, `ipv6_cidr_blocks`, `from_port`/`to_port`, `port`,
//! `protocol`) and ignores everything else.

use serde_json::Value;

use crate::model::FirewallRule;

/// Ports whose exposure to the internet is always a finding
pub const SENSITIVE_PORTS: [u16; 4] = [22, 3389, 5432, 3306];

const ANYWHERE: [&str; 4] = ["0.0.0.0/0", "::/0", "anywhere", "*"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressView {
    open_to_world: bool,
    all_ports: bool,
    from_port: u16,
    to_port: u16,
}

fn as_port(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn clamp_port(port: i64) -> u16 {
    port.clamp(0, i64::from(u16::MAX)) as u16
}

fn sources(rule: &FirewallRule) -> Vec<String> {
    let mut out = Vec::new();
    for key in ["cidr_blocks", "ipv6_cidr_blocks"] {
        if let Some(Value::Array(items)) = rule.get(key) {
            out.extend(items.iter().filter_map(Value::as_str).map(str::to_string));
        }
    }
    for key in ["cidr_block", "cidr", "source"] {
        if let Some(Value::String(s)) = rule.get(key) {
            out.push(s.clone());
        }
    }
    out
}

impl IngressView {
    pub fn from_rule(rule: &FirewallRule) -> Self {
        let open_to_world = sources(rule)
            .iter()
            .any(|s| ANYWHERE.contains(&s.trim().to_lowercase().as_str()));

        let protocol = rule
            .get("protocol")
            .map(|p| match p {
                Value::String(s) => s.trim().to_lowercase(),
                other => other.to_string(),
            })
            .unwrap_or_default();
        let protocol_all = matches!(protocol.as_str(), "-1" | "all");

        let single = rule.get("port").and_then(as_port);
        let from = rule.get("from_port").and_then(as_port).or(single);
        let to = rule.get("to_port").and_then(as_port).or(single).or(from);

        let (all_ports, from_port, to_port) = match (from, to) {
            _ if protocol_all => (true, 0, u16::MAX),
            (Some(f), Some(t)) => {
                let (f, t) = (clamp_port(f), clamp_port(t));
                (false, f.min(t), f.max(t))
            }
            // A rule that names no ports admits every port.
            _ => (true, 0, u16::MAX),
        };

        Self {
            open_to_world,
            all_ports,
            from_port,
            to_port,
        }
    }

    pub fn is_open_to_world(&self) -> bool {
        self.open_to_world
    }

    pub fn covers(&self, port: u16) -> bool {
        self.all_ports || (self.from_port..=self.to_port).contains(&port)
    }

    /// Sensitive ports reachable from anywhere through this rule
    pub fn exposed_sensitive_ports(&self) -> Vec<u16> {
        if !self.open_to_world {
            return Vec::new();
        }
        SENSITIVE_PORTS
            .iter()
            .copied()
            .filter(|p| self.covers(*p))
            .collect()
    }
}
