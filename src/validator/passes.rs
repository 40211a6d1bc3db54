// Copyright (c) 2025 - Cowboy AI, Inc.
//! The five correction passes, in execution order.
//!
//! Every pass mutates the model in place and appends one correction per
//! rewrite. A pass that finds nothing to fix touches nothing, which is what
//! makes the whole validator idempotent.

use std::collections::HashSet;

use tracing::warn;

use super::{
    ValidationReport, AUTO_NAT_NAME, AVAILABILITY_ZONES, DEFAULT_NETWORK_CIDR,
    DEFAULT_NETWORK_ID, DEFAULT_NETWORK_NAME,
};
use crate::model::{
    CidrBlock, FlowLogs, InfrastructureModel, NatGateway, Network, Subnet, SubnetVisibility,
};

/// Subnet ids of the primary network, split by visibility
struct SubnetLayout {
    network_id: String,
    all: HashSet<String>,
    public: Vec<String>,
    private: Vec<String>,
}

impl SubnetLayout {
    fn of(model: &InfrastructureModel) -> Option<Self> {
        let network = model.primary_network()?;
        Some(Self {
            network_id: network.id.clone(),
            all: network.subnets.iter().map(|s| s.id.clone()).collect(),
            public: network.public_subnets().map(|s| s.id.clone()).collect(),
            private: network.private_subnets().map(|s| s.id.clone()).collect(),
        })
    }

    fn is_public(&self, subnet_id: &str) -> bool {
        self.public.iter().any(|id| id == subnet_id)
    }

    fn is_private(&self, subnet_id: &str) -> bool {
        self.private.iter().any(|id| id == subnet_id)
    }

    fn resolves(&self, subnet_id: &str) -> bool {
        self.all.contains(subnet_id)
    }

    /// The first two private subnets: the multi-AZ database placement
    fn private_pair(&self) -> Vec<String> {
        self.private.iter().take(2).cloned().collect()
    }
}

// ============================================================================
// Pass 1
// ============================================================================

pub(super) fn enforce_single_network(model: &mut InfrastructureModel, report: &mut ValidationReport) {
    if model.networks.is_empty() {
        warn!("No network found, creating default network");
        let id = unique_id(model, DEFAULT_NETWORK_ID.to_string());
        model.add_network(Network::new(id, DEFAULT_NETWORK_NAME, DEFAULT_NETWORK_CIDR));
        report.correct(format!(
            "Created default VPC ({DEFAULT_NETWORK_CIDR}) - all AWS resources must be in a VPC"
        ));
        return;
    }

    if model.networks.len() > 1 {
        warn!("Found {} networks, merging into one", model.networks.len());
        let absorbed: Vec<Network> = model.networks.drain(1..).collect();
        let primary = &mut model.networks[0];
        let primary_id = primary.id.clone();
        let mut absorbed_ids = Vec::with_capacity(absorbed.len());
        for Network { id, subnets, .. } in absorbed {
            absorbed_ids.push(id);
            primary.subnets.extend(subnets);
        }

        for sg in &mut model.security_groups {
            if absorbed_ids.contains(&sg.network_id) {
                sg.network_id = primary_id.clone();
            }
        }
        for flow_log in &mut model.flow_logs {
            if absorbed_ids.contains(&flow_log.network_id) {
                flow_log.network_id = primary_id.clone();
            }
        }
        report.correct(
            "Merged multiple VPCs into one - AWS best practice is single VPC per environment",
        );
    }

    let primary = &mut model.networks[0];
    let before = primary.subnets.len();
    let mut seen = HashSet::new();
    primary.subnets.retain(|s| seen.insert(s.id.clone()));
    let dropped = before - primary.subnets.len();
    if dropped > 0 {
        report.correct(format!(
            "Removed {dropped} duplicate subnet(s) from VPC '{}' - subnet ids must be unique",
            primary.name
        ));
    }
}

// ============================================================================
// Pass 2
// ============================================================================

pub(super) fn enforce_required_subnets(model: &mut InfrastructureModel, report: &mut ValidationReport) {
    let Some(network) = model.primary_network() else {
        return;
    };
    let has_public = network.public_subnets().next().is_some();
    let private_count = network.private_subnets().count();

    if !has_public {
        warn!("No public subnet found, creating one");
        let subnet = synthesize_subnet(model, SubnetVisibility::Public, 1, AVAILABILITY_ZONES[0]);
        let cidr = subnet.cidr.clone();
        push_subnet(model, subnet);
        report.correct(format!(
            "Created public subnet ({cidr}) - required for internet-facing resources"
        ));
    }

    match private_count {
        0 => {
            warn!("No private subnets found, creating two (multi-AZ)");
            let first = synthesize_subnet(model, SubnetVisibility::Private, 1, AVAILABILITY_ZONES[0]);
            let first_cidr = first.cidr.clone();
            push_subnet(model, first);
            let second = synthesize_subnet(model, SubnetVisibility::Private, 2, AVAILABILITY_ZONES[1]);
            let second_cidr = second.cidr.clone();
            push_subnet(model, second);
            report.correct(format!(
                "Created private subnets in 2 AZs ({first_cidr}, {second_cidr}) - required for databases and app servers"
            ));
        }
        1 => {
            warn!("Only one private subnet, adding second for multi-AZ");
            let existing_az = model
                .private_subnets()
                .first()
                .map(|s| s.availability_zone.clone())
                .unwrap_or_default();
            let az = [AVAILABILITY_ZONES[1], AVAILABILITY_ZONES[0], AVAILABILITY_ZONES[2]]
                .into_iter()
                .find(|az| *az != existing_az)
                .unwrap_or(AVAILABILITY_ZONES[1]);
            let subnet = synthesize_subnet(model, SubnetVisibility::Private, 2, az);
            let cidr = subnet.cidr.clone();
            push_subnet(model, subnet);
            report.correct(format!(
                "Added second private subnet ({cidr}) in different AZ - required for RDS high availability"
            ));
        }
        _ => {}
    }
}

fn push_subnet(model: &mut InfrastructureModel, subnet: Subnet) {
    if let Some(network) = model.primary_network_mut() {
        network.add_subnet(subnet);
    }
}

/// Build `subnet-<visibility>-<n>` with the lowest free `n ≥ start` and a
/// /24 that does not overlap any existing subnet of the primary network
fn synthesize_subnet(
    model: &InfrastructureModel,
    visibility: SubnetVisibility,
    start: usize,
    availability_zone: &str,
) -> Subnet {
    let n = (start..)
        .find(|n| !model.contains_id(&format!("subnet-{visibility}-{n}")))
        .unwrap_or(start);
    let preferred_octet = match visibility {
        SubnetVisibility::Public => n,
        SubnetVisibility::Private => n + 1,
    };
    Subnet::new(
        format!("subnet-{visibility}-{n}"),
        format!("{visibility}-subnet-{n}"),
        free_subnet_cidr(model, preferred_octet),
        visibility,
        availability_zone,
    )
}

/// First two octets for synthesized /24s: taken from the network block when
/// it is a /16 or wider, `10.0` otherwise
fn network_prefix(model: &InfrastructureModel) -> (u8, u8) {
    model
        .primary_network()
        .and_then(|n| CidrBlock::new(&n.cidr).ok())
        .filter(|block| block.prefix_length() <= 16)
        .map(|block| {
            let octets = block.network().octets();
            (octets[0], octets[1])
        })
        .unwrap_or((10, 0))
}

fn free_subnet_cidr(model: &InfrastructureModel, preferred_octet: usize) -> String {
    let (a, b) = network_prefix(model);
    let taken: Vec<CidrBlock> = model
        .primary_network()
        .map(|n| {
            n.subnets
                .iter()
                .filter_map(|s| CidrBlock::new(&s.cidr).ok())
                .collect()
        })
        .unwrap_or_default();
    let is_free = |c: u8| {
        let candidate = CidrBlock::slash24(a, b, c);
        !taken.iter().any(|t| t.overlaps(&candidate))
    };

    let preferred = u8::try_from(preferred_octet).unwrap_or(u8::MAX);
    std::iter::once(preferred)
        .chain(1..=u8::MAX)
        .find(|c| is_free(*c))
        .map(|c| CidrBlock::slash24(a, b, c).as_cidr())
        .unwrap_or_else(|| CidrBlock::slash24(a, b, preferred).as_cidr())
}

// ============================================================================
// Pass 3
// ============================================================================

pub(super) fn enforce_resource_placement(model: &mut InfrastructureModel, report: &mut ValidationReport) {
    let Some(layout) = SubnetLayout::of(model) else {
        return;
    };
    let Some(first_public) = layout.public.first().cloned() else {
        return;
    };
    let Some(first_private) = layout.private.first().cloned() else {
        return;
    };

    for lb in &mut model.load_balancers {
        if lb.subnet_ids.is_empty() || lb.subnet_ids.iter().any(|id| layout.is_private(id)) {
            warn!("Moving load balancer {} to public subnet", lb.id);
            lb.subnet_ids = vec![first_public.clone()];
            report.correct(format!(
                "Moved load balancer '{}' to public subnet - load balancers must be internet-facing",
                lb.name
            ));
        }
    }

    for instance in &mut model.compute_instances {
        if layout.is_public(&instance.subnet_id) && !instance.is_bastion() {
            warn!("Moving EC2 {} to private subnet", instance.id);
            instance.subnet_id = first_private.clone();
            report.correct(format!(
                "Moved EC2 instance '{}' to private subnet - best practice for security",
                instance.name
            ));
        }
    }

    for db in &mut model.databases {
        if db.subnet_ids.is_empty() || db.subnet_ids.iter().any(|id| layout.is_public(id)) {
            warn!("Moving database {} to private subnets", db.id);
            db.subnet_ids = layout.private_pair();
            report.correct(format!(
                "Moved RDS database '{}' to private subnets - databases MUST NOT be publicly accessible",
                db.name
            ));
            continue;
        }

        // Dangling ids are pass 4's business.
        if !db.subnet_ids.iter().all(|id| layout.resolves(id)) {
            continue;
        }
        let mut distinct: Vec<String> = Vec::with_capacity(2);
        for id in &db.subnet_ids {
            if !distinct.contains(id) {
                distinct.push(id.clone());
            }
        }
        if distinct.len() >= 2 {
            continue;
        }
        for id in &layout.private {
            if distinct.len() >= 2 {
                break;
            }
            if !distinct.contains(id) {
                distinct.push(id.clone());
            }
        }
        db.subnet_ids = distinct;
        report.correct(format!(
            "Added second private subnet to RDS database '{}' - databases need subnets in two availability zones",
            db.name
        ));
    }

    for nat in &mut model.nat_gateways {
        if layout.is_private(&nat.subnet_id) {
            nat.subnet_id = first_public.clone();
            report.correct(format!(
                "Moved NAT gateway '{}' to public subnet - NAT gateways need a route to the internet gateway",
                nat.name
            ));
        }
    }
}

// ============================================================================
// Pass 4
// ============================================================================

pub(super) fn enforce_network_boundaries(model: &mut InfrastructureModel, report: &mut ValidationReport) {
    let Some(layout) = SubnetLayout::of(model) else {
        return;
    };
    let first_public = layout.public.first().cloned();
    let first_private = layout.private.first().cloned();
    let compute_ids: HashSet<String> = model.compute_instances.iter().map(|c| c.id.clone()).collect();

    for instance in &mut model.compute_instances {
        if layout.resolves(&instance.subnet_id) {
            continue;
        }
        if let Some(target) = first_private.clone().or_else(|| first_public.clone()) {
            warn!("EC2 {} has invalid subnet, assigning to {}", instance.id, target);
            instance.subnet_id = target;
            report.correct(format!(
                "Assigned EC2 instance '{}' to valid subnet - was floating outside network",
                instance.name
            ));
        }
    }

    let pair = layout.private_pair();
    for db in &mut model.databases {
        let floating =
            db.subnet_ids.is_empty() || db.subnet_ids.iter().any(|id| !layout.resolves(id));
        if floating && !pair.is_empty() {
            warn!("RDS {} has invalid subnets, assigning to private subnets", db.id);
            db.subnet_ids = pair.clone();
            report.correct(format!(
                "Assigned RDS database '{}' to valid private subnets - was floating outside network",
                db.name
            ));
        }
    }

    for lb in &mut model.load_balancers {
        let floating =
            lb.subnet_ids.is_empty() || lb.subnet_ids.iter().any(|id| !layout.resolves(id));
        if let (true, Some(public)) = (floating, &first_public) {
            warn!("Load balancer {} has invalid subnets, assigning to public subnet", lb.id);
            lb.subnet_ids = vec![public.clone()];
            report.correct(format!(
                "Assigned load balancer '{}' to valid public subnet - was floating outside network",
                lb.name
            ));
        }

        let dangling: Vec<String> = lb
            .target_instance_ids
            .iter()
            .filter(|id| !compute_ids.contains(*id))
            .cloned()
            .collect();
        if !dangling.is_empty() {
            lb.target_instance_ids.retain(|id| compute_ids.contains(id));
            report.correct(format!(
                "Removed missing target(s) {} from load balancer '{}' - targets must be existing EC2 instances",
                dangling.join(", "),
                lb.name
            ));
        }
    }

    for nat in &mut model.nat_gateways {
        if let (false, Some(public)) = (layout.resolves(&nat.subnet_id), &first_public) {
            nat.subnet_id = public.clone();
            report.correct(format!(
                "Assigned NAT gateway '{}' to valid public subnet - was floating outside network",
                nat.name
            ));
        }
    }

    for sg in &mut model.security_groups {
        if sg.network_id != layout.network_id {
            sg.network_id = layout.network_id.clone();
            report.correct(format!(
                "Attached security group '{}' to VPC '{}' - was referencing a missing network",
                sg.name, layout.network_id
            ));
        }
    }

    for flow_log in &mut model.flow_logs {
        if flow_log.network_id != layout.network_id {
            flow_log.network_id = layout.network_id.clone();
            report.correct(format!(
                "Attached flow log '{}' to VPC '{}' - was referencing a missing network",
                flow_log.id, layout.network_id
            ));
        }
    }
}

// ============================================================================
// Pass 5
// ============================================================================

pub(super) fn enforce_nat_and_flow_logs(model: &mut InfrastructureModel, report: &mut ValidationReport) {
    let Some(layout) = SubnetLayout::of(model) else {
        return;
    };

    if !layout.private.is_empty() && model.nat_gateways.is_empty() {
        if let Some(public) = layout.public.first() {
            let id = unique_id(model, format!("nat-{}", layout.network_id));
            model.add_nat_gateway(NatGateway::new(id, AUTO_NAT_NAME, public.clone()));
            report.correct(
                "Created NAT Gateway in public subnet to enable outbound traffic for private subnets",
            );
        }
    }

    if !model.flow_logs.iter().any(|fl| fl.network_id == layout.network_id) {
        let id = unique_id(model, format!("flowlog-{}", layout.network_id));
        model.add_flow_logs(FlowLogs::new(id, layout.network_id.clone()));
        report.correct("Created VPC Flow Log for VPC to capture network traffic");
    }
}

fn unique_id(model: &InfrastructureModel, preferred: String) -> String {
    if model.contains_id(&preferred) {
        model.next_free_id(&preferred, 2)
    } else {
        preferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn network_with(subnets: Vec<Subnet>) -> InfrastructureModel {
        let mut network = Network::new("vpc-a", "a", "10.0.0.0/16");
        for subnet in subnets {
            network.add_subnet(subnet);
        }
        let mut model = InfrastructureModel::new();
        model.add_network(network);
        model
    }

    fn subnet(id: &str, cidr: &str, visibility: SubnetVisibility, az: &str) -> Subnet {
        Subnet::new(id, id, cidr, visibility, az)
    }

    #[test]
    fn test_merge_networks_repoints_dependents() {
        let mut model = network_with(vec![subnet("s1", "10.0.1.0/24", SubnetVisibility::Public, "us-east-1a")]);
        model.add_network(
            Network::new("vpc-b", "b", "10.1.0.0/16")
                .with_subnet(subnet("s1", "10.1.1.0/24", SubnetVisibility::Public, "us-east-1a"))
                .with_subnet(subnet("s2", "10.1.2.0/24", SubnetVisibility::Private, "us-east-1a")),
        );
        model.add_security_group(SecurityGroup::new("sg-1", "web", "vpc-b"));
        let mut report = ValidationReport::new();

        enforce_single_network(&mut model, &mut report);

        assert_eq!(model.networks.len(), 1);
        let ids: Vec<_> = model.networks[0].subnets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
        assert_eq!(model.security_groups[0].network_id, "vpc-a");
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_second_private_subnet_avoids_taken_cidr_and_az() {
        let mut model = network_with(vec![
            subnet("pub", "10.0.1.0/24", SubnetVisibility::Public, "us-east-1a"),
            subnet("priv", "10.0.3.0/24", SubnetVisibility::Private, "us-east-1b"),
        ]);
        let mut report = ValidationReport::new();

        enforce_required_subnets(&mut model, &mut report);

        let private = model.private_subnets();
        assert_eq!(private.len(), 2);
        assert_eq!(private[1].id, "subnet-private-2");
        assert_eq!(private[1].cidr, "10.0.2.0/24");
        assert_eq!(private[1].availability_zone, "us-east-1a");
        assert!(report.corrections[0].starts_with("Added second private subnet (10.0.2.0/24)"));
    }

    #[test]
    fn test_subnets_follow_network_block() {
        let mut model = InfrastructureModel::new();
        model.add_network(Network::new("vpc-a", "a", "172.16.0.0/16"));
        let mut report = ValidationReport::new();

        enforce_required_subnets(&mut model, &mut report);

        assert_eq!(model.public_subnets()[0].cidr, "172.16.1.0/24");
        assert_eq!(model.private_subnets()[1].cidr, "172.16.3.0/24");
    }

    #[test]
    fn test_single_subnet_database_widened() {
        let mut model = network_with(vec![
            subnet("pub", "10.0.1.0/24", SubnetVisibility::Public, "us-east-1a"),
            subnet("p1", "10.0.2.0/24", SubnetVisibility::Private, "us-east-1a"),
            subnet("p2", "10.0.3.0/24", SubnetVisibility::Private, "us-east-1b"),
        ]);
        model.add_database(Database::new("rds-1", "db", DatabaseEngine::Mysql, vec!["p2".into()]));
        let mut report = ValidationReport::new();

        enforce_resource_placement(&mut model, &mut report);

        assert_eq!(model.databases[0].subnet_ids, vec!["p2", "p1"]);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_bastion_stays_public() {
        let mut model = network_with(vec![
            subnet("pub", "10.0.1.0/24", SubnetVisibility::Public, "us-east-1a"),
            subnet("p1", "10.0.2.0/24", SubnetVisibility::Private, "us-east-1a"),
        ]);
        model.add_compute(ComputeInstance::new("c1", "bastion", InstanceSize::T2Micro, "pub"));
        model.add_compute(ComputeInstance::new("c2", "web", InstanceSize::T2Micro, "pub"));
        let mut report = ValidationReport::new();

        enforce_resource_placement(&mut model, &mut report);

        assert_eq!(model.compute("c1").unwrap().subnet_id, "pub");
        assert_eq!(model.compute("c2").unwrap().subnet_id, "p1");
    }

    #[test]
    fn test_dangling_references_repaired() {
        let mut model = network_with(vec![
            subnet("pub", "10.0.1.0/24", SubnetVisibility::Public, "us-east-1a"),
            subnet("p1", "10.0.2.0/24", SubnetVisibility::Private, "us-east-1a"),
            subnet("p2", "10.0.3.0/24", SubnetVisibility::Private, "us-east-1b"),
        ]);
        model.add_compute(ComputeInstance::new("c1", "web", InstanceSize::T2Micro, "ghost"));
        model.add_load_balancer(LoadBalancer::new(
            "lb-1",
            "front",
            vec!["ghost".into()],
            vec!["c1".into(), "c9".into()],
        ));
        model.add_flow_logs(FlowLogs::new("fl", "vpc-gone"));
        let mut report = ValidationReport::new();

        enforce_network_boundaries(&mut model, &mut report);

        assert_eq!(model.compute("c1").unwrap().subnet_id, "p1");
        let lb = model.load_balancer("lb-1").unwrap();
        assert_eq!(lb.subnet_ids, vec!["pub"]);
        assert_eq!(lb.target_instance_ids, vec!["c1"]);
        assert_eq!(model.flow_logs[0].network_id, "vpc-a");
        assert_eq!(report.len(), 4);
    }

    #[test]
    fn test_nat_in_private_subnet_is_moved_not_duplicated() {
        let mut model = network_with(vec![
            subnet("pub", "10.0.1.0/24", SubnetVisibility::Public, "us-east-1a"),
            subnet("p1", "10.0.2.0/24", SubnetVisibility::Private, "us-east-1a"),
        ]);
        model.add_nat_gateway(NatGateway::new("nat-x", "nat", "p1"));
        let mut report = ValidationReport::new();

        enforce_resource_placement(&mut model, &mut report);
        enforce_nat_and_flow_logs(&mut model, &mut report);

        assert_eq!(model.nat_gateways.len(), 1);
        assert_eq!(model.nat_gateways[0].subnet_id, "pub");
    }
}
