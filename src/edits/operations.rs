// Copyright (c) 2025 - Cowboy AI, Inc.
//! The four edit operations.

use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{properties, EditError, EditOutcome, EditRejection, EditResult};
use crate::model::{EditSource, InfrastructureModel, InstanceSize, ResourceKind};
use crate::security;

/// Rescan, reject on any HIGH warning, otherwise stamp and accept
fn admit(mut draft: InfrastructureModel, source: EditSource) -> EditResult {
    let warnings = security::scan(&draft);
    if let Some(blocking) = security::first_blocking(&warnings) {
        warn!("Edit blocked by {}: {}", blocking.id, blocking.message);
        return Err(EditRejection {
            error: EditError::PolicyViolation(blocking.message.clone()),
            warnings,
        });
    }
    draft
        .stamp(source)
        .map_err(|exhausted| EditRejection {
            error: EditError::Internal(exhausted.to_string()),
            warnings: warnings.clone(),
        })?;
    info!("Edit accepted from {} -> {}", source, draft.model_id);
    Ok(EditOutcome {
        model: draft,
        warnings,
    })
}

/// Rescan for information only, then stamp and accept
fn commit(mut draft: InfrastructureModel, source: EditSource) -> EditResult {
    let warnings = security::scan(&draft);
    draft
        .stamp(source)
        .map_err(|exhausted| EditRejection {
            error: EditError::Internal(exhausted.to_string()),
            warnings: warnings.clone(),
        })?;
    info!("Edit accepted from {} -> {}", source, draft.model_id);
    Ok(EditOutcome {
        model: draft,
        warnings,
    })
}

fn ensure_new_id(model: &InfrastructureModel, id: &str) -> Result<(), EditError> {
    if let Some(kind) = model.locate(id) {
        return Err(EditError::invalid(format!(
            "Resource id {id} is already used by a {}",
            kind.display_name()
        )));
    }
    // Terraform addresses are derived from ids and must stay unique.
    match model.local_name_clash(id) {
        Some(existing) => Err(EditError::invalid(format!(
            "Resource id {id} would share its Terraform name with {existing}"
        ))),
        None => Ok(()),
    }
}

fn ensure_subnet(model: &InfrastructureModel, subnet_id: &str) -> Result<(), EditError> {
    model
        .subnet(subnet_id)
        .map(|_| ())
        .ok_or_else(|| EditError::not_found("Subnet", subnet_id))
}

fn ensure_subnets(model: &InfrastructureModel, subnet_ids: &[String]) -> Result<(), EditError> {
    subnet_ids.iter().try_for_each(|id| ensure_subnet(model, id))
}

fn ensure_targets(model: &InfrastructureModel, targets: &[String]) -> Result<(), EditError> {
    match targets.iter().find(|id| model.compute(id.as_str()).is_none()) {
        Some(missing) => Err(EditError::not_found("Target instance", missing.as_str())),
        None => Ok(()),
    }
}

fn ensure_network(model: &InfrastructureModel, network_id: &str) -> Result<(), EditError> {
    model
        .network(network_id)
        .map(|_| ())
        .ok_or_else(|| EditError::not_found("VPC", network_id))
}

/// Add a new resource of `kind` built from `properties`
///
/// Generated ids follow `<prefix>-<n>`; every reference the new entity
/// introduces must resolve.
pub fn add_resource(
    model: &InfrastructureModel,
    kind: &str,
    properties: &Map<String, Value>,
    source: EditSource,
) -> EditResult {
    let kind: ResourceKind = kind
        .parse()
        .map_err(|_| EditError::invalid(format!("Unknown resource type: {kind}")))?;
    let mut draft = model.clone();

    match kind {
        ResourceKind::Network => {
            return Err(EditError::invalid(
                "A model holds exactly one VPC; add subnets to it instead",
            )
            .into());
        }
        ResourceKind::Subnet => {
            let (network_id, subnet) = properties::subnet(&draft, properties)?;
            ensure_new_id(&draft, &subnet.id)?;
            let network = draft
                .networks
                .iter_mut()
                .find(|n| n.id == network_id)
                .ok_or_else(|| EditError::not_found("VPC", network_id.as_str()))?;
            network.add_subnet(subnet);
        }
        ResourceKind::Compute => {
            let instance = properties::compute(&draft, properties)?;
            ensure_new_id(&draft, &instance.id)?;
            ensure_subnet(&draft, &instance.subnet_id)?;
            draft.add_compute(instance);
        }
        ResourceKind::Database => {
            let database = properties::database(&draft, properties)?;
            ensure_new_id(&draft, &database.id)?;
            ensure_subnets(&draft, &database.subnet_ids)?;
            draft.add_database(database);
        }
        ResourceKind::LoadBalancer => {
            let lb = properties::load_balancer(&draft, properties)?;
            ensure_new_id(&draft, &lb.id)?;
            ensure_subnets(&draft, &lb.subnet_ids)?;
            ensure_targets(&draft, &lb.target_instance_ids)?;
            draft.add_load_balancer(lb);
        }
        ResourceKind::ObjectStore => {
            let bucket = properties::object_store(&draft, properties)?;
            ensure_new_id(&draft, &bucket.id)?;
            draft.add_object_store(bucket);
        }
        ResourceKind::SecurityGroup => {
            let sg = properties::security_group(&draft, properties)?;
            ensure_new_id(&draft, &sg.id)?;
            ensure_network(&draft, &sg.network_id)?;
            draft.add_security_group(sg);
        }
        ResourceKind::NatGateway => {
            let nat = properties::nat_gateway(&draft, properties)?;
            ensure_new_id(&draft, &nat.id)?;
            ensure_subnet(&draft, &nat.subnet_id)?;
            draft.add_nat_gateway(nat);
        }
        ResourceKind::FlowLogs => {
            let flow_logs = properties::flow_logs(&draft, properties)?;
            ensure_new_id(&draft, &flow_logs.id)?;
            ensure_network(&draft, &flow_logs.network_id)?;
            draft.add_flow_logs(flow_logs);
        }
    }

    admit(draft, source)
}

fn take_first<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    match items.iter().position(|item| matches(item)) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}

/// Remove a compute, database, load balancer, bucket or security group
///
/// A removed id disappears from every load balancer target list.
pub fn remove_resource(model: &InfrastructureModel, resource_id: &str, source: EditSource) -> EditResult {
    let mut draft = model.clone();

    let removed = take_first(&mut draft.compute_instances, |c| c.id == resource_id)
        || take_first(&mut draft.databases, |d| d.id == resource_id)
        || take_first(&mut draft.load_balancers, |lb| lb.id == resource_id)
        || take_first(&mut draft.object_stores, |b| b.id == resource_id)
        || take_first(&mut draft.security_groups, |sg| sg.id == resource_id);

    if !removed {
        let error = match model.locate(resource_id) {
            Some(kind) => EditError::invalid(format!(
                "{} {resource_id} is part of the network structure and cannot be removed",
                kind.display_name()
            )),
            None => EditError::not_found("Resource", resource_id),
        };
        return Err(error.into());
    }

    for lb in &mut draft.load_balancers {
        lb.target_instance_ids.retain(|target| target != resource_id);
    }

    commit(draft, source)
}

/// Relocate a compute instance, or prepend a subnet to a database's list
///
/// A database keeps its first prior subnet so the list stays two long.
pub fn move_resource(
    model: &InfrastructureModel,
    resource_id: &str,
    target_subnet_id: &str,
    source: EditSource,
) -> EditResult {
    if model.subnet(target_subnet_id).is_none() {
        return Err(EditError::not_found("Target subnet", target_subnet_id).into());
    }
    let mut draft = model.clone();

    if let Some(instance) = draft.compute_instances.iter_mut().find(|c| c.id == resource_id) {
        instance.subnet_id = target_subnet_id.to_string();
    } else if let Some(db) = draft.databases.iter_mut().find(|d| d.id == resource_id) {
        if !db.subnet_ids.iter().any(|id| id == target_subnet_id) {
            let mut subnet_ids = vec![target_subnet_id.to_string()];
            subnet_ids.extend(db.subnet_ids.first().cloned());
            db.subnet_ids = subnet_ids;
        }
    } else {
        let error = match model.locate(resource_id) {
            Some(kind) => EditError::invalid(format!(
                "{} {resource_id} cannot be moved; only EC2 instances and RDS databases change subnets",
                kind.display_name()
            )),
            None => EditError::not_found("Resource", resource_id),
        };
        return Err(error.into());
    }

    admit(draft, source)
}

fn not_editable(kind: ResourceKind, property: &str) -> EditError {
    EditError::invalid(format!(
        "Property {property} is not editable for {}",
        kind.display_name()
    ))
}

fn missing_after_locate(resource_id: &str) -> EditError {
    EditError::Internal(format!("{resource_id} disappeared from its collection"))
}

/// Set one whitelisted property
///
/// | Kind | Editable |
/// |---|---|
/// | compute | `instance_type` |
/// | database | `instance_class`, `allocated_storage` |
/// | load balancer | `target_instance_ids` |
pub fn update_resource_property(
    model: &InfrastructureModel,
    resource_id: &str,
    property: &str,
    value: &Value,
    source: EditSource,
) -> EditResult {
    let kind = model
        .locate(resource_id)
        .ok_or_else(|| EditError::not_found("Resource", resource_id))?;
    let mut draft = model.clone();

    match (kind, property) {
        (ResourceKind::Compute, "instance_type") => {
            let size: InstanceSize = properties::value_as(property, value)?;
            let instance = draft
                .compute_instances
                .iter_mut()
                .find(|c| c.id == resource_id)
                .ok_or_else(|| missing_after_locate(resource_id))?;
            instance.instance_type = size;
        }
        (ResourceKind::Database, "instance_class") => {
            let class: String = properties::value_as(property, value)?;
            if class.trim().is_empty() {
                return Err(EditError::invalid("instance_class cannot be empty").into());
            }
            let db = draft
                .databases
                .iter_mut()
                .find(|d| d.id == resource_id)
                .ok_or_else(|| missing_after_locate(resource_id))?;
            db.instance_class = class;
        }
        (ResourceKind::Database, "allocated_storage") => {
            let size = properties::storage_size(value)?;
            let db = draft
                .databases
                .iter_mut()
                .find(|d| d.id == resource_id)
                .ok_or_else(|| missing_after_locate(resource_id))?;
            db.allocated_storage = size;
        }
        (ResourceKind::LoadBalancer, "target_instance_ids") => {
            let targets: Vec<String> = properties::value_as(property, value)?;
            ensure_targets(&draft, &targets)?;
            let lb = draft
                .load_balancers
                .iter_mut()
                .find(|lb| lb.id == resource_id)
                .ok_or_else(|| missing_after_locate(resource_id))?;
            lb.target_instance_ids = targets;
        }
        (kind, property) => return Err(not_editable(kind, property).into()),
    }

    commit(draft, source)
}
