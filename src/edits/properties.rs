// Copyright (c) 2025 - Cowboy AI, Inc.
//! Construction of new entities from caller-supplied property maps.
//!
//! Fields the caller provides win; everything else falls back to entity
//! defaults or a generated id. Enum-valued fields are coerced here, once,
//! through their serde representations.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::EditError;
use crate::model::{
    CidrBlock, ComputeInstance, Database, DatabaseEngine, FirewallRule, FlowLogs, InfrastructureModel,
    InstanceSize, LoadBalancer, LogDestination, NatGateway, ObjectStore, ResourceKind,
    SecurityGroup, Subnet, SubnetVisibility, TrafficType,
};
use crate::model::entities::{
    DEFAULT_ALLOCATED_STORAGE, DEFAULT_AMI, DEFAULT_AVAILABILITY_ZONE, DEFAULT_DB_INSTANCE_CLASS,
    DEFAULT_SECURITY_GROUP_DESCRIPTION,
};

fn decode<T: DeserializeOwned>(kind: ResourceKind, properties: &Map<String, Value>) -> Result<T, EditError> {
    serde_json::from_value(Value::Object(properties.clone())).map_err(|e| {
        EditError::invalid(format!("Invalid {} properties: {e}", kind.display_name()))
    })
}

/// Caller id, or the first free `<prefix>-<n>` counting from the collection size
fn id_or_generated(
    model: &InfrastructureModel,
    id: Option<String>,
    kind: ResourceKind,
    existing: usize,
) -> String {
    id.unwrap_or_else(|| model.next_free_id(kind.id_prefix(), existing + 1))
}

fn primary_network_id(model: &InfrastructureModel) -> Result<String, EditError> {
    model
        .primary_network()
        .map(|n| n.id.clone())
        .ok_or_else(|| EditError::not_found("VPC", "(none)"))
}

#[derive(Deserialize)]
struct ComputeProperties {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    instance_type: InstanceSize,
    subnet_id: String,
    ami: Option<String>,
}

pub(super) fn compute(
    model: &InfrastructureModel,
    properties: &Map<String, Value>,
) -> Result<ComputeInstance, EditError> {
    let p: ComputeProperties = decode(ResourceKind::Compute, properties)?;
    let n = model.compute_instances.len();
    Ok(ComputeInstance {
        id: id_or_generated(model, p.id, ResourceKind::Compute, n),
        name: p.name.unwrap_or_else(|| format!("instance-{}", n + 1)),
        instance_type: p.instance_type,
        subnet_id: p.subnet_id,
        ami: p.ami.unwrap_or_else(|| DEFAULT_AMI.to_string()),
    })
}

#[derive(Deserialize)]
struct DatabaseProperties {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    engine: DatabaseEngine,
    instance_class: Option<String>,
    subnet_ids: Vec<String>,
    allocated_storage: Option<u32>,
    storage_encrypted: Option<bool>,
}

pub(super) fn database(
    model: &InfrastructureModel,
    properties: &Map<String, Value>,
) -> Result<Database, EditError> {
    let p: DatabaseProperties = decode(ResourceKind::Database, properties)?;
    if p.subnet_ids.is_empty() {
        return Err(EditError::invalid("RDS database requires at least one subnet"));
    }
    let n = model.databases.len();
    Ok(Database {
        id: id_or_generated(model, p.id, ResourceKind::Database, n),
        name: p.name.unwrap_or_else(|| format!("database-{}", n + 1)),
        engine: p.engine,
        instance_class: p
            .instance_class
            .unwrap_or_else(|| DEFAULT_DB_INSTANCE_CLASS.to_string()),
        subnet_ids: p.subnet_ids,
        allocated_storage: p.allocated_storage.unwrap_or(DEFAULT_ALLOCATED_STORAGE),
        storage_encrypted: p.storage_encrypted.unwrap_or(true),
    })
}

#[derive(Deserialize)]
struct LoadBalancerProperties {
    id: Option<String>,
    name: Option<String>,
    subnet_ids: Vec<String>,
    #[serde(default)]
    target_instance_ids: Vec<String>,
}

pub(super) fn load_balancer(
    model: &InfrastructureModel,
    properties: &Map<String, Value>,
) -> Result<LoadBalancer, EditError> {
    let p: LoadBalancerProperties = decode(ResourceKind::LoadBalancer, properties)?;
    if p.subnet_ids.is_empty() {
        return Err(EditError::invalid("Load balancer requires at least one subnet"));
    }
    let n = model.load_balancers.len();
    let id = id_or_generated(model, p.id, ResourceKind::LoadBalancer, n);
    Ok(LoadBalancer {
        name: p.name.unwrap_or_else(|| id.clone()),
        id,
        subnet_ids: p.subnet_ids,
        target_instance_ids: p.target_instance_ids,
    })
}

#[derive(Deserialize)]
struct ObjectStoreProperties {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    versioning_enabled: bool,
    encryption_enabled: Option<bool>,
}

pub(super) fn object_store(
    model: &InfrastructureModel,
    properties: &Map<String, Value>,
) -> Result<ObjectStore, EditError> {
    let p: ObjectStoreProperties = decode(ResourceKind::ObjectStore, properties)?;
    let n = model.object_stores.len();
    Ok(ObjectStore {
        id: id_or_generated(model, p.id, ResourceKind::ObjectStore, n),
        name: p.name.unwrap_or_else(|| format!("bucket-{}", n + 1)),
        versioning_enabled: p.versioning_enabled,
        encryption_enabled: p.encryption_enabled.unwrap_or(true),
    })
}

#[derive(Deserialize)]
struct SecurityGroupProperties {
    id: Option<String>,
    name: Option<String>,
    #[serde(alias = "vpc_id")]
    network_id: Option<String>,
    description: Option<String>,
    #[serde(default)]
    ingress_rules: Vec<FirewallRule>,
    #[serde(default)]
    egress_rules: Vec<FirewallRule>,
}

pub(super) fn security_group(
    model: &InfrastructureModel,
    properties: &Map<String, Value>,
) -> Result<SecurityGroup, EditError> {
    let p: SecurityGroupProperties = decode(ResourceKind::SecurityGroup, properties)?;
    let n = model.security_groups.len();
    let network_id = match p.network_id {
        Some(id) => id,
        None => primary_network_id(model)?,
    };
    Ok(SecurityGroup {
        id: id_or_generated(model, p.id, ResourceKind::SecurityGroup, n),
        name: p.name.unwrap_or_else(|| format!("security-group-{}", n + 1)),
        network_id,
        description: p
            .description
            .unwrap_or_else(|| DEFAULT_SECURITY_GROUP_DESCRIPTION.to_string()),
        ingress_rules: p.ingress_rules,
        egress_rules: p.egress_rules,
    })
}

#[derive(Deserialize)]
struct SubnetProperties {
    id: Option<String>,
    name: Option<String>,
    cidr: String,
    #[serde(default = "private", alias = "type", alias = "subnet_type")]
    visibility: SubnetVisibility,
    #[serde(alias = "az")]
    availability_zone: Option<String>,
    #[serde(alias = "vpc_id")]
    network_id: Option<String>,
}

fn private() -> SubnetVisibility {
    SubnetVisibility::Private
}

/// A new subnet plus the id of the network it belongs to
pub(super) fn subnet(
    model: &InfrastructureModel,
    properties: &Map<String, Value>,
) -> Result<(String, Subnet), EditError> {
    let p: SubnetProperties = decode(ResourceKind::Subnet, properties)?;
    CidrBlock::new(&p.cidr).map_err(|e| EditError::invalid(e.to_string()))?;
    let network_id = match p.network_id {
        Some(id) => id,
        None => primary_network_id(model)?,
    };
    let n = model.networks.iter().map(|net| net.subnets.len()).sum::<usize>();
    let id = id_or_generated(model, p.id, ResourceKind::Subnet, n);
    let subnet = Subnet {
        name: p.name.unwrap_or_else(|| id.clone()),
        id,
        cidr: p.cidr,
        visibility: p.visibility,
        availability_zone: p
            .availability_zone
            .unwrap_or_else(|| DEFAULT_AVAILABILITY_ZONE.to_string()),
    };
    Ok((network_id, subnet))
}

#[derive(Deserialize)]
struct NatGatewayProperties {
    id: Option<String>,
    name: Option<String>,
    subnet_id: String,
    elastic_ip: Option<String>,
}

pub(super) fn nat_gateway(
    model: &InfrastructureModel,
    properties: &Map<String, Value>,
) -> Result<NatGateway, EditError> {
    let p: NatGatewayProperties = decode(ResourceKind::NatGateway, properties)?;
    let n = model.nat_gateways.len();
    Ok(NatGateway {
        id: id_or_generated(model, p.id, ResourceKind::NatGateway, n),
        name: p.name.unwrap_or_else(|| format!("nat-gateway-{}", n + 1)),
        subnet_id: p.subnet_id,
        elastic_ip: p.elastic_ip,
    })
}

#[derive(Deserialize)]
struct FlowLogsProperties {
    id: Option<String>,
    #[serde(alias = "vpc_id")]
    network_id: Option<String>,
    #[serde(default)]
    log_destination_type: LogDestination,
    #[serde(default)]
    traffic_type: TrafficType,
    log_group_name: Option<String>,
}

pub(super) fn flow_logs(
    model: &InfrastructureModel,
    properties: &Map<String, Value>,
) -> Result<FlowLogs, EditError> {
    let p: FlowLogsProperties = decode(ResourceKind::FlowLogs, properties)?;
    let network_id = match p.network_id {
        Some(id) => id,
        None => primary_network_id(model)?,
    };
    let n = model.flow_logs.len();
    Ok(FlowLogs {
        id: id_or_generated(model, p.id, ResourceKind::FlowLogs, n),
        network_id,
        log_destination_type: p.log_destination_type,
        traffic_type: p.traffic_type,
        log_group_name: p.log_group_name,
    })
}

/// Coerce an update value into a typed field
pub(super) fn value_as<T: DeserializeOwned>(property: &str, value: &Value) -> Result<T, EditError> {
    serde_json::from_value(value.clone())
        .map_err(|e| EditError::invalid(format!("Invalid value for {property}: {e}")))
}

/// Storage size from a number or numeric string
pub(super) fn storage_size(value: &Value) -> Result<u32, EditError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .filter(|gb| *gb > 0)
        .and_then(|gb| u32::try_from(gb).ok())
        .ok_or_else(|| {
            EditError::invalid(format!(
                "Invalid value for allocated_storage: {value} (expected a positive size in GB)"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_compute_defaults_and_generated_id() {
        let model = InfrastructureModel::new();
        let instance = compute(&model, &props(json!({"subnet_id": "s1"}))).unwrap();
        assert_eq!(instance.id, "ec2-1");
        assert_eq!(instance.name, "instance-1");
        assert_eq!(instance.instance_type, InstanceSize::T2Micro);
        assert_eq!(instance.ami, DEFAULT_AMI);
    }

    #[test]
    fn test_compute_rejects_unknown_size() {
        let model = InfrastructureModel::new();
        let err = compute(
            &model,
            &props(json!({"subnet_id": "s1", "instance_type": "m5.huge"})),
        )
        .unwrap_err();
        assert_eq!(err.code(), "invalid_operation");
    }

    #[test]
    fn test_database_requires_subnets() {
        let model = InfrastructureModel::new();
        assert!(database(&model, &props(json!({"name": "db"}))).is_err());
        assert!(database(&model, &props(json!({"subnet_ids": []}))).is_err());
        let db = database(&model, &props(json!({"subnet_ids": ["a", "b"], "engine": "mysql"}))).unwrap();
        assert_eq!(db.engine, DatabaseEngine::Mysql);
        assert!(db.storage_encrypted);
    }

    #[test]
    fn test_subnet_validates_cidr() {
        let mut model = InfrastructureModel::new();
        model.add_network(crate::model::Network::new("vpc-main", "main", "10.0.0.0/16"));
        assert!(subnet(&model, &props(json!({"cidr": "10.0.9.0"}))).is_err());
        let (network_id, s) = subnet(&model, &props(json!({"cidr": "10.0.9.0/24", "type": "public"}))).unwrap();
        assert_eq!(network_id, "vpc-main");
        assert!(s.is_public());
    }

    #[test]
    fn test_storage_size_coercion() {
        assert_eq!(storage_size(&json!(100)).unwrap(), 100);
        assert_eq!(storage_size(&json!("50")).unwrap(), 50);
        assert!(storage_size(&json!(0)).is_err());
        assert!(storage_size(&json!("big")).is_err());
    }
}
