// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edit Engine
//!
//! Security-gated mutation of an infrastructure model. Both edit surfaces
//! (diagram and Terraform) go through the same four operations:
//!
//! ```text
//! &model ──clone──> draft ──mutate──> security::scan ──gate──> stamp ──> EditOutcome
//!                                                       │
//!                                                       └──HIGH──> EditRejection
//! ```
//!
//! # Copy-on-write
//!
//! Every operation takes `&InfrastructureModel` and works on its own clone.
//! A rejected edit drops the clone; the caller's value is never touched.
//!
//! # Gating
//!
//! `add_resource` and `move_resource` reject when the resulting model carries
//! any HIGH warning. `remove_resource` and `update_resource_property` rescan
//! for information only: neither can place a resource anywhere new.

mod operations;
mod properties;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::model::{EditSource, InfrastructureModel};
use crate::security::SecurityWarning;

pub use operations::{add_resource, move_resource, remove_resource, update_resource_property};

/// Why an edit was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// Referenced id (resource, subnet, network) does not exist
    #[error("{what} {id} not found")]
    NotFound { what: String, id: String },

    /// Unknown kind, non-whitelisted property or malformed field
    #[error("{0}")]
    InvalidOperation(String),

    /// The edited model would carry a HIGH severity warning
    #[error("Security violation: {0}")]
    PolicyViolation(String),

    /// Unexpected internal state
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EditError {
    pub fn not_found(what: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            id: id.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Stable machine-readable category
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::PolicyViolation(_) => "policy_violation",
            Self::Internal(_) => "internal",
        }
    }
}

/// A successful edit: the new model version and every current warning
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub model: InfrastructureModel,
    pub warnings: Vec<SecurityWarning>,
}

/// A refused edit; `warnings` explains policy rejections
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct EditRejection {
    pub error: EditError,
    pub warnings: Vec<SecurityWarning>,
}

impl From<EditError> for EditRejection {
    fn from(error: EditError) -> Self {
        Self {
            error,
            warnings: Vec::new(),
        }
    }
}

pub type EditResult = Result<EditOutcome, EditRejection>;

/// One edit request, as submitted by either edit surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum EditOperation {
    #[serde(rename = "add_resource", alias = "add")]
    Add {
        resource_type: String,
        #[serde(default)]
        properties: Map<String, Value>,
    },
    #[serde(rename = "remove_resource", alias = "remove")]
    Remove { resource_id: String },
    #[serde(rename = "move_resource", alias = "move")]
    Move {
        resource_id: String,
        target_subnet_id: String,
    },
    #[serde(rename = "update_resource_property", alias = "update")]
    Update {
        resource_id: String,
        #[serde(alias = "property")]
        property_name: String,
        value: Value,
    },
}

impl EditOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add_resource",
            Self::Remove { .. } => "remove_resource",
            Self::Move { .. } => "move_resource",
            Self::Update { .. } => "update_resource_property",
        }
    }

    /// Run this operation against `model`
    pub fn apply(&self, model: &InfrastructureModel, source: EditSource) -> EditResult {
        debug!("Applying {} from {}", self.name(), source);
        match self {
            Self::Add {
                resource_type,
                properties,
            } => add_resource(model, resource_type, properties, source),
            Self::Remove { resource_id } => remove_resource(model, resource_id, source),
            Self::Move {
                resource_id,
                target_subnet_id,
            } => move_resource(model, resource_id, target_subnet_id, source),
            Self::Update {
                resource_id,
                property_name,
                value,
            } => update_resource_property(model, resource_id, property_name, value, source),
        }
    }
}

/// Apply operations in order, each on the previous result
///
/// Stops at the first rejection. On success the outcome carries the final
/// model and the warnings of the final scan.
pub fn apply_all(
    model: &InfrastructureModel,
    operations: &[EditOperation],
    source: EditSource,
) -> EditResult {
    let mut outcome = EditOutcome {
        model: model.clone(),
        warnings: crate::security::scan(model),
    };
    for operation in operations {
        outcome = operation.apply(&outcome.model, source)?;
    }
    Ok(outcome)
}
