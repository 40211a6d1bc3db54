// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer
//!
//! Orchestrates the pure core around a repository. Each method is one
//! transaction:
//!
//! ```text
//! generate:  text ──parse──> raw ──validate_and_fix──> model ──save──> artifacts
//! edit:      get(doc) ──version check──> EditOperation::apply ──save(expected)──> artifacts
//! terraform: get(doc) ──version check──> parse_terraform_edits ──apply_all──> save ──> artifacts
//! ```
//!
//! Every successful edit regenerates *both* the diagram and the Terraform,
//! whichever surface the edit came from.
//!
//! # Example
//!
//! ```rust
//! use cim_infrastructure_compiler::repository::InMemoryModelRepository;
//! use cim_infrastructure_compiler::service::InfrastructureService;
//!
//! # tokio_test::block_on(async {
//! let service = InfrastructureService::new(InMemoryModelRepository::new());
//! let generated = service.generate("web servers behind a load balancer").await.unwrap();
//! assert!(generated.artifacts.terraform.contains("aws_lb"));
//! # });
//! ```

pub mod infrastructure;

pub use infrastructure::{
    Artifacts, EditResponse, GenerateResponse, InfrastructureService, Snapshot,
    ValidationResponse,
};

use thiserror::Error;

use crate::edits::EditRejection;
use crate::model::ModelVersion;
use crate::repository::{DocumentId, RepositoryError};

/// Service layer result type
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service layer errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    /// The edit was based on a version that is no longer current
    #[error("Concurrency conflict: expected version {expected}, got {actual}")]
    ConcurrencyConflict {
        expected: ModelVersion,
        actual: ModelVersion,
    },

    /// The edit engine refused the edit
    #[error("Edit rejected: {0}")]
    Rejected(#[from] EditRejection),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            RepositoryError::ConcurrencyConflict { expected, actual } => {
                Self::ConcurrencyConflict { expected, actual }
            }
            other => Self::Repository(other),
        }
    }
}

impl ServiceError {
    /// Stable machine-readable category
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::ConcurrencyConflict { .. } => "conflict",
            Self::Rejected(rejection) => rejection.error.code(),
            Self::Repository(_) => "internal",
        }
    }
}
