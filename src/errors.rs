// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types shared by ingestion, configuration and serialization

use thiserror::Error;

use crate::model::CidrError;

/// Errors raised at the crate's outer boundaries
///
/// Structural defects in a model are never errors; the validator repairs
/// them. These variants cover input that cannot be turned into a model at all.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// Structured intent document did not describe a model
    #[error("Invalid intent document: {0}")]
    InvalidIntent(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed CIDR block
    #[error(transparent)]
    Cidr(#[from] CidrError),
}

/// Result type for boundary operations
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

impl From<serde_json::Error> for InfrastructureError {
    fn from(err: serde_json::Error) -> Self {
        InfrastructureError::Serialization(err.to_string())
    }
}
