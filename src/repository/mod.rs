// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model Repository
//!
//! Keyed storage of model lineages. A document id names one lineage; the
//! stored value is always its latest version. Writers state which version
//! they edited, and a write based on anything but the current version is
//! refused, so two concurrent edits of the same document cannot both land.
//!
//! ```text
//! get(doc) ──> model v3 ──edit──> model v4 ──save(doc, v4, expected: v3)──> ok
//!                                                                    └──> ConcurrencyConflict
//!                                                                         (someone saved v4 first)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::model::{InfrastructureModel, ModelVersion};

/// Key of a stored model lineage (UUID v7, so ids sort by creation time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("Document already exists: {0}")]
    AlreadyExists(DocumentId),

    /// The stored version is not the one the writer started from
    #[error("Concurrency conflict: expected version {expected}, got {actual}")]
    ConcurrencyConflict {
        expected: ModelVersion,
        actual: ModelVersion,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage interface for models
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// Latest stored version of a document
    async fn get(&self, id: DocumentId) -> RepositoryResult<Option<InfrastructureModel>>;

    /// Store `model` as the latest version of `id`
    ///
    /// `expected_version` is the version the caller read before editing:
    ///
    /// - `None` creates the document and fails with `AlreadyExists` if it
    ///   is already stored
    /// - `Some(v)` replaces it and fails with `NotFound` if it is missing or
    ///   `ConcurrencyConflict` if the stored version is not `v`
    async fn save(
        &self,
        id: DocumentId,
        model: InfrastructureModel,
        expected_version: Option<ModelVersion>,
    ) -> RepositoryResult<()>;

    /// Remove a document; returns whether it existed
    async fn delete(&self, id: DocumentId) -> RepositoryResult<bool>;

    /// All document ids, oldest first
    async fn list(&self) -> RepositoryResult<Vec<DocumentId>>;
}

/// Process-local repository
#[derive(Debug, Default)]
pub struct InMemoryModelRepository {
    documents: RwLock<HashMap<DocumentId, InfrastructureModel>>,
}

impl InMemoryModelRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModelRepository for InMemoryModelRepository {
    async fn get(&self, id: DocumentId) -> RepositoryResult<Option<InfrastructureModel>> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn save(
        &self,
        id: DocumentId,
        model: InfrastructureModel,
        expected_version: Option<ModelVersion>,
    ) -> RepositoryResult<()> {
        let mut documents = self.documents.write().await;
        match (documents.get(&id), expected_version) {
            (Some(_), None) => return Err(RepositoryError::AlreadyExists(id)),
            (None, Some(_)) => return Err(RepositoryError::NotFound(id)),
            (Some(stored), Some(expected)) if stored.model_id != expected => {
                return Err(RepositoryError::ConcurrencyConflict {
                    expected,
                    actual: stored.model_id,
                });
            }
            _ => {}
        }
        debug!("Saved document {} at {}", id, model.model_id);
        documents.insert(id, model);
        Ok(())
    }

    async fn delete(&self, id: DocumentId) -> RepositoryResult<bool> {
        Ok(self.documents.write().await.remove(&id).is_some())
    }

    async fn list(&self) -> RepositoryResult<Vec<DocumentId>> {
        let mut ids: Vec<DocumentId> = self.documents.read().await.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}
