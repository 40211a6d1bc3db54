// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure service implementation

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ServiceError, ServiceResult};
use crate::config::ServiceConfig;
use crate::edits::{apply_all, EditOperation};
use crate::ingest::{parse_terraform_edits, parse_text};
use crate::model::{EditSource, InfrastructureModel, ModelVersion};
use crate::projection::{
    describe, DecisionAnalyzer, DecisionReport, MermaidDiagram, Projection, TerraformRenderer,
};
use crate::repository::{DocumentId, ModelRepository};
use crate::security::{self, SecurityWarning};
use crate::validator::{validate_and_fix, violations};

/// Every projection of one model version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    pub description: String,
    pub mermaid_diagram: String,
    pub terraform: String,
    pub security_warnings: Vec<SecurityWarning>,
    pub security_report: String,
    pub decisions: DecisionReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub document_id: DocumentId,
    pub model_id: ModelVersion,
    pub model: InfrastructureModel,
    /// Corrections the validator applied to the parsed model
    pub corrections: Vec<String>,
    pub artifacts: Artifacts,
}

/// Security findings for the parsed, uncorrected model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub warnings_count: usize,
    pub security_warnings: Vec<SecurityWarning>,
    pub security_report: String,
    pub model: InfrastructureModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditResponse {
    pub document_id: DocumentId,
    pub model_id: ModelVersion,
    pub model: InfrastructureModel,
    pub operations_applied: usize,
    pub message: String,
    pub artifacts: Artifacts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub document_id: DocumentId,
    pub model_id: ModelVersion,
    pub model: InfrastructureModel,
    pub artifacts: Artifacts,
}

/// Generation and edit flows over a [`ModelRepository`]
pub struct InfrastructureService<R> {
    repository: R,
    config: ServiceConfig,
    terraform: TerraformRenderer,
}

impl<R: ModelRepository> InfrastructureService<R> {
    pub fn new(repository: R) -> Self {
        Self::with_config(repository, ServiceConfig::default())
    }

    pub fn with_config(repository: R, config: ServiceConfig) -> Self {
        let terraform = TerraformRenderer::new(config.region.clone());
        Self {
            repository,
            config,
            terraform,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn render(&self, model: &InfrastructureModel, warnings: Vec<SecurityWarning>) -> Artifacts {
        Artifacts {
            description: describe(model),
            mermaid_diagram: MermaidDiagram.project(model),
            terraform: self.terraform.project(model),
            security_report: security::render_report(&warnings),
            security_warnings: warnings,
            decisions: DecisionAnalyzer.project(model),
        }
    }

    /// Load a document and check it is still at `expected_version`
    async fn load(
        &self,
        document_id: DocumentId,
        expected_version: ModelVersion,
    ) -> ServiceResult<InfrastructureModel> {
        let model = self
            .repository
            .get(document_id)
            .await?
            .ok_or(ServiceError::NotFound(document_id))?;
        if model.model_id != expected_version {
            warn!(
                "Stale edit on {}: based on {}, current is {}",
                document_id, expected_version, model.model_id
            );
            return Err(ServiceError::ConcurrencyConflict {
                expected: expected_version,
                actual: model.model_id,
            });
        }
        Ok(model)
    }

    /// Parse, correct, store and render a description
    pub async fn generate(&self, text: &str) -> ServiceResult<GenerateResponse> {
        let raw = parse_text(text);
        let (model, report) = validate_and_fix(raw);
        for violation in violations(&model) {
            warn!("Validated model still violates an invariant: {}", violation);
        }
        let warnings = security::scan(&model);

        let document_id = DocumentId::new();
        self.repository
            .save(document_id, model.clone(), None)
            .await?;
        info!(
            "Generated document {} with {} resources, {} corrections",
            document_id,
            model.resource_count(),
            report.len()
        );

        Ok(GenerateResponse {
            document_id,
            model_id: model.model_id,
            artifacts: self.render(&model, warnings),
            corrections: report.corrections,
            model,
        })
    }

    /// Security findings of the parsed description, before any correction
    pub fn validate_text(&self, text: &str) -> ValidationResponse {
        let model = parse_text(text);
        let warnings = security::scan(&model);
        ValidationResponse {
            warnings_count: warnings.len(),
            security_report: security::render_report(&warnings),
            security_warnings: warnings,
            model,
        }
    }

    /// Apply one edit to the stored document
    pub async fn edit(
        &self,
        document_id: DocumentId,
        expected_version: ModelVersion,
        operation: &EditOperation,
        source: EditSource,
    ) -> ServiceResult<EditResponse> {
        let model = self.load(document_id, expected_version).await?;
        let outcome = operation.apply(&model, source).map_err(|rejection| {
            info!("Rejected {} on {}: {}", operation.name(), document_id, rejection);
            ServiceError::from(rejection)
        })?;

        self.repository
            .save(document_id, outcome.model.clone(), Some(expected_version))
            .await?;
        info!(
            "Applied {} to {} ({} -> {})",
            operation.name(),
            document_id,
            expected_version,
            outcome.model.model_id
        );

        Ok(EditResponse {
            document_id,
            model_id: outcome.model.model_id,
            operations_applied: 1,
            message: format!("Applied {} successfully", operation.name()),
            artifacts: self.render(&outcome.model, outcome.warnings),
            model: outcome.model,
        })
    }

    /// Diff an edited copy of the Terraform projection and apply the result
    ///
    /// All operations apply or none do: the document is saved once, after
    /// the last operation succeeds.
    pub async fn edit_via_terraform(
        &self,
        document_id: DocumentId,
        expected_version: ModelVersion,
        original: &str,
        modified: &str,
    ) -> ServiceResult<EditResponse> {
        let model = self.load(document_id, expected_version).await?;
        let operations = parse_terraform_edits(original, modified);

        if operations.is_empty() {
            debug!("No Terraform changes detected for {}", document_id);
            let warnings = security::scan(&model);
            return Ok(EditResponse {
                document_id,
                model_id: model.model_id,
                operations_applied: 0,
                message: "No changes detected".to_string(),
                artifacts: self.render(&model, warnings),
                model,
            });
        }

        let outcome = apply_all(&model, &operations, EditSource::Iac)?;
        self.repository
            .save(document_id, outcome.model.clone(), Some(expected_version))
            .await?;
        info!(
            "Applied {} Terraform operation(s) to {}",
            operations.len(),
            document_id
        );

        Ok(EditResponse {
            document_id,
            model_id: outcome.model.model_id,
            operations_applied: operations.len(),
            message: format!("Applied {} operation(s)", operations.len()),
            artifacts: self.render(&outcome.model, outcome.warnings),
            model: outcome.model,
        })
    }

    /// Current version of a document with fresh projections
    pub async fn snapshot(&self, document_id: DocumentId) -> ServiceResult<Snapshot> {
        let model = self
            .repository
            .get(document_id)
            .await?
            .ok_or(ServiceError::NotFound(document_id))?;
        let warnings = security::scan(&model);
        Ok(Snapshot {
            document_id,
            model_id: model.model_id,
            artifacts: self.render(&model, warnings),
            model,
        })
    }
}
