// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Integration Tests
//!
//! Drives the full request cycle against the in-memory repository:
//! generate, edit through both surfaces, optimistic concurrency, snapshot.

use cim_infrastructure_compiler::model::{EditSource, InstanceSize, ModelVersion};
use cim_infrastructure_compiler::repository::{DocumentId, InMemoryModelRepository, ModelRepository};
use cim_infrastructure_compiler::service::{GenerateResponse, InfrastructureService, ServiceError};
use cim_infrastructure_compiler::validator::is_valid;
use cim_infrastructure_compiler::EditOperation;
use pretty_assertions::assert_eq;
use serde_json::json;

const DESCRIPTION: &str =
    "A web application with a load balancer, EC2 servers and a postgres database";
const COMPUTE: &str = "ec2-web-1";
const DATABASE: &str = "rds-main";

fn service() -> InfrastructureService<InMemoryModelRepository> {
    InfrastructureService::new(InMemoryModelRepository::new())
}

async fn generated(service: &InfrastructureService<InMemoryModelRepository>) -> GenerateResponse {
    service.generate(DESCRIPTION).await.expect("generation succeeds")
}

fn resize(size: &str) -> EditOperation {
    EditOperation::Update {
        resource_id: COMPUTE.into(),
        property_name: "instance_type".into(),
        value: json!(size),
    }
}

#[tokio::test]
async fn test_generate_returns_valid_model_and_all_artifacts() {
    let service = service();
    let response = generated(&service).await;

    assert!(is_valid(&response.model));
    assert_eq!(response.model_id, ModelVersion::initial());
    assert!(!response.corrections.is_empty());
    assert!(response.artifacts.mermaid_diagram.starts_with("graph TB"));
    assert!(response.artifacts.terraform.contains("resource \"aws_instance\""));
    assert!(response.artifacts.terraform.contains("# infra_id: ec2-web-1"));
    assert!(response.artifacts.description.starts_with("VPC 'main-vpc'"));
    assert!(response
        .artifacts
        .decisions
        .decision("private-subnet-ec2")
        .is_some());

    let ids = service.repository().list().await.unwrap();
    assert_eq!(ids, vec![response.document_id]);
}

#[tokio::test]
async fn test_edit_advances_version_and_stale_edit_conflicts() {
    let service = service();
    let document = generated(&service).await;
    let v1 = document.model_id;

    let edited = service
        .edit(document.document_id, v1, &resize("t3.large"), EditSource::Diagram)
        .await
        .unwrap();
    assert_eq!(Some(edited.model_id), v1.next());
    assert_eq!(edited.operations_applied, 1);
    assert_eq!(edited.message, "Applied update_resource_property successfully");
    assert!(edited.artifacts.terraform.contains("instance_type = \"t3.large\""));

    let stale = service
        .edit(document.document_id, v1, &resize("t3.small"), EditSource::Diagram)
        .await
        .unwrap_err();
    assert!(matches!(
        stale,
        ServiceError::ConcurrencyConflict { expected, actual } if expected == v1 && Some(actual) == v1.next()
    ));
    assert_eq!(stale.code(), "conflict");

    let snapshot = service.snapshot(document.document_id).await.unwrap();
    assert_eq!(Some(snapshot.model_id), v1.next());
    assert_eq!(
        snapshot.model.compute(COMPUTE).unwrap().instance_type,
        InstanceSize::T3Large
    );
}

#[tokio::test]
async fn test_rejected_edit_leaves_document_untouched() {
    let service = service();
    let document = generated(&service).await;

    let error = service
        .edit(
            document.document_id,
            document.model_id,
            &EditOperation::Move {
                resource_id: DATABASE.into(),
                target_subnet_id: "subnet-public-1".into(),
            },
            EditSource::Diagram,
        )
        .await
        .unwrap_err();

    assert_eq!(error.code(), "policy_violation");
    match error {
        ServiceError::Rejected(rejection) => assert!(!rejection.warnings.is_empty()),
        other => panic!("expected a rejection, got {other:?}"),
    }
    let stored = service
        .repository()
        .get(document.document_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, document.model);
}

#[tokio::test]
async fn test_terraform_edit_round_trip() {
    let service = service();
    let document = generated(&service).await;
    let original = document.artifacts.terraform.clone();
    let modified = original.replace("instance_type = \"t2.micro\"", "instance_type = \"t3.medium\"");

    let response = service
        .edit_via_terraform(document.document_id, document.model_id, &original, &modified)
        .await
        .unwrap();

    assert_eq!(response.operations_applied, 1);
    assert_eq!(response.message, "Applied 1 operation(s)");
    assert_eq!(Some(response.model_id), document.model_id.next());
    assert_eq!(response.model.last_edit_source, EditSource::Iac);
    assert_eq!(
        response.model.compute(COMPUTE).unwrap().instance_type,
        InstanceSize::T3Medium
    );
    assert!(response.artifacts.terraform.contains("instance_type = \"t3.medium\""));

    let unchanged = service
        .edit_via_terraform(
            document.document_id,
            response.model_id,
            &response.artifacts.terraform,
            &response.artifacts.terraform,
        )
        .await
        .unwrap();
    assert_eq!(unchanged.operations_applied, 0);
    assert_eq!(unchanged.message, "No changes detected");
    assert_eq!(unchanged.model_id, response.model_id);
}

#[tokio::test]
async fn test_terraform_batch_is_all_or_nothing() {
    let service = service();
    let document = generated(&service).await;
    let original = document.artifacts.terraform.clone();
    let modified = original
        .replace("instance_type = \"t2.micro\"", "instance_type = \"t3.medium\"")
        .replace(
            "subnet_id     = aws_subnet.subnet_private_1.id",
            "subnet_id     = aws_subnet.nowhere.id",
        );

    let error = service
        .edit_via_terraform(document.document_id, document.model_id, &original, &modified)
        .await
        .unwrap_err();
    assert_eq!(error.code(), "not_found");

    let snapshot = service.snapshot(document.document_id).await.unwrap();
    assert_eq!(snapshot.model_id, document.model_id);
    assert_eq!(
        snapshot.model.compute(COMPUTE).unwrap().instance_type,
        InstanceSize::T2Micro
    );
}

#[tokio::test]
async fn test_unknown_document() {
    let service = service();
    let missing = DocumentId::new();

    let error = service.snapshot(missing).await.unwrap_err();
    assert!(matches!(error, ServiceError::NotFound(id) if id == missing));

    let error = service
        .edit(missing, ModelVersion::initial(), &resize("t3.large"), EditSource::Diagram)
        .await
        .unwrap_err();
    assert_eq!(error.code(), "not_found");
}

#[test]
fn test_validate_text_reports_without_correcting() {
    let response = service().validate_text("a public ec2 server");

    assert!(response.warnings_count >= 1);
    assert_eq!(response.warnings_count, response.security_warnings.len());
    assert_eq!(
        response.model.compute(COMPUTE).unwrap().subnet_id,
        "subnet-public-1"
    );
}
