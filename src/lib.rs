// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure model compiler
//!
//! Turns an infrastructure description into one canonical graph (the
//! [`model`]) and derives every artifact from it: a Mermaid diagram,
//! Terraform, a security report and a decision report. The graph is kept
//! valid by a rule-based [`validator`] and changed only through the
//! security-gated [`edits`] engine.
//!
//! ```text
//! text ──ingest──> raw model ──validator──> model ──projection──> diagram / terraform / reports
//!                                             ▲
//!              diagram or terraform edit ──edits (security gate)
//! ```
//!
//! # Example
//!
//! ```rust
//! use cim_infrastructure_compiler::{parse_text, validate_and_fix, security};
//!
//! let (model, report) = validate_and_fix(parse_text("web servers and a database"));
//! assert!(!report.is_clean());
//! assert!(security::scan(&model).iter().all(|w| !w.is_blocking()));
//! ```

pub mod config;
pub mod edits;
pub mod errors;
pub mod ingest;
pub mod model;
pub mod projection;
pub mod repository;
pub mod security;
pub mod service;
pub mod validator;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use edits::{apply_all, EditError, EditOperation, EditOutcome, EditRejection, EditResult};
pub use errors::{InfrastructureError, InfrastructureResult};
pub use ingest::{parse_terraform_edits, parse_text};
pub use model::{EditSource, InfrastructureModel, ModelVersion, ResourceKind};
pub use repository::{DocumentId, InMemoryModelRepository, ModelRepository};
pub use security::{scan, SecurityWarning, Severity};
pub use service::{InfrastructureService, ServiceError};
pub use validator::{validate_and_fix, ValidationReport};
