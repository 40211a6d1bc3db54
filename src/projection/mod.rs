// Copyright (c) 2025 - Cowboy AI, Inc.
//! Projections
//!
//! Every artifact the compiler emits is a projection of one
//! [`InfrastructureModel`]: a pure function from the model to an output
//! value. Projections never read text, never read each other, and never
//! mutate the model, so regenerating all of them after an edit is always
//! safe.
//!
//! ```text
//!                      ┌──> MermaidDiagram    ──> String
//! InfrastructureModel ─┼──> TerraformRenderer ──> String
//!                      └──> DecisionAnalyzer  ──> DecisionReport
//! ```
//!
//! # Example
//!
//! ```rust
//! use cim_infrastructure_compiler::model::InfrastructureModel;
//! use cim_infrastructure_compiler::projection::{MermaidDiagram, Projection};
//!
//! let diagram = MermaidDiagram.project(&InfrastructureModel::new());
//! assert!(diagram.starts_with("graph TB"));
//! ```

pub mod decisions;
pub mod diagram;
pub mod terraform;

pub use decisions::{Complexity, DecisionAnalyzer, DecisionCard, DecisionReport, RiskLevel};
pub use diagram::{describe, MermaidDiagram};
pub use terraform::{resource_name, TerraformRenderer};

use crate::model::InfrastructureModel;

/// A pure view of the model
pub trait Projection {
    /// Rendered artifact
    type Output;

    /// Render `model`; must not depend on anything but its argument
    fn project(&self, model: &InfrastructureModel) -> Self::Output;
}
