// Copyright (c) 2025 - Cowboy AI, Inc.
//! Ingestion
//!
//! Turns outside input into raw models or edit operations. Nothing produced
//! here is trusted: text-derived models go through the validator, and
//! Terraform-derived operations go through the edit engine's gate.
//!
//! - [`text`]: natural-language keywords (or a structured intent document)
//!   to an [`InfrastructureModel`](crate::model::InfrastructureModel)
//! - [`terraform`]: a before/after pair of rendered Terraform to
//!   [`EditOperation`](crate::edits::EditOperation)s

pub mod terraform;
pub mod text;

pub use terraform::parse_terraform_edits;
pub use text::{parse_intent, parse_text};
