// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure Compiler CLI
//!
//! Compiles a description into the validated model and every projection,
//! printed as one JSON document.
//!
//! Run with: cargo run --bin infra-compiler -- "web app with a postgres database"
//!
//! With no arguments the description is read from stdin. `--validate` only
//! reports the security findings of the parsed, uncorrected model.
//!
//! Environment:
//! - `INFRA_REGION`: Terraform provider region (default `us-east-1`)
//! - `RUST_LOG`: log filter (default `info`); logs go to stderr

use std::io::Read;

use anyhow::{bail, Context, Result};
use cim_infrastructure_compiler::{InMemoryModelRepository, InfrastructureService, ServiceConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn read_description(args: Vec<String>) -> Result<String> {
    let description = if args.is_empty() {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read description from stdin")?;
        buffer
    } else {
        args.join(" ")
    };

    if description.trim().is_empty() {
        bail!("Empty description. Usage: infra-compiler [--validate] <description...>");
    }
    Ok(description)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::from_env().context("Invalid configuration")?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let validate_only = args.first().is_some_and(|a| a == "--validate");
    if validate_only {
        args.remove(0);
    }
    let description = read_description(args)?;

    info!("Compiling description for region {}", config.region);
    let service = InfrastructureService::with_config(InMemoryModelRepository::new(), config);

    let output = if validate_only {
        serde_json::to_string_pretty(&service.validate_text(&description))
    } else {
        let generated = service
            .generate(&description)
            .await
            .context("Failed to generate infrastructure")?;
        serde_json::to_string_pretty(&generated)
    }
    .context("Failed to serialize output")?;

    println!("{output}");
    Ok(())
}
