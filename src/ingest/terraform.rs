// Copyright (c) 2025 - Cowboy AI, Inc.
//! Terraform to Edit Operations
//!
//! Diffs two renderings of the Terraform projection, the one the user was
//! shown and the one they sent back, into edit operations. Only blocks that
//! carry an `# infra_id:` marker are tracked; everything else in the file is
//! derived output and is ignored.
//!
//! | Change in the modified text                      | Operation |
//! |--------------------------------------------------|-----------|
//! | block with an `infra_id` deleted                 | remove    |
//! | `aws_instance.instance_type` changed             | update    |
//! | `aws_instance.subnet_id` changed                 | move      |
//! | `aws_db_instance.instance_class` changed         | update    |
//! | `aws_db_instance.allocated_storage` changed      | update    |
//!
//! The scanner is line based. It understands exactly the layout the renderer
//! produces (one attribute per line, quoted strings, `#` comments) and does
//! not try to be a general HCL parser.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::{debug, warn};

use crate::edits::EditOperation;
use crate::projection::terraform::INFRA_ID_MARKER;

/// One `resource "type" "name" { ... }` block
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResourceBlock {
    infra_id: Option<String>,
    resource_type: String,
    name: String,
    /// Top-level `key = value` attributes, strings unquoted
    attributes: BTreeMap<String, String>,
}

impl ResourceBlock {
    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    fn changed<'a>(&self, other: &'a ResourceBlock, key: &str) -> Option<&'a str> {
        let after = other.attribute(key)?;
        (self.attribute(key) != Some(after)).then_some(after)
    }
}

/// `resource "aws_instance" "ec2_web_1" {` to `("aws_instance", "ec2_web_1")`
fn resource_header(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("resource")?;
    let mut quoted = rest.split('"').skip(1).step_by(2);
    let resource_type = quoted.next()?.to_string();
    let name = quoted.next()?.to_string();
    rest.trim_end().ends_with('{').then_some((resource_type, name))
}

/// Net brace depth change of a line, ignoring strings and comments
fn brace_delta(line: &str) -> i32 {
    let mut delta = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '#' => break,
            '/' if chars.peek() == Some(&'/') => break,
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    match value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

/// `  key = value` to `(key, value)`
fn attribute(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let is_identifier = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    is_identifier.then(|| (key.to_string(), unquote(value)))
}

struct OpenBlock {
    block: ResourceBlock,
    depth: i32,
}

fn scan_blocks(source: &str) -> Vec<ResourceBlock> {
    let mut blocks = Vec::new();
    let mut pending_id: Option<String> = None;
    let mut open: Option<OpenBlock> = None;

    for line in source.lines() {
        let trimmed = line.trim();

        if let Some(mut current) = open.take() {
            if current.depth == 1 && !trimmed.starts_with('#') {
                if let Some((key, value)) = attribute(trimmed) {
                    current.block.attributes.entry(key).or_insert(value);
                }
            }
            current.depth += brace_delta(trimmed);
            if current.depth > 0 {
                open = Some(current);
            } else {
                blocks.push(current.block);
            }
            continue;
        }

        if let Some(id) = trimmed.strip_prefix(INFRA_ID_MARKER) {
            pending_id = Some(id.trim().to_string()).filter(|id| !id.is_empty());
        } else if let Some((resource_type, name)) = resource_header(trimmed) {
            let block = ResourceBlock {
                infra_id: pending_id.take(),
                resource_type,
                name,
                attributes: BTreeMap::new(),
            };
            let depth = brace_delta(trimmed);
            if depth > 0 {
                open = Some(OpenBlock { block, depth });
            } else {
                blocks.push(block);
            }
        } else if !trimmed.is_empty() {
            pending_id = None;
        }
    }

    if let Some(current) = open {
        warn!(
            "Unterminated resource block {}.{}",
            current.block.resource_type, current.block.name
        );
        blocks.push(current.block);
    }
    blocks
}

/// Resolve a `subnet_id` value to a model subnet id
fn subnet_target(value: &str, subnets: &HashMap<String, String>) -> String {
    let reference = value
        .strip_prefix("aws_subnet.")
        .and_then(|r| r.strip_suffix(".id"));
    match reference {
        Some(name) => subnets
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string()),
        None => value.to_string(),
    }
}

fn update(resource_id: &str, property: &str, value: Value) -> EditOperation {
    EditOperation::Update {
        resource_id: resource_id.to_string(),
        property_name: property.to_string(),
        value,
    }
}

fn storage_value(raw: &str) -> Value {
    raw.parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Diff two Terraform documents into edit operations, in document order
///
/// # Example
///
/// ```rust
/// use cim_infrastructure_compiler::edits::EditOperation;
/// use cim_infrastructure_compiler::ingest::parse_terraform_edits;
///
/// let original = "# infra_id: ec2-1\nresource \"aws_instance\" \"ec2_1\" {\n  instance_type = \"t2.micro\"\n}\n";
/// let modified = original.replace("t2.micro", "t3.small");
///
/// let ops = parse_terraform_edits(original, &modified);
/// assert_eq!(ops.len(), 1);
/// assert_eq!(ops[0].name(), "update_resource_property");
/// ```
pub fn parse_terraform_edits(original: &str, modified: &str) -> Vec<EditOperation> {
    let before = scan_blocks(original);
    let after = scan_blocks(modified);

    let subnets: HashMap<String, String> = before
        .iter()
        .chain(after.iter())
        .filter(|b| b.resource_type == "aws_subnet")
        .filter_map(|b| b.infra_id.clone().map(|id| (b.name.clone(), id)))
        .collect();

    let mut by_id: HashMap<&str, &ResourceBlock> = HashMap::new();
    for block in &after {
        match block.infra_id.as_deref() {
            Some(id) => {
                by_id.entry(id).or_insert(block);
            }
            None if matches!(
                block.resource_type.as_str(),
                "aws_instance" | "aws_db_instance" | "aws_lb" | "aws_s3_bucket"
            ) && !before
                .iter()
                .any(|b| b.resource_type == block.resource_type && b.name == block.name) =>
            {
                warn!(
                    "Ignoring new block {}.{}: resources are added through the diagram",
                    block.resource_type, block.name
                );
            }
            None => {}
        }
    }

    let mut operations = Vec::new();
    for block in &before {
        let Some(id) = block.infra_id.as_deref() else {
            continue;
        };
        let Some(edited) = by_id.get(id) else {
            operations.push(EditOperation::Remove {
                resource_id: id.to_string(),
            });
            continue;
        };

        match block.resource_type.as_str() {
            "aws_instance" => {
                if let Some(size) = block.changed(edited, "instance_type") {
                    operations.push(update(id, "instance_type", Value::from(size)));
                }
                if let Some(subnet) = block.changed(edited, "subnet_id") {
                    operations.push(EditOperation::Move {
                        resource_id: id.to_string(),
                        target_subnet_id: subnet_target(subnet, &subnets),
                    });
                }
            }
            "aws_db_instance" => {
                if let Some(class) = block.changed(edited, "instance_class") {
                    operations.push(update(id, "instance_class", Value::from(class)));
                }
                if let Some(storage) = block.changed(edited, "allocated_storage") {
                    operations.push(update(id, "allocated_storage", storage_value(storage)));
                }
            }
            _ => {}
        }
    }

    debug!("Parsed {} edit operation(s) from Terraform", operations.len());
    operations
}
