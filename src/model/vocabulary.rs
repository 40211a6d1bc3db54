// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model Vocabulary
//!
//! Closed enumerations used by the infrastructure graph. Every value has one
//! canonical string form; parsing from strings happens at ingestion
//! boundaries only (parser output, edit properties, storage reads), never
//! inside core logic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A string did not name any value of the expected vocabulary
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {vocabulary} value: {value}")]
pub struct ParseVocabularyError {
    pub vocabulary: &'static str,
    pub value: String,
}

impl ParseVocabularyError {
    fn new(vocabulary: &'static str, value: &str) -> Self {
        Self {
            vocabulary,
            value: value.to_string(),
        }
    }
}

macro_rules! string_vocabulary {
    ($ty:ident, $label:literal, { $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            /// Canonical string representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// All values in declaration order
            pub fn all() -> &'static [$ty] {
                &[$(Self::$variant,)+]
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseVocabularyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text $(| $alias)* => Ok(Self::$variant),)+
                    other => Err(ParseVocabularyError::new($label, other)),
                }
            }
        }
    };
}

/// Subnet visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetVisibility {
    Public,
    Private,
}

string_vocabulary!(SubnetVisibility, "subnet visibility", {
    Public => "public",
    Private => "private",
});

/// Compute size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InstanceSize {
    #[default]
    #[serde(rename = "t2.micro")]
    T2Micro,
    #[serde(rename = "t2.small")]
    T2Small,
    #[serde(rename = "t2.medium")]
    T2Medium,
    #[serde(rename = "t3.micro")]
    T3Micro,
    #[serde(rename = "t3.small")]
    T3Small,
    #[serde(rename = "t3.medium")]
    T3Medium,
    #[serde(rename = "t3.large")]
    T3Large,
}

string_vocabulary!(InstanceSize, "instance size", {
    T2Micro => "t2.micro",
    T2Small => "t2.small",
    T2Medium => "t2.medium",
    T3Micro => "t3.micro",
    T3Small => "t3.small",
    T3Medium => "t3.medium",
    T3Large => "t3.large",
});

/// Managed database engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    #[default]
    Postgres,
    Mysql,
    Mariadb,
}

string_vocabulary!(DatabaseEngine, "database engine", {
    Postgres => "postgres" | "postgresql",
    Mysql => "mysql",
    Mariadb => "mariadb",
});

/// Which surface produced the latest model change
///
/// Recorded on every successful edit so that a change parsed out of one
/// surface is not synthesized back into the other within the same turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditSource {
    #[default]
    Initial,
    Text,
    Diagram,
    #[serde(alias = "terraform")]
    Iac,
}

string_vocabulary!(EditSource, "edit source", {
    Initial => "initial",
    Text => "text",
    Diagram => "diagram",
    Iac => "iac" | "terraform",
});

/// Flow log delivery target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LogDestination {
    #[default]
    #[serde(rename = "cloud-watch-logs")]
    CloudWatchLogs,
    #[serde(rename = "s3")]
    S3,
}

string_vocabulary!(LogDestination, "log destination", {
    CloudWatchLogs => "cloud-watch-logs" | "cloudwatch",
    S3 => "s3",
});

/// Flow log traffic filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrafficType {
    #[default]
    All,
    Accept,
    Reject,
}

impl TrafficType {
    /// Canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
        }
    }
}

impl fmt::Display for TrafficType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrafficType {
    type Err = ParseVocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "ACCEPT" => Ok(Self::Accept),
            "REJECT" => Ok(Self::Reject),
            _ => Err(ParseVocabularyError::new("traffic type", s)),
        }
    }
}

/// Monotonic model version, rendered as `model-v<N>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelVersion(u64);

impl ModelVersion {
    const PREFIX: &'static str = "model-v";

    /// First version of a freshly created model
    pub fn initial() -> Self {
        Self(1)
    }

    pub fn number(&self) -> u64 {
        self.0
    }

    /// The version following this one, `None` once the counter is spent
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

/// A model whose version counter has no successor
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Model version {0} cannot be incremented")]
pub struct VersionExhausted(pub ModelVersion);

impl Default for ModelVersion {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for ModelVersion {
    type Err = ParseVocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(Self::PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .map(Self)
            .ok_or_else(|| ParseVocabularyError::new("model version", s))
    }
}

impl TryFrom<String> for ModelVersion {
    type Error = ParseVocabularyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelVersion> for String {
    fn from(version: ModelVersion) -> Self {
        version.to_string()
    }
}
