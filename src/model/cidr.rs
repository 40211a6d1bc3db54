// Copyright (c) 2025 - Cowboy AI, Inc.
//! CIDR Block Value Object
//!
//! The graph stores CIDR blocks as plain strings (exactly as the caller
//! supplied them) so that malformed input can still be represented and
//! corrected. This value object is used wherever a CIDR has to be *checked*:
//! edit properties, parser extraction, and free-range selection in the
//! validator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// CIDR validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CidrError {
    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("Missing prefix length in CIDR block: {0}")]
    MissingPrefix(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(String),
}

/// IPv4 CIDR block
///
/// Invariants:
/// - Valid dotted-quad address
/// - Prefix length 0-32
///
/// # Examples
///
/// ```rust
/// use cim_infrastructure_compiler::model::CidrBlock;
///
/// let block = CidrBlock::new("10.0.1.17/24").unwrap();
/// assert_eq!(block.network().to_string(), "10.0.1.0");
/// assert_eq!(block.prefix_length(), 24);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CidrBlock {
    address: Ipv4Addr,
    prefix_length: u8,
}

impl CidrBlock {
    /// Parse `a.b.c.d/n`
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, CidrError> {
        let cidr = cidr.as_ref().trim();
        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| CidrError::MissingPrefix(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| CidrError::InvalidAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| CidrError::InvalidPrefixLength(prefix_str.to_string()))?;

        if prefix_length > 32 {
            return Err(CidrError::InvalidPrefixLength(prefix_str.to_string()));
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    /// Build a /24 block `a.b.c.0/24`
    pub fn slash24(a: u8, b: u8, c: u8) -> Self {
        Self {
            address: Ipv4Addr::new(a, b, c, 0),
            prefix_length: 24,
        }
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    fn mask(&self) -> u32 {
        if self.prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix_length))
        }
    }

    /// Network address (host bits cleared)
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) & self.mask())
    }

    /// Whether `addr` falls inside this block
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask() == u32::from(self.network())
    }

    /// Whether the two blocks share any address
    pub fn overlaps(&self, other: &CidrBlock) -> bool {
        self.contains(other.network()) || other.contains(self.network())
    }

    /// Canonical `network/prefix` string
    pub fn as_cidr(&self) -> String {
        format!("{}/{}", self.network(), self.prefix_length)
    }

    /// The `c`-th /24 inside this block; only /16 and wider blocks have them
    pub fn nth_slash24(&self, c: u8) -> Option<CidrBlock> {
        if self.prefix_length > 16 {
            return None;
        }
        let octets = self.network().octets();
        Some(Self::slash24(octets[0], octets[1], c))
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

impl FromStr for CidrBlock {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
