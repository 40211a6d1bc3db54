// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! This test suite uses proptest to verify the properties that must hold for
//! every input graph: validator idempotence and invariant closure, and the
//! reference integrity and security gate of the edit engine.

mod fixtures;
mod property;
