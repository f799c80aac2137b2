//! # mirage-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the entire Mirage workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and carries the vocabulary of the container API that the
//! runtime simulates.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
