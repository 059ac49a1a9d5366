//! # isobox-common
//!
//! Shared error definitions, configuration models, and constants
//! used across the isobox workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and carries no Linux-specific code.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
