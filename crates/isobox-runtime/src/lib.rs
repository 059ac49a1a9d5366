//! Isolation bootstrap for the isobox runtime.
//!
//! The same executable runs twice: the [`launcher`] clones a child into new
//! namespaces that re-executes the binary with the `init` sentinel, and the
//! [`bootstrap`] code running in that child prepares its mounts and replaces
//! itself with the target command.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod bootstrap;
pub mod launcher;
