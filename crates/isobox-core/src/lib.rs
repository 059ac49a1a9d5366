//! # isobox-core
//!
//! Low-level Linux isolation primitives for the isobox runtime.
//!
//! This crate provides safe abstractions over:
//! - **Namespaces**: creating a child in fresh UTS, PID, mount, network,
//!   and IPC namespaces with a single `clone(2)`, and naming it.
//! - **Filesystem**: private mount propagation and a scoped procfs.
//! - **Exec**: resolving the target command and replacing the process image.
//!
//! All unsafe system calls are encapsulated in safe wrappers with
//! proper error handling and `// SAFETY:` documentation.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod exec;
pub mod filesystem;
pub mod namespace;
