//! Filesystem setup inside the container's mount namespace.
//!
//! Detaches the mount tree from the host's propagation group and mounts
//! a process-information filesystem scoped to the new PID namespace.

pub mod mount;
