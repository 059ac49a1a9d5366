//! Linux namespace management for container isolation.
//!
//! Namespaces can only be assigned when a process is created, so the whole
//! set is requested at once through the flags of a single `clone(2)`.

pub mod clone;
pub mod uts;

/// Configuration for which namespaces the child is created in.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceConfig {
    /// Isolate UTS (hostname) namespace.
    pub uts: bool,
    /// Isolate PID namespace.
    pub pid: bool,
    /// Isolate mount namespace.
    pub mount: bool,
    /// Isolate network namespace.
    pub network: bool,
    /// Isolate IPC namespace.
    pub ipc: bool,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self::all()
    }
}

impl NamespaceConfig {
    /// Every namespace the runtime isolates.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            uts: true,
            pid: true,
            mount: true,
            network: true,
            ipc: true,
        }
    }

    /// No isolation; the child shares every namespace with its parent.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            uts: false,
            pid: false,
            mount: false,
            network: false,
            ipc: false,
        }
    }

    /// Short kernel names (as in `/proc/<pid>/ns`) of the enabled namespaces.
    #[must_use]
    pub fn enabled(&self) -> Vec<&'static str> {
        [
            (self.uts, "uts"),
            (self.pid, "pid"),
            (self.mount, "mnt"),
            (self.network, "net"),
            (self.ipc, "ipc"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }

    /// Converts the configuration to `clone(2)` flags.
    #[cfg(target_os = "linux")]
    #[must_use]
    pub fn to_clone_flags(&self) -> nix::sched::CloneFlags {
        use nix::sched::CloneFlags;

        let mut flags = CloneFlags::empty();
        if self.uts {
            flags |= CloneFlags::CLONE_NEWUTS;
        }
        if self.pid {
            flags |= CloneFlags::CLONE_NEWPID;
        }
        if self.mount {
            flags |= CloneFlags::CLONE_NEWNS;
        }
        if self.network {
            flags |= CloneFlags::CLONE_NEWNET;
        }
        if self.ipc {
            flags |= CloneFlags::CLONE_NEWIPC;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_isolates_all_five() {
        let config = NamespaceConfig::default();
        assert_eq!(config.enabled(), ["uts", "pid", "mnt", "net", "ipc"]);
    }

    #[test]
    fn none_enables_nothing() {
        assert!(NamespaceConfig::none().enabled().is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn clone_flags_match_config() {
        use nix::sched::CloneFlags;

        let flags = NamespaceConfig::all().to_clone_flags();
        let expected = CloneFlags::CLONE_NEWUTS
            | CloneFlags::CLONE_NEWPID
            | CloneFlags::CLONE_NEWNS
            | CloneFlags::CLONE_NEWNET
            | CloneFlags::CLONE_NEWIPC;
        assert_eq!(flags, expected);
        assert!(!flags.contains(CloneFlags::CLONE_NEWUSER));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn partial_config_sets_only_requested_flags() {
        use nix::sched::CloneFlags;

        let config = NamespaceConfig {
            pid: true,
            ..NamespaceConfig::none()
        };
        assert_eq!(config.to_clone_flags(), CloneFlags::CLONE_NEWPID);
    }
}
