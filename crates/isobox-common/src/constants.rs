//! System-wide constants, fixed paths, and exit statuses.

/// Path the launcher re-executes to run the bootstrapper with the same binary.
pub const SELF_EXE: &str = "/proc/self/exe";

/// First argument that routes a re-invoked process to the bootstrapper.
pub const INIT_SENTINEL: &str = "init";

/// Root of the mount tree whose propagation is made private.
pub const MOUNT_ROOT: &str = "/";

/// Conventional mount point of the process-information filesystem.
pub const PROC_MOUNT_POINT: &str = "/proc";

/// Filesystem type and source name passed to `mount(2)` for procfs.
pub const PROC_FS_TYPE: &str = "proc";

/// Device bound to the child's standard streams in non-interactive mode.
pub const DEV_NULL: &str = "/dev/null";

/// Stack size handed to `clone(2)` for the child before it re-executes.
pub const CHILD_STACK_SIZE: usize = 1024 * 1024;

/// Status the launcher exits with once its child has terminated,
/// whatever the child's own exit status was.
pub const LAUNCHER_EXIT_STATUS: i32 = 255;

/// Bootstrapper status when the target command does not exist.
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// Bootstrapper status when the target command exists but cannot be executed.
pub const EXIT_COMMAND_NOT_EXECUTABLE: i32 = 126;

/// Bootstrapper status when isolation setup (mounts, hostname) failed.
pub const EXIT_SETUP_FAILED: i32 = 125;

/// Generic failure status for everything else.
pub const EXIT_FAILURE: i32 = 1;

