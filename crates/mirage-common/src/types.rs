//! Domain primitive types used across the Mirage workspace.
//!
//! These mirror the vocabulary of the container API the runtime stands in
//! for. Most of them are stored and echoed back verbatim.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Arbitrary string metadata attached to a container.
pub type Properties = HashMap<String, String>;

/// Unique identifier for a simulated process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(String);

impl ProcessId {
    /// Creates a process ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random process ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates a handle for a container created without one.
#[must_use]
pub fn generate_handle() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Total resources advertised by a backend. Never enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    /// Total memory in bytes.
    pub memory_in_bytes: u64,
    /// Total disk in bytes.
    pub disk_in_bytes: u64,
    /// Maximum number of containers.
    pub max_containers: u64,
}

/// Network bandwidth limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthLimits {
    /// Sustained rate in bytes per second.
    pub rate_in_bytes_per_second: u64,
    /// Burst rate in bytes per second.
    pub burst_rate_in_bytes_per_second: u64,
}

/// CPU limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuLimits {
    /// Relative CPU weight.
    pub limit_in_shares: u64,
}

/// Disk quota limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskLimits {
    /// Soft inode limit.
    pub inode_soft: u64,
    /// Hard inode limit.
    pub inode_hard: u64,
    /// Soft byte limit.
    pub byte_soft: u64,
    /// Hard byte limit.
    pub byte_hard: u64,
}

/// Memory limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLimits {
    /// Memory limit in bytes.
    pub limit_in_bytes: u64,
}

/// Signal delivered to a process. Every variant force-terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Polite termination request.
    Terminate,
    /// Immediate kill.
    Kill,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminate => write!(f, "terminate"),
            Self::Kill => write!(f, "kill"),
        }
    }
}

/// Intended outcome of a simulated process.
///
/// Missing fields take their zero value, so `{"exit_code": 3}` exits
/// immediately with code 3. A negative duration also exits immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSpec {
    /// How long the process runs before exiting on its own.
    pub duration_in_seconds: i64,
    /// Exit code reported when the process exits on its own.
    pub exit_code: i64,
}

impl RunSpec {
    /// Creates a run spec.
    #[must_use]
    pub const fn new(duration_in_seconds: i64, exit_code: i64) -> Self {
        Self {
            duration_in_seconds,
            exit_code,
        }
    }

    /// Returns the run duration, zero when the declared one is negative.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.duration_in_seconds).unwrap_or(0))
    }
}

/// Request to run a process inside a container.
///
/// `path` carries the JSON-encoded [`RunSpec`]; the remaining fields are
/// accepted for API compatibility and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Run-spec payload.
    pub path: String,
    /// Command arguments.
    pub args: Vec<String>,
    /// Environment entries in `KEY=value` form.
    pub env: Vec<String>,
    /// Working directory.
    pub dir: Option<String>,
    /// User to run as.
    pub user: String,
}

impl ProcessSpec {
    /// Creates a process spec carrying the given run-spec payload.
    #[must_use]
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            path: payload.into(),
            ..Self::default()
        }
    }
}

/// Request to create a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Caller-chosen unique handle. Empty means "generate one".
    pub handle: String,
    /// Idle-destruction timeout requested for this container.
    pub grace_time: Option<Duration>,
    /// Root filesystem location.
    pub rootfs_path: String,
    /// Initial properties.
    pub properties: Properties,
    /// Environment entries in `KEY=value` form.
    pub env: Vec<String>,
    /// Whether the container is privileged.
    pub privileged: bool,
}

impl ContainerSpec {
    /// Creates a spec with the given handle and defaults elsewhere.
    #[must_use]
    pub fn with_handle(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            ..Self::default()
        }
    }
}

/// Terminal window dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Column count.
    pub columns: u16,
    /// Row count.
    pub rows: u16,
}

/// TTY settings for a process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtySpec {
    /// Requested window size.
    pub window_size: Option<WindowSize>,
}

/// Transport protocol of a network egress rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    /// Any protocol.
    #[default]
    All,
    /// TCP only.
    Tcp,
    /// UDP only.
    Udp,
    /// ICMP only.
    Icmp,
}

/// Network egress rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetOutRule {
    /// Protocol the rule applies to.
    pub protocol: Protocol,
    /// Destination networks in CIDR form.
    pub networks: Vec<String>,
    /// Destination ports.
    pub ports: Vec<u16>,
}

/// Request to stream a tar archive into a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInSpec {
    /// Destination path inside the container.
    pub path: String,
    /// User owning the written files.
    pub user: String,
}

/// Request to stream a path out of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOutSpec {
    /// Source path inside the container.
    pub path: String,
    /// User reading the files.
    pub user: String,
}
