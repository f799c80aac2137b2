//! System-wide constants and defaults.

/// Exit code reported by a process that was terminated by a signal.
pub const SIGNALED_EXIT_CODE: i64 = 1;

/// External IP reported by every container.
pub const EXTERNAL_IP: &str = "localhost";

/// State string reported by every live container.
pub const CONTAINER_STATE_ACTIVE: &str = "active";

/// Default network the API server listens on.
pub const DEFAULT_LISTEN_NETWORK: &str = "unix";

/// Default address the API server listens on.
pub const DEFAULT_LISTEN_ADDRESS: &str = "/tmp/garden.sock";

/// Listen networks accepted by the configuration.
pub const LISTEN_NETWORKS: &[&str] = &["unix", "tcp", "tcp4", "tcp6"];

/// Application name used in log output.
pub const APP_NAME: &str = "mirage";

