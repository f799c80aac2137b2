//! Global configuration model for the Mirage backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MirageError, Result};
use crate::types::Capacity;

/// Root configuration for a Mirage backend.
///
/// Every value is advisory: capacity is reported, never enforced, and the
/// grace time is echoed back to the API layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirageConfig {
    /// How the API server listens (`unix`, `tcp`, ...).
    pub listen_network: String,
    /// Address the API server listens on.
    pub listen_address: String,
    /// Total memory capacity in bytes.
    pub memory_in_bytes: u64,
    /// Total disk capacity in bytes.
    pub disk_in_bytes: u64,
    /// Maximum number of containers.
    pub max_containers: u64,
    /// Time after which idle containers would be destroyed.
    pub container_grace_time: Duration,
}

impl MirageConfig {
    /// Returns the advertised capacity.
    #[must_use]
    pub const fn capacity(&self) -> Capacity {
        Capacity {
            memory_in_bytes: self.memory_in_bytes,
            disk_in_bytes: self.disk_in_bytes,
            max_containers: self.max_containers,
        }
    }

    /// Checks the listen settings.
    ///
    /// # Errors
    ///
    /// Returns [`MirageError::Config`] if the listen network is unknown or
    /// the listen address is empty.
    pub fn validate(&self) -> Result<()> {
        if !crate::constants::LISTEN_NETWORKS.contains(&self.listen_network.as_str()) {
            return Err(MirageError::Config {
                message: format!("unsupported listen network: {}", self.listen_network),
            });
        }
        if self.listen_address.trim().is_empty() {
            return Err(MirageError::Config {
                message: "listen address must not be empty".into(),
            });
        }
        Ok(())
    }
}

impl Default for MirageConfig {
    fn default() -> Self {
        Self {
            listen_network: crate::constants::DEFAULT_LISTEN_NETWORK.into(),
            listen_address: crate::constants::DEFAULT_LISTEN_ADDRESS.into(),
            memory_in_bytes: 0,
            disk_in_bytes: 0,
            max_containers: 0,
            container_grace_time: Duration::ZERO,
        }
    }
}
