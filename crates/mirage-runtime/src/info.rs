//! Container info reports.

use mirage_common::error::Result;
use mirage_common::types::Properties;
use serde::{Deserialize, Serialize};

/// Snapshot describing a container.
///
/// Only the property and process fields reflect simulated state; the rest
/// are fixed placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Lifecycle state string.
    pub state: String,
    /// Events recorded against the container.
    pub events: Vec<String>,
    /// Host-side IP address.
    pub host_ip: String,
    /// Container-side IP address.
    pub container_ip: String,
    /// Externally reachable IP address.
    pub external_ip: String,
    /// Path of the container's root directory.
    pub container_path: String,
    /// Identifiers of every process started in the container.
    pub process_ids: Vec<String>,
    /// Current properties.
    pub properties: Properties,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Per-handle result of a bulk info query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfoEntry {
    /// The info snapshot, or a default value when `error` is set.
    pub info: ContainerInfo,
    /// Failure message for this handle alone.
    pub error: Option<String>,
}

impl From<Result<ContainerInfo>> for ContainerInfoEntry {
    fn from(result: Result<ContainerInfo>) -> Self {
        match result {
            Ok(info) => Self { info, error: None },
            Err(e) => Self {
                info: ContainerInfo::default(),
                error: Some(e.to_string()),
            },
        }
    }
}
