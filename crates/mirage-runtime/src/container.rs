//! In-memory container: properties, simulated processes, and limit cells.

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use mirage_common::constants::{CONTAINER_STATE_ACTIVE, EXTERNAL_IP};
use mirage_common::error::{MirageError, Result};
use mirage_common::types::{
    BandwidthLimits, ContainerSpec, CpuLimits, DiskLimits, MemoryLimits, NetOutRule, ProcessSpec,
    Properties, StreamInSpec, StreamOutSpec,
};

use crate::info::ContainerInfo;
use crate::lock;
use crate::metrics::ContainerMetrics;
use crate::process::Process;

/// Last-written resource limits. Nothing enforces them.
#[derive(Debug, Clone, Copy, Default)]
struct LimitCells {
    bandwidth: BandwidthLimits,
    cpu: CpuLimits,
    disk: DiskLimits,
    memory: MemoryLimits,
}

/// A container living only in memory.
///
/// Properties, processes and limits each sit behind their own lock, so
/// containers never contend with one another.
#[derive(Debug)]
pub struct Container {
    handle: String,
    spec: ContainerSpec,
    created_at: String,
    properties: RwLock<Properties>,
    processes: RwLock<HashMap<String, Arc<Process>>>,
    limits: Mutex<LimitCells>,
}

impl Container {
    /// Creates a container from `spec`, seeding its properties.
    ///
    /// The caller is responsible for resolving an empty handle first.
    #[must_use]
    pub fn new(spec: ContainerSpec) -> Self {
        Self {
            handle: spec.handle.clone(),
            properties: RwLock::new(spec.properties.clone()),
            spec,
            created_at: chrono::Utc::now().to_rfc3339(),
            processes: RwLock::new(HashMap::new()),
            limits: Mutex::new(LimitCells::default()),
        }
    }

    /// Returns the container handle.
    #[must_use]
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Returns the spec the container was created from.
    #[must_use]
    pub const fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    /// Returns the RFC 3339 creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Starts a simulated process and registers it for later attach.
    ///
    /// Malformed run-spec payloads never fail this call; see
    /// [`Process::spawn`].
    ///
    /// # Errors
    ///
    /// Returns an error if no Tokio runtime is available or the process
    /// table lock is poisoned.
    pub fn run(&self, spec: &ProcessSpec) -> Result<Arc<Process>> {
        tracing::info!(handle = %self.handle, "running process");
        let process = Arc::new(Process::spawn(spec)?);
        let _ = lock::write(&self.processes, "process table")?
            .insert(process.id().to_string(), Arc::clone(&process));
        tracing::info!(handle = %self.handle, id = %process.id(), "process registered");
        Ok(process)
    }

    /// Returns a previously started process.
    ///
    /// # Errors
    ///
    /// Returns [`MirageError::NotFound`] if no process with that id was
    /// started in this container.
    pub fn attach(&self, process_id: &str) -> Result<Arc<Process>> {
        tracing::debug!(handle = %self.handle, id = process_id, "attaching to process");
        lock::read(&self.processes, "process table")?
            .get(process_id)
            .cloned()
            .ok_or_else(|| MirageError::not_found("process", process_id))
    }

    /// Returns the ids of every process started in this container.
    ///
    /// # Errors
    ///
    /// Returns an error if the process table lock is poisoned.
    pub fn process_ids(&self) -> Result<Vec<String>> {
        Ok(lock::read(&self.processes, "process table")?
            .keys()
            .cloned()
            .collect())
    }

    /// Returns a snapshot of all properties.
    ///
    /// # Errors
    ///
    /// Returns an error if the property lock is poisoned.
    pub fn properties(&self) -> Result<Properties> {
        Ok(lock::read(&self.properties, "properties")?.clone())
    }

    /// Returns the value of a single property.
    ///
    /// # Errors
    ///
    /// Returns [`MirageError::NotFound`] if the property is not set.
    pub fn property(&self, name: &str) -> Result<String> {
        lock::read(&self.properties, "properties")?
            .get(name)
            .cloned()
            .ok_or_else(|| MirageError::not_found("property", name))
    }

    /// Sets a property, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the property lock is poisoned.
    pub fn set_property(&self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let _ = lock::write(&self.properties, "properties")?.insert(name.into(), value.into());
        Ok(())
    }

    /// Removes a property. Removing an absent property is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the property lock is poisoned.
    pub fn remove_property(&self, name: &str) -> Result<()> {
        let _ = lock::write(&self.properties, "properties")?.remove(name);
        Ok(())
    }

    /// Returns whether every filter entry is present with an equal value.
    ///
    /// An empty filter matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the property lock is poisoned.
    pub fn matches(&self, filter: &Properties) -> Result<bool> {
        let properties = lock::read(&self.properties, "properties")?;
        Ok(filter
            .iter()
            .all(|(key, want)| properties.get(key).is_some_and(|have| have == want)))
    }

    /// Returns an info snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if a container lock is poisoned.
    pub fn info(&self) -> Result<ContainerInfo> {
        Ok(ContainerInfo {
            state: CONTAINER_STATE_ACTIVE.into(),
            external_ip: EXTERNAL_IP.into(),
            container_path: self.spec.rootfs_path.clone(),
            process_ids: self.process_ids()?,
            properties: self.properties()?,
            created_at: self.created_at.clone(),
            ..ContainerInfo::default()
        })
    }

    /// Returns a metrics snapshot. Every counter is zero.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn metrics(&self) -> ContainerMetrics {
        ContainerMetrics::default()
    }

    /// Stores bandwidth limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the limits lock is poisoned.
    pub fn limit_bandwidth(&self, limits: BandwidthLimits) -> Result<()> {
        lock::lock(&self.limits, "limits")?.bandwidth = limits;
        Ok(())
    }

    /// Returns the last stored bandwidth limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the limits lock is poisoned.
    pub fn current_bandwidth_limits(&self) -> Result<BandwidthLimits> {
        Ok(lock::lock(&self.limits, "limits")?.bandwidth)
    }

    /// Stores CPU limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the limits lock is poisoned.
    pub fn limit_cpu(&self, limits: CpuLimits) -> Result<()> {
        lock::lock(&self.limits, "limits")?.cpu = limits;
        Ok(())
    }

    /// Returns the last stored CPU limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the limits lock is poisoned.
    pub fn current_cpu_limits(&self) -> Result<CpuLimits> {
        Ok(lock::lock(&self.limits, "limits")?.cpu)
    }

    /// Stores disk limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the limits lock is poisoned.
    pub fn limit_disk(&self, limits: DiskLimits) -> Result<()> {
        lock::lock(&self.limits, "limits")?.disk = limits;
        Ok(())
    }

    /// Returns the last stored disk limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the limits lock is poisoned.
    pub fn current_disk_limits(&self) -> Result<DiskLimits> {
        Ok(lock::lock(&self.limits, "limits")?.disk)
    }

    /// Stores memory limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the limits lock is poisoned.
    pub fn limit_memory(&self, limits: MemoryLimits) -> Result<()> {
        lock::lock(&self.limits, "limits")?.memory = limits;
        Ok(())
    }

    /// Returns the last stored memory limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the limits lock is poisoned.
    pub fn current_memory_limits(&self) -> Result<MemoryLimits> {
        Ok(lock::lock(&self.limits, "limits")?.memory)
    }

    /// Stops the container. Simulated processes keep their timers.
    pub fn stop(&self, kill: bool) {
        tracing::info!(handle = %self.handle, kill, "stop requested");
    }

    /// Accepts a per-container grace time.
    pub fn set_grace_time(&self, grace_time: Duration) {
        tracing::debug!(handle = %self.handle, ?grace_time, "ignoring grace time");
    }

    /// Maps a host port to a container port, echoing both back.
    #[must_use]
    pub fn net_in(&self, host_port: u32, container_port: u32) -> (u32, u32) {
        tracing::debug!(handle = %self.handle, host_port, container_port, "net in");
        (host_port, container_port)
    }

    /// Accepts an egress rule.
    pub fn net_out(&self, rule: &NetOutRule) {
        tracing::debug!(handle = %self.handle, ?rule, "net out");
    }

    /// Accepts a stream into the container without reading it.
    pub fn stream_in(&self, spec: &StreamInSpec, _source: &mut dyn Read) {
        tracing::debug!(handle = %self.handle, path = %spec.path, "stream in");
    }

    /// Streams a path out of the container. The stream is always empty.
    #[must_use]
    pub fn stream_out(&self, spec: &StreamOutSpec) -> Box<dyn Read + Send> {
        tracing::debug!(handle = %self.handle, path = %spec.path, "stream out");
        Box::new(std::io::empty())
    }
}
